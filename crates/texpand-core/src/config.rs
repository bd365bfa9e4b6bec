use crate::error::Result;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DB_FILENAME: &str = "abbreviations.json";
pub const PID_FILENAME: &str = "texpand-daemon.pid";
pub const PORT_FILENAME: &str = "api_port.txt";
pub const DAEMON_LOG_FILENAME: &str = "daemon_log.txt";

/// Maximum elapsed time between the first character of a candidate
/// abbreviation and its terminating boundary. Partial matches older than
/// this are discarded so stale input cannot resurrect on a later keystroke.
pub const MATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Word-boundary characters: whitespace plus ASCII punctuation. A match
/// fires only when the abbreviation is flanked by boundaries on both sides.
pub fn is_boundary_char(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

/// Get the texpand configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".texpand"))
        .unwrap_or_else(|_| PathBuf::from(".texpand"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }
    Ok(config_dir)
}

/// Get the path to the PID file
pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

/// Get the path to the abbreviation store file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Check if the daemon is running, returning its PID if so
pub fn is_daemon_running() -> Result<Option<u32>> {
    let pid_file = get_pid_file_path();

    if pid_file.exists() {
        match fs::read_to_string(&pid_file) {
            Ok(contents) => match contents.trim().parse::<u32>() {
                Ok(pid) => Ok(Some(pid)),
                Err(_) => {
                    // Invalid PID, treat as not running and clean up
                    let _ = fs::remove_file(&pid_file);
                    Ok(None)
                }
            },
            Err(_) => {
                // Can't read file, treat as not running and clean up
                let _ = fs::remove_file(&pid_file);
                Ok(None)
            }
        }
    } else {
        Ok(None)
    }
}
