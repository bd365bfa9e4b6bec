use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TexpandError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Bad user input to a table operation. Recoverable; surfaced to the editor.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
    /// Stale reference to an abbreviation that is no longer in the table.
    #[error("abbreviation '{0}' not found")]
    NotFound(String),
    /// The OS denied input interception. Previously registered listeners
    /// keep working; the daemon runs in degraded mode until restarted.
    #[error("keyboard hook unavailable: {0}")]
    HookUnavailable(String),
    /// The on-disk store could not be parsed. The engine falls back to an
    /// empty table at startup rather than failing.
    #[error("abbreviation store is corrupt: {0}")]
    CorruptStore(String),
    /// Synthetic input was rejected mid-sequence. Never retried, since
    /// replaying keystroke injection can duplicate visible characters.
    #[error("keystroke injection failed: {0}")]
    InjectionFailed(String),
    #[error("daemon already running with PID {0}")]
    DaemonAlreadyRunning(u32),
    #[error("daemon is not running")]
    DaemonNotRunning,
    #[error("invalid PID in daemon file")]
    InvalidPid,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TexpandError>;
