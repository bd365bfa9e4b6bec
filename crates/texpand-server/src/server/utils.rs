//! Utilities for managing the API server.

use std::fs;
use std::io::Write;

use texpand_core::config::PORT_FILENAME;
use texpand_core::{get_config_dir, Result, TexpandError};

/// Try to get the API server port from stored configuration
pub fn get_api_server_port() -> Result<u16> {
    let port_file_path = get_config_dir().join(PORT_FILENAME);

    if !port_file_path.exists() {
        return Err(TexpandError::Other(
            "API server port information not found".to_string(),
        ));
    }

    let contents = fs::read_to_string(port_file_path)?;
    contents
        .trim()
        .parse::<u16>()
        .map_err(|_| TexpandError::Other("Invalid port stored in configuration".to_string()))
}

/// Check if a port is available by trying to bind to it
pub fn port_is_available(port: u16) -> bool {
    use std::net::TcpListener;
    TcpListener::bind(format!("127.0.0.1:{}", port)).is_ok()
}

/// Save the API port so other processes can find the server
pub fn save_api_port(port: u16) -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let mut file = fs::File::create(config_dir.join(PORT_FILENAME))?;
    write!(file, "{}", port)?;
    Ok(())
}

/// Remove the stored port, e.g. when the daemon shuts down
pub fn remove_api_port() -> Result<()> {
    let port_file_path = get_config_dir().join(PORT_FILENAME);
    if port_file_path.exists() {
        fs::remove_file(port_file_path)?;
    }
    Ok(())
}
