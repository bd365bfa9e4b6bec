//! Data models for API requests and responses.

use serde::{Deserialize, Serialize};

/// Standard API response format
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Daemon status information
#[derive(Serialize, Deserialize)]
pub struct DaemonStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub config_path: String,
    pub hook_alive: bool,
    pub api_server: ApiServerInfo,
}

/// API server information
#[derive(Serialize, Deserialize)]
pub struct ApiServerInfo {
    pub port: u16,
    pub url: String,
}

/// Request model for adding or updating an abbreviation
#[derive(Deserialize)]
pub struct UpsertRequest {
    pub source: String,
    pub replacement: String,
}

/// Request model for renaming an abbreviation. The old source is removed
/// and the new one inserted; an existing entry under the new source is
/// overwritten.
#[derive(Deserialize)]
pub struct RenameRequest {
    pub old_source: String,
    pub source: String,
    pub replacement: String,
}

/// Request model for toggling an abbreviation's ignored flag
#[derive(Deserialize)]
pub struct IgnoreRequest {
    pub source: String,
    pub ignored: bool,
}

/// Request model for retrieving a single abbreviation
#[derive(Deserialize)]
pub struct GetRequest {
    pub source: String,
}

/// Request model for deleting an abbreviation
#[derive(Deserialize)]
pub struct DeleteRequest {
    pub source: String,
}
