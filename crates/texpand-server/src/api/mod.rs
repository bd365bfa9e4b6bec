mod endpoints;
mod models;

pub use endpoints::{
    daemon_details_handler, delete_handler, get_abbreviation_handler, ignore_handler,
    list_handler, rename_handler, upsert_handler, SharedEngine,
};
pub use models::{
    ApiResponse, ApiServerInfo, DaemonStatus, DeleteRequest, GetRequest, IgnoreRequest,
    RenameRequest, UpsertRequest,
};
