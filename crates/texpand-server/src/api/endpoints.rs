//! Handlers behind the HTTP routes. Each mutation goes through the shared
//! engine, so the response is sent only after the store is saved and the
//! active listener set matches the table the editor is about to display.

use std::sync::{Arc, Mutex};

use texpand_core::{
    get_config_dir, is_daemon_running, AbbreviationEntry, Engine, RefreshStats, Result,
    TexpandError,
};

use super::models::{
    ApiResponse, ApiServerInfo, DaemonStatus, IgnoreRequest, RenameRequest, UpsertRequest,
};

pub type SharedEngine = Arc<Mutex<Engine>>;

pub fn list_handler(engine: &SharedEngine) -> ApiResponse<Vec<AbbreviationEntry>> {
    let engine = engine.lock().unwrap();
    ApiResponse::success(engine.table().entries().to_vec())
}

pub fn get_abbreviation_handler(
    engine: &SharedEngine,
    source: &str,
) -> ApiResponse<AbbreviationEntry> {
    let engine = engine.lock().unwrap();
    match engine.table().get(source) {
        Some(entry) => ApiResponse::success(entry.clone()),
        None => ApiResponse::error(TexpandError::NotFound(source.to_string()).to_string()),
    }
}

pub fn upsert_handler(
    engine: &SharedEngine,
    req: UpsertRequest,
) -> ApiResponse<Vec<AbbreviationEntry>> {
    let mut engine = engine.lock().unwrap();
    let result = engine.upsert(&req.source, &req.replacement);
    mutation_reply(&engine, result)
}

pub fn rename_handler(
    engine: &SharedEngine,
    req: RenameRequest,
) -> ApiResponse<Vec<AbbreviationEntry>> {
    let mut engine = engine.lock().unwrap();
    let result = engine.rename(&req.old_source, &req.source, &req.replacement);
    mutation_reply(&engine, result)
}

pub fn delete_handler(engine: &SharedEngine, source: &str) -> ApiResponse<Vec<AbbreviationEntry>> {
    let mut engine = engine.lock().unwrap();
    let result = engine.delete(source);
    mutation_reply(&engine, result)
}

pub fn ignore_handler(
    engine: &SharedEngine,
    req: IgnoreRequest,
) -> ApiResponse<Vec<AbbreviationEntry>> {
    let mut engine = engine.lock().unwrap();
    let result = engine.set_ignored(&req.source, req.ignored);
    mutation_reply(&engine, result)
}

pub fn daemon_details_handler(engine: &SharedEngine, port: u16) -> ApiResponse<DaemonStatus> {
    let pid = is_daemon_running().ok().flatten();
    let hook_alive = engine.lock().unwrap().hooks().is_hook_alive();

    ApiResponse::success(DaemonStatus {
        running: pid.is_some(),
        pid,
        config_path: get_config_dir().to_string_lossy().to_string(),
        hook_alive,
        api_server: ApiServerInfo {
            port,
            url: format!("http://localhost:{}", port),
        },
    })
}

/// Mutations answer with the updated table so the editor can redraw from
/// the response. A `HookUnavailable` refresh failure means the edit was
/// persisted but matching is degraded; the message says so explicitly.
fn mutation_reply(engine: &Engine, result: Result<RefreshStats>) -> ApiResponse<Vec<AbbreviationEntry>> {
    match result {
        Ok(_) => ApiResponse::success(engine.table().entries().to_vec()),
        Err(e @ TexpandError::HookUnavailable(_)) => {
            ApiResponse::error(format!("entry saved, but {}", e))
        }
        Err(e) => ApiResponse::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texpand_core::HookManager;
    use tempfile::tempdir;

    fn shared_engine(dir: &std::path::Path) -> SharedEngine {
        let engine =
            Engine::bootstrap(dir.join("abbreviations.json"), HookManager::default()).unwrap();
        Arc::new(Mutex::new(engine))
    }

    #[test]
    fn upsert_returns_updated_table() {
        let dir = tempdir().unwrap();
        let engine = shared_engine(dir.path());

        let reply = upsert_handler(
            &engine,
            UpsertRequest {
                source: "brb".to_string(),
                replacement: "be right back".to_string(),
            },
        );

        assert!(reply.success);
        let entries = reply.data.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "brb");
    }

    #[test]
    fn invalid_entry_is_an_error_envelope() {
        let dir = tempdir().unwrap();
        let engine = shared_engine(dir.path());

        let reply = upsert_handler(
            &engine,
            UpsertRequest {
                source: "  ".to_string(),
                replacement: "x".to_string(),
            },
        );

        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("invalid entry"));
    }

    #[test]
    fn delete_of_missing_source_reports_not_found() {
        let dir = tempdir().unwrap();
        let engine = shared_engine(dir.path());

        let reply = delete_handler(&engine, "nope");
        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("not found"));
    }
}
