pub mod config;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod hook;
pub mod keyboard;
pub mod matcher;
pub mod models;
pub mod storage;

// Re-export common items for convenience
pub use config::{get_config_dir, is_daemon_running, MATCH_TIMEOUT};
pub use engine::Engine;
pub use error::{Result, TexpandError};
pub use expansion::{perform_expansion, plan_expansion, ExpansionPlan};
pub use hook::{HookManager, RefreshStats};
pub use matcher::{BoundaryKey, KeyInput, ListenerSet, MatchEvent};
pub use models::{AbbreviationEntry, AbbreviationTable};
pub use storage::{load_table, save_table};
