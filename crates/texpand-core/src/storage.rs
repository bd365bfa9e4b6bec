use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::config::{ensure_config_dir, get_db_file_path};
use crate::error::{Result, TexpandError};
use crate::models::{AbbreviationEntry, AbbreviationTable};

/// Load the abbreviation table from the default store. A missing or empty
/// file is an empty table; malformed content is `CorruptStore`, which the
/// daemon recovers from by starting empty and warning.
pub fn load_table() -> Result<AbbreviationTable> {
    load_table_from(&get_db_file_path())
}

/// Save the abbreviation table to the default store, creating the
/// configuration directory if needed. Called after every successful
/// mutation.
pub fn save_table(table: &AbbreviationTable) -> Result<()> {
    ensure_config_dir()?;
    save_table_to(&get_db_file_path(), table)
}

pub fn load_table_from(path: &Path) -> Result<AbbreviationTable> {
    if !path.exists() {
        return Ok(AbbreviationTable::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AbbreviationTable::default());
    }

    parse_store(&content)
}

pub fn save_table_to(path: &Path, table: &AbbreviationTable) -> Result<()> {
    let serialized = serde_json::to_string_pretty(table)?;
    fs::write(path, serialized)?;
    Ok(())
}

/// Current shape: a JSON array of entries. Earlier store versions were an
/// object of `source -> "replacement"` or `source -> {replacement,
/// ignored}`; both are still accepted on load and rewritten in the current
/// shape on the next save.
fn parse_store(content: &str) -> Result<AbbreviationTable> {
    let value: Value = serde_json::from_str(content).map_err(corrupt)?;

    match value {
        Value::Array(_) => {
            let entries: Vec<AbbreviationEntry> =
                serde_json::from_value(value).map_err(corrupt)?;
            AbbreviationTable::from_entries(entries).map_err(corrupt)
        }
        Value::Object(map) => {
            let mut table = AbbreviationTable::default();
            for (source, data) in map {
                let (replacement, ignored) = match data {
                    Value::String(replacement) => (replacement, false),
                    Value::Object(ref fields) => {
                        let replacement = fields
                            .get("replacement")
                            .and_then(Value::as_str)
                            .ok_or_else(|| {
                                TexpandError::CorruptStore(format!(
                                    "entry '{}' has no replacement",
                                    source
                                ))
                            })?
                            .to_string();
                        let ignored = fields
                            .get("ignored")
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                        (replacement, ignored)
                    }
                    _ => {
                        return Err(TexpandError::CorruptStore(format!(
                            "entry '{}' has an unexpected shape",
                            source
                        )))
                    }
                };

                table.upsert(&source, &replacement).map_err(corrupt)?;
                if ignored {
                    table.set_ignored(&source, true).map_err(corrupt)?;
                }
            }
            Ok(table)
        }
        _ => Err(TexpandError::CorruptStore(
            "expected an array or object at the top level".to_string(),
        )),
    }
}

fn corrupt(err: impl std::fmt::Display) -> TexpandError {
    TexpandError::CorruptStore(err.to_string())
}
