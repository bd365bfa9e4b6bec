use std::path::PathBuf;

use crate::error::{Result, TexpandError};
use crate::hook::{HookManager, RefreshStats};
use crate::models::AbbreviationTable;
use crate::storage;

/// The exclusive-access unit tying the table, the persistent store and the
/// hook manager together. Every mutation validates, updates the table,
/// saves, then refreshes the listener set, and returns only once the
/// active listeners are consistent with the table, so a caller (the
/// editor) can assume live typing behavior matches what it just displayed.
///
/// Callers share an `Engine` behind a single `Mutex`; the listener set has
/// its own lock inside the hook manager, so keystroke dispatch does not
/// contend with engine-level work.
pub struct Engine {
    table: AbbreviationTable,
    hooks: HookManager,
    store_path: PathBuf,
}

impl Engine {
    /// Load the table from the store and derive the initial listener set.
    /// A corrupt store degrades to an empty table with a warning instead
    /// of refusing to start.
    pub fn bootstrap(store_path: PathBuf, hooks: HookManager) -> Result<Self> {
        let table = match storage::load_table_from(&store_path) {
            Ok(table) => table,
            Err(TexpandError::CorruptStore(msg)) => {
                eprintln!(
                    "Warning: {}; starting with an empty abbreviation table",
                    msg
                );
                AbbreviationTable::default()
            }
            Err(e) => return Err(e),
        };

        let engine = Self {
            table,
            hooks,
            store_path,
        };
        engine.hooks.refresh(&engine.table)?;
        Ok(engine)
    }

    pub fn table(&self) -> &AbbreviationTable {
        &self.table
    }

    pub fn hooks(&self) -> &HookManager {
        &self.hooks
    }

    pub fn upsert(&mut self, source: &str, replacement: &str) -> Result<RefreshStats> {
        let snapshot = self.table.clone();
        self.table.upsert(source, replacement)?;
        self.commit(snapshot)
    }

    pub fn delete(&mut self, source: &str) -> Result<RefreshStats> {
        let snapshot = self.table.clone();
        self.table.delete(source)?;
        self.commit(snapshot)
    }

    pub fn set_ignored(&mut self, source: &str, ignored: bool) -> Result<RefreshStats> {
        let snapshot = self.table.clone();
        self.table.set_ignored(source, ignored)?;
        self.commit(snapshot)
    }

    pub fn rename(
        &mut self,
        old_source: &str,
        new_source: &str,
        replacement: &str,
    ) -> Result<RefreshStats> {
        let snapshot = self.table.clone();
        self.table.rename(old_source, new_source, replacement)?;
        self.commit(snapshot)
    }

    /// Re-read the store after an external edit (another process writing
    /// the file) and bring the listeners back in line.
    pub fn reload(&mut self) -> Result<RefreshStats> {
        self.table = storage::load_table_from(&self.store_path)?;
        self.hooks.refresh(&self.table)
    }

    /// Persist the mutated table, then re-derive the listener set. A save
    /// failure rolls the in-memory table back so a failed mutation is not
    /// observable anywhere. A refresh failure (`HookUnavailable`) keeps
    /// the persisted state and the previously-working listeners; the
    /// caller surfaces the degraded-mode warning.
    fn commit(&mut self, snapshot: AbbreviationTable) -> Result<RefreshStats> {
        if let Err(e) = storage::save_table_to(&self.store_path, &self.table) {
            self.table = snapshot;
            return Err(e);
        }
        self.hooks.refresh(&self.table)
    }
}
