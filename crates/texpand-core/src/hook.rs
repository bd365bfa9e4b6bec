use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::MATCH_TIMEOUT;
use crate::error::{Result, TexpandError};
use crate::matcher::{KeyInput, ListenerSet, MatchEvent};
use crate::models::AbbreviationTable;

/// What a `refresh` actually did, so callers (and tests) can observe that
/// an unchanged table produces no registration work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

impl RefreshStats {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.updated == 0
    }
}

/// Owns the process-global input interception state: the listener records
/// derived from the table, plus the health of the OS hook itself. Raw
/// registration state is never handed out; the control plane goes through
/// `refresh` and the event path goes through `dispatch`.
#[derive(Clone)]
pub struct HookManager {
    set: Arc<Mutex<ListenerSet>>,
    // Flipped by the listener thread when the OS denies interception.
    hook_alive: Arc<AtomicBool>,
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new(MATCH_TIMEOUT)
    }
}

impl HookManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            set: Arc::new(Mutex::new(ListenerSet::new(timeout))),
            hook_alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Bring the listener set exactly in line with the non-ignored entries
    /// of the table. Stale registrations are released before anything else
    /// so a just-removed abbreviation cannot fire during the transition;
    /// unchanged listeners are left untouched, keeping their in-flight
    /// match state.
    ///
    /// If the OS hook is down, removals still happen but additions fail
    /// with `HookUnavailable`, leaving previously-working listeners intact.
    pub fn refresh(&self, table: &AbbreviationTable) -> Result<RefreshStats> {
        let mut set = self.set.lock().unwrap();
        let mut stats = RefreshStats::default();

        let stale: Vec<String> = set
            .sources()
            .into_iter()
            .filter(|source| {
                table
                    .get(source)
                    .map(|entry| entry.ignored)
                    .unwrap_or(true)
            })
            .collect();

        for source in stale {
            set.unregister(&source);
            stats.removed += 1;
        }

        let mut missing = Vec::new();
        for entry in table.active_entries() {
            if set.contains(&entry.source) {
                if set.replacement_of(&entry.source) != Some(entry.replacement.as_str()) {
                    set.update_replacement(&entry.source, &entry.replacement);
                    stats.updated += 1;
                }
            } else {
                missing.push(entry);
            }
        }

        if !missing.is_empty() && !self.is_hook_alive() {
            return Err(TexpandError::HookUnavailable(
                "the global keyboard hook is not installed".to_string(),
            ));
        }

        for entry in missing {
            set.register(&entry.source, &entry.replacement);
            stats.added += 1;
        }

        Ok(stats)
    }

    /// Feed one keystroke to the listener set. Called only from the input
    /// event path; holds the set lock just long enough for one dispatch so
    /// reconfiguration cannot stall event delivery for long.
    pub fn dispatch(&self, input: KeyInput) -> Option<MatchEvent> {
        self.set.lock().unwrap().handle(input)
    }

    pub fn active_sources(&self) -> Vec<String> {
        self.set.lock().unwrap().sources()
    }

    pub fn active_count(&self) -> usize {
        self.set.lock().unwrap().len()
    }

    /// Whether a listener currently holds partial-match state.
    pub fn is_matching(&self, source: &str) -> bool {
        self.set.lock().unwrap().is_matching(source)
    }

    pub fn is_hook_alive(&self) -> bool {
        self.hook_alive.load(Ordering::SeqCst)
    }

    /// Called by the listener thread when hook installation permanently
    /// failed. Existing listener records are kept; they resume working if
    /// a restart brings the hook back.
    pub fn mark_hook_dead(&self) {
        self.hook_alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{BoundaryKey, KeyInput};

    fn table_with(entries: &[(&str, &str)]) -> AbbreviationTable {
        let mut table = AbbreviationTable::default();
        for (source, replacement) in entries {
            table.upsert(source, replacement).unwrap();
        }
        table
    }

    fn type_chars(hooks: &HookManager, word: &str) -> Option<MatchEvent> {
        let mut hit = None;
        for c in word.chars() {
            let input = match BoundaryKey::from_char(c) {
                Some(b) => KeyInput::Boundary(b),
                None => KeyInput::Char(c),
            };
            if let Some(m) = hooks.dispatch(input) {
                hit = Some(m);
            }
        }
        hit
    }

    #[test]
    fn refresh_registers_active_entries_only() {
        let mut table = table_with(&[("brb", "be right back"), ("omw", "on my way")]);
        table.set_ignored("omw", true).unwrap();

        let hooks = HookManager::default();
        let stats = hooks.refresh(&table).unwrap();

        assert_eq!(stats.added, 1);
        assert_eq!(hooks.active_sources(), vec!["brb".to_string()]);
    }

    #[test]
    fn refresh_is_idempotent() {
        let table = table_with(&[("brb", "be right back"), ("omw", "on my way")]);
        let hooks = HookManager::default();

        let first = hooks.refresh(&table).unwrap();
        assert_eq!(first.added, 2);

        let second = hooks.refresh(&table).unwrap();
        assert!(second.is_noop());
        assert_eq!(hooks.active_count(), 2);
    }

    #[test]
    fn refresh_removes_deleted_and_ignored_entries() {
        let mut table = table_with(&[("a", "1"), ("b", "2")]);
        let hooks = HookManager::default();
        hooks.refresh(&table).unwrap();

        table.delete("a").unwrap();
        table.set_ignored("b", true).unwrap();

        let stats = hooks.refresh(&table).unwrap();
        assert_eq!(stats.removed, 2);
        assert_eq!(hooks.active_count(), 0);
    }

    #[test]
    fn refresh_leaves_unrelated_partial_state_alone() {
        let mut table = table_with(&[("brb", "be right back"), ("omw", "on my way")]);
        let hooks = HookManager::default();
        hooks.refresh(&table).unwrap();

        // Start typing one abbreviation, then reconfigure the other.
        type_chars(&hooks, "br");
        assert!(hooks.is_matching("brb"));

        table.delete("omw").unwrap();
        hooks.refresh(&table).unwrap();

        assert!(hooks.is_matching("brb"));
        assert!(type_chars(&hooks, "b ").is_some());
    }

    #[test]
    fn replacement_change_updates_listener_in_place() {
        let mut table = table_with(&[("brb", "old")]);
        let hooks = HookManager::default();
        hooks.refresh(&table).unwrap();

        type_chars(&hooks, "br");
        table.upsert("brb", "new").unwrap();

        let stats = hooks.refresh(&table).unwrap();
        assert_eq!(stats.updated, 1);
        assert!(hooks.is_matching("brb"));

        let hit = type_chars(&hooks, "b ").expect("should fire");
        assert_eq!(hit.replacement, "new");
    }

    #[test]
    fn dead_hook_fails_additions_but_keeps_existing_listeners() {
        let mut table = table_with(&[("brb", "be right back")]);
        let hooks = HookManager::default();
        hooks.refresh(&table).unwrap();

        hooks.mark_hook_dead();
        table.upsert("omw", "on my way").unwrap();

        assert!(matches!(
            hooks.refresh(&table),
            Err(TexpandError::HookUnavailable(_))
        ));
        // The previously-working listener was not torn down.
        assert_eq!(hooks.active_sources(), vec!["brb".to_string()]);
    }

    #[test]
    fn dead_hook_still_allows_removals() {
        let mut table = table_with(&[("a", "1"), ("b", "2")]);
        let hooks = HookManager::default();
        hooks.refresh(&table).unwrap();

        hooks.mark_hook_dead();
        table.delete("a").unwrap();

        let stats = hooks.refresh(&table).unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(hooks.active_sources(), vec!["b".to_string()]);
    }
}
