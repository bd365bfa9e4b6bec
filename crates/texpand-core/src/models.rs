use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TexpandError};

/// One abbreviation and its expansion. An ignored entry stays in the table
/// (visible to the editor) but is excluded from active matching.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AbbreviationEntry {
    pub source: String,
    pub replacement: String,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub updated_at: String,
}

impl AbbreviationEntry {
    pub fn new(source: String, replacement: String) -> Self {
        Self {
            source,
            replacement,
            ignored: false,
            updated_at: Local::now().to_rfc3339(),
        }
    }

    pub fn formatted_time(&self) -> String {
        let entry_time = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|dt| dt.with_timezone(&Local))
            .unwrap_or_else(|_| Local::now());

        let now = Local::now();
        let duration = now.signed_duration_since(entry_time);

        if duration.num_seconds() < 60 {
            format!("{}s ago", duration.num_seconds())
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            format!("{}d ago", duration.num_days())
        }
    }
}

/// The in-memory abbreviation table: the single source of truth the engine
/// matches against. Sources are unique keys; insertion order is preserved
/// for display only and carries no matching semantics.
///
/// All mutation goes through the operations below. Each returns only after
/// the table is in a fully valid state, so an observer never sees a
/// half-applied edit.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct AbbreviationTable {
    entries: Vec<AbbreviationEntry>,
}

impl AbbreviationTable {
    /// Build a table from raw entries, e.g. a parsed store file. Sources
    /// are trimmed and validated; a duplicated source keeps its last
    /// occurrence, mirroring the last-write-wins edit policy.
    pub fn from_entries(entries: Vec<AbbreviationEntry>) -> Result<Self> {
        let mut table = Self::default();
        for entry in entries {
            let (source, replacement) = validate(&entry.source, &entry.replacement)?;
            table.entries.retain(|e| e.source != source);
            table.entries.push(AbbreviationEntry {
                source,
                replacement,
                ignored: entry.ignored,
                updated_at: entry.updated_at,
            });
        }
        Ok(table)
    }

    pub fn entries(&self) -> &[AbbreviationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, source: &str) -> Option<&AbbreviationEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    /// Entries that participate in matching: everything not ignored.
    pub fn active_entries(&self) -> impl Iterator<Item = &AbbreviationEntry> {
        self.entries.iter().filter(|e| !e.ignored)
    }

    /// Insert a new abbreviation or update the replacement of an existing
    /// one. An existing entry keeps its position and its ignored flag.
    pub fn upsert(&mut self, source: &str, replacement: &str) -> Result<()> {
        let (source, replacement) = validate(source, replacement)?;

        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(entry) => {
                entry.replacement = replacement;
                entry.updated_at = Local::now().to_rfc3339();
            }
            None => self.entries.push(AbbreviationEntry::new(source, replacement)),
        }
        Ok(())
    }

    pub fn delete(&mut self, source: &str) -> Result<()> {
        if self.get(source).is_none() {
            return Err(TexpandError::NotFound(source.to_string()));
        }
        self.entries.retain(|e| e.source != source);
        Ok(())
    }

    pub fn set_ignored(&mut self, source: &str, ignored: bool) -> Result<()> {
        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(entry) => {
                entry.ignored = ignored;
                Ok(())
            }
            None => Err(TexpandError::NotFound(source.to_string())),
        }
    }

    /// Change an entry's source, implemented as delete-then-insert: the key
    /// of an entry is never mutated in place. If `new_source` already
    /// exists it is overwritten (last-write-wins). The renamed entry comes
    /// back unignored, matching the editor's edit semantics.
    pub fn rename(&mut self, old_source: &str, new_source: &str, replacement: &str) -> Result<()> {
        let (new_source, replacement) = validate(new_source, replacement)?;

        if self.get(old_source).is_none() {
            return Err(TexpandError::NotFound(old_source.to_string()));
        }

        self.entries.retain(|e| e.source != old_source);
        self.entries.retain(|e| e.source != new_source);
        self.entries
            .push(AbbreviationEntry::new(new_source, replacement));
        Ok(())
    }
}

fn validate(source: &str, replacement: &str) -> Result<(String, String)> {
    let source = source.trim();
    let replacement = replacement.trim();

    if source.is_empty() {
        return Err(TexpandError::InvalidEntry(
            "abbreviation must not be empty".to_string(),
        ));
    }
    if replacement.is_empty() {
        return Err(TexpandError::InvalidEntry(
            "replacement must not be empty".to_string(),
        ));
    }
    Ok((source.to_string(), replacement.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(entries: &[(&str, &str)]) -> AbbreviationTable {
        let mut table = AbbreviationTable::default();
        for (source, replacement) in entries {
            table.upsert(source, replacement).unwrap();
        }
        table
    }

    #[test]
    fn upsert_inserts_and_updates() {
        let mut table = table_with(&[("brb", "be right back")]);
        assert_eq!(table.get("brb").unwrap().replacement, "be right back");

        table.upsert("brb", "be right back!").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("brb").unwrap().replacement, "be right back!");
    }

    #[test]
    fn upsert_trims_and_rejects_empty() {
        let mut table = AbbreviationTable::default();
        table.upsert("  omw ", " on my way ").unwrap();
        assert_eq!(table.get("omw").unwrap().replacement, "on my way");

        assert!(matches!(
            table.upsert("   ", "x"),
            Err(TexpandError::InvalidEntry(_))
        ));
        assert!(matches!(
            table.upsert("abbr", "  "),
            Err(TexpandError::InvalidEntry(_))
        ));
    }

    #[test]
    fn upsert_keeps_position_and_ignored_flag() {
        let mut table = table_with(&[("a", "1"), ("b", "2")]);
        table.set_ignored("a", true).unwrap();

        table.upsert("a", "one").unwrap();
        assert_eq!(table.entries()[0].source, "a");
        assert!(table.entries()[0].ignored);
        assert_eq!(table.entries()[0].replacement, "one");
    }

    #[test]
    fn delete_removes_entry() {
        let mut table = table_with(&[("a", "1"), ("b", "2")]);
        table.delete("a").unwrap();
        assert!(table.get("a").is_none());
        assert_eq!(table.len(), 1);

        assert!(matches!(
            table.delete("a"),
            Err(TexpandError::NotFound(_))
        ));
    }

    #[test]
    fn set_ignored_round_trip() {
        let mut table = table_with(&[("brb", "be right back")]);

        table.set_ignored("brb", true).unwrap();
        assert!(table.get("brb").unwrap().ignored);
        assert_eq!(table.active_entries().count(), 0);
        assert_eq!(table.len(), 1);

        table.set_ignored("brb", false).unwrap();
        assert_eq!(table.active_entries().count(), 1);

        assert!(matches!(
            table.set_ignored("nope", true),
            Err(TexpandError::NotFound(_))
        ));
    }

    #[test]
    fn rename_is_delete_then_insert() {
        let mut table = table_with(&[("foo", "old"), ("other", "x")]);
        table.rename("foo", "bar", "new").unwrap();

        assert!(table.get("foo").is_none());
        assert_eq!(table.get("bar").unwrap().replacement, "new");
        // Renamed entries are re-inserted, so they move to the end.
        assert_eq!(table.entries()[1].source, "bar");
    }

    #[test]
    fn rename_overwrites_existing_target() {
        let mut table = table_with(&[("foo", "1"), ("bar", "2")]);
        table.rename("foo", "bar", "3").unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("bar").unwrap().replacement, "3");
    }

    #[test]
    fn rename_missing_source_fails() {
        let mut table = table_with(&[("a", "1")]);
        assert!(matches!(
            table.rename("missing", "b", "2"),
            Err(TexpandError::NotFound(_))
        ));
    }

    #[test]
    fn rename_resets_ignored_flag() {
        let mut table = table_with(&[("foo", "1")]);
        table.set_ignored("foo", true).unwrap();

        table.rename("foo", "foo", "1").unwrap();
        assert!(!table.get("foo").unwrap().ignored);
    }

    #[test]
    fn from_entries_keeps_last_duplicate() {
        let entries = vec![
            AbbreviationEntry::new("a".into(), "first".into()),
            AbbreviationEntry::new("b".into(), "2".into()),
            AbbreviationEntry::new("a".into(), "second".into()),
        ];
        let table = AbbreviationTable::from_entries(entries).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().replacement, "second");
    }
}
