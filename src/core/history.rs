// src/core/history.rs

use crate::{constants::MAX_HISTORY_ENTRIES, models::HistoryEntry};
use chrono::Utc;
use std::{fs, io::ErrorKind, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Could not read history file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not write history file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("History file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives a record of every successful foreground execution.
///
/// Recording is best effort: the executor logs failures and carries on.
pub trait HistoryRecorder {
    fn record(&self, command: &str, rule_name: &str) -> Result<(), HistoryError>;
}

/// A recorder that drops every entry. Used for dry runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl HistoryRecorder for NoHistory {
    fn record(&self, _command: &str, _rule_name: &str) -> Result<(), HistoryError> {
        Ok(())
    }
}

/// History persisted as a JSON array, newest entry first.
#[derive(Debug, Clone)]
pub struct JsonHistory {
    path: PathBuf,
}

impl JsonHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads all entries. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&data).map_err(|source| HistoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Removes every entry.
    pub fn clear(&self) -> Result<(), HistoryError> {
        self.save(&[])
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let data = serde_json::to_vec_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| HistoryError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        fs::write(&self.path, data).map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl HistoryRecorder for JsonHistory {
    fn record(&self, command: &str, rule_name: &str) -> Result<(), HistoryError> {
        // A corrupt file is replaced rather than blocking new entries.
        let mut entries = self.load().unwrap_or_else(|e| {
            log::warn!("Starting a fresh history: {}", e);
            Vec::new()
        });
        entries.insert(
            0,
            HistoryEntry {
                timestamp: Utc::now(),
                command: command.to_string(),
                rule_name: rule_name.to_string(),
            },
        );
        entries.truncate(MAX_HISTORY_ENTRIES);
        log::debug!(
            "Recording history entry '{}' ({} entries)",
            command,
            entries.len()
        );
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonHistory::new(dir.path().join("history.json"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn test_record_prepends_newest_entry() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonHistory::new(dir.path().join("nested").join("history.json"));
        history.record("a.txt", "Text").unwrap();
        history.record("b.md", "").unwrap();

        let entries = history.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command, "b.md");
        assert_eq!(entries[0].rule_name, "");
        assert_eq!(entries[1].command, "a.txt");
        assert_eq!(entries[1].rule_name, "Text");
        assert!(entries[0].timestamp >= entries[1].timestamp);
    }

    #[test]
    fn test_history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonHistory::new(dir.path().join("history.json"));
        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            history.record(&format!("file{}.txt", i), "").unwrap();
        }
        let entries = history.load().unwrap();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(
            entries[0].command,
            format!("file{}.txt", MAX_HISTORY_ENTRIES + 4)
        );
    }

    #[test]
    fn test_corrupt_file_is_reported_on_load_but_replaced_on_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        let history = JsonHistory::new(&path);

        assert!(matches!(history.load(), Err(HistoryError::Corrupt { .. })));
        history.record("a.txt", "").unwrap();
        assert_eq!(history.load().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_empties_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonHistory::new(dir.path().join("history.json"));
        history.record("a.txt", "").unwrap();
        history.clear().unwrap();
        assert!(history.load().unwrap().is_empty());
    }
}
