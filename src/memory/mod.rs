use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Local>,
    pub user_input: String,
    pub agent_response: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    pub count: usize,
    pub oldest: Option<DateTime<Local>>,
    pub newest: Option<DateTime<Local>>,
}

/// Append-only interaction log, capped at `max_entries` with FIFO eviction.
/// The whole sequence is rewritten to one JSON file on every mutation; a
/// missing or corrupt file loads as an empty log.
pub struct MemoryLog {
    path: PathBuf,
    max_entries: usize,
    records: Vec<InteractionRecord>,
}

impl MemoryLog {
    pub fn open(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let records = load_records(&path);
        Self {
            path,
            max_entries,
            records,
        }
    }

    pub fn append(
        &mut self,
        user_input: &str,
        agent_response: &str,
        context: Map<String, Value>,
    ) -> Result<(), AppError> {
        self.records.push(InteractionRecord {
            timestamp: Local::now(),
            user_input: user_input.to_string(),
            agent_response: agent_response.to_string(),
            context,
        });

        if self.records.len() > self.max_entries {
            let excess = self.records.len() - self.max_entries;
            self.records.drain(..excess);
        }

        self.persist()
    }

    /// Last `n` records in chronological order (oldest of the window first).
    pub fn recent(&self, n: usize) -> &[InteractionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Case-insensitive substring search over inputs and responses, scanning
    /// newest to oldest. Results come back newest-first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&InteractionRecord> {
        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for record in self.records.iter().rev() {
            if matches.len() >= limit {
                break;
            }
            if record.user_input.to_lowercase().contains(&needle)
                || record.agent_response.to_lowercase().contains(&needle)
            {
                matches.push(record);
            }
        }
        matches
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.records.clear();
        self.persist()
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            count: self.records.len(),
            oldest: self.records.first().map(|r| r.timestamp),
            newest: self.records.last().map(|r| r.timestamp),
        }
    }

    fn persist(&self) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, text)
            .map_err(|e| AppError::Message(format!("Cannot persist memory to {}: {e}", self.path.display())))?;
        debug!(records = self.records.len(), "memory persisted");
        Ok(())
    }
}

fn load_records(path: &Path) -> Vec<InteractionRecord> {
    if !path.exists() {
        return Vec::new();
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "memory file unreadable, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "memory file corrupt, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &tempfile::TempDir, max_entries: usize) -> MemoryLog {
        MemoryLog::open(dir.path().join("memory.json"), max_entries)
    }

    #[test]
    fn append_caps_at_max_entries_fifo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = log_in(&dir, 3);
        for i in 0..5 {
            log.append(&format!("input {i}"), "ok", Map::new()).expect("append");
        }

        assert_eq!(log.summary().count, 3);
        let survivors: Vec<_> = log.recent(3).iter().map(|r| r.user_input.clone()).collect();
        assert_eq!(survivors, vec!["input 2", "input 3", "input 4"]);
    }

    #[test]
    fn recent_returns_chronological_suffix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = log_in(&dir, 10);
        for i in 0..4 {
            log.append(&format!("q{i}"), &format!("a{i}"), Map::new()).expect("append");
        }

        let window = log.recent(2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].user_input, "q2");
        assert_eq!(window[1].user_input, "q3");
        assert!(window[0].timestamp <= window[1].timestamp);

        assert!(log.recent(0).is_empty());
        assert_eq!(log.recent(100).len(), 4);
    }

    #[test]
    fn search_is_case_insensitive_and_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = log_in(&dir, 10);
        log.append("tell me about Rust", "sure", Map::new()).expect("append");
        log.append("what time is it", "noon", Map::new()).expect("append");
        log.append("more rust please", "RUST it is", Map::new()).expect("append");

        let hits = log.search("RUST", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].user_input, "more rust please");
        assert_eq!(hits[1].user_input, "tell me about Rust");

        assert_eq!(log.search("rust", 1).len(), 1);
        assert!(log.search("python", 5).is_empty());
    }

    #[test]
    fn clear_then_summary_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = log_in(&dir, 10);
        log.append("hi", "hello", Map::new()).expect("append");
        log.clear().expect("clear");

        let summary = log.summary();
        assert_eq!(summary.count, 0);
        assert!(summary.oldest.is_none());
        assert!(summary.newest.is_none());
    }

    #[test]
    fn reopen_restores_persisted_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("memory.json");
        {
            let mut log = MemoryLog::open(&path, 10);
            log.append("persist me", "done", Map::new()).expect("append");
        }

        let log = MemoryLog::open(&path, 10);
        assert_eq!(log.summary().count, 1);
        assert_eq!(log.recent(1)[0].user_input, "persist me");
    }

    #[test]
    fn absent_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = log_in(&dir, 10);
        assert_eq!(log.summary().count, 0);
    }

    #[test]
    fn corrupt_file_loads_empty_and_recovers_on_next_append() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ not valid json").expect("write");

        let mut log = MemoryLog::open(&path, 10);
        assert_eq!(log.summary().count, 0);

        log.append("fresh start", "ok", Map::new()).expect("append");
        let reopened = MemoryLog::open(&path, 10);
        assert_eq!(reopened.summary().count, 1);
    }
}
