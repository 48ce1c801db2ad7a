//! Append-only answer log owned by a running session.
//!
//! The round state machine calls [`ResponseLog::clear`] at session start,
//! [`ResponseLog::append`] once per scored strike and [`ResponseLog::persist`]
//! exactly once when the session ends. Where the records go is up to the
//! implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use quiz_core::model::ResponseRecord;
use serde::Serialize;
use thiserror::Error;

/// Failures while persisting the answer log.
///
/// `Clone` so the failure can travel inside a session report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponseLogError {
    #[error("failed to write responses to {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to encode responses: {0}")]
    Serialization(String),

    #[error("response log unavailable: {0}")]
    Unavailable(String),
}

pub trait ResponseLog: Send {
    /// Drop every record accumulated so far.
    fn clear(&mut self);

    /// Add one record to the end of the log.
    fn append(&mut self, record: ResponseRecord);

    /// Records accumulated since the last `clear`.
    fn records(&self) -> Vec<ResponseRecord>;

    /// Write the accumulated records to the backing medium.
    ///
    /// # Errors
    ///
    /// Returns `ResponseLogError` if the write fails. The records stay in memory.
    fn persist(&mut self) -> Result<(), ResponseLogError>;
}

//
// ─── IN MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<ResponseRecord>,
    persisted: Vec<Vec<ResponseRecord>>,
    fail_persist: bool,
}

/// Shared in-memory log. Clones observe the same records, which lets tests keep
/// a handle after giving one to the state machine.
#[derive(Debug, Clone, Default)]
pub struct MemoryResponseLog {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryResponseLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `persist` call fail.
    #[must_use]
    pub fn failing() -> Self {
        let log = Self::new();
        log.lock().fail_persist = true;
        log
    }

    /// Every batch handed to `persist`, oldest first.
    #[must_use]
    pub fn persisted(&self) -> Vec<Vec<ResponseRecord>> {
        self.lock().persisted.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-append; the data is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ResponseLog for MemoryResponseLog {
    fn clear(&mut self) {
        self.lock().records.clear();
    }

    fn append(&mut self, record: ResponseRecord) {
        self.lock().records.push(record);
    }

    fn records(&self) -> Vec<ResponseRecord> {
        self.lock().records.clone()
    }

    fn persist(&mut self) -> Result<(), ResponseLogError> {
        let mut state = self.lock();
        if state.fail_persist {
            return Err(ResponseLogError::Unavailable("persistence disabled".into()));
        }
        let batch = state.records.clone();
        state.persisted.push(batch);
        Ok(())
    }
}

//
// ─── JSON FILE ─────────────────────────────────────────────────────────────────
//

#[derive(Serialize)]
struct ResponseList<'a> {
    responses: &'a [ResponseRecord],
}

/// Writes `{"responses": [...]}` to a file on every `persist`, replacing
/// previous contents.
#[derive(Debug, Clone)]
pub struct JsonFileResponseLog {
    path: PathBuf,
    records: Vec<ResponseRecord>,
}

impl JsonFileResponseLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseLog for JsonFileResponseLog {
    fn clear(&mut self) {
        self.records.clear();
    }

    fn append(&mut self, record: ResponseRecord) {
        self.records.push(record);
    }

    fn records(&self) -> Vec<ResponseRecord> {
        self.records.clone()
    }

    fn persist(&mut self) -> Result<(), ResponseLogError> {
        let body = serde_json::to_string_pretty(&ResponseList {
            responses: &self.records,
        })
        .map_err(|e| ResponseLogError::Serialization(e.to_string()))?;

        std::fs::write(&self.path, body).map_err(|e| ResponseLogError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn memory_log_shares_state_between_clones() {
        let handle = MemoryResponseLog::new();
        let mut log = handle.clone();

        log.append(ResponseRecord::answered("Q", "A", true, fixed_now()));
        log.persist().unwrap();
        log.clear();

        assert!(handle.records().is_empty());
        assert_eq!(handle.persisted().len(), 1);
        assert_eq!(handle.persisted()[0].len(), 1);
    }

    #[test]
    fn failing_memory_log_keeps_records() {
        let mut log = MemoryResponseLog::failing();
        log.append(ResponseRecord::unanswered("Q", fixed_now()));
        assert!(log.persist().is_err());
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn json_log_writes_responses_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json");
        let mut log = JsonFileResponseLog::new(&path);

        log.append(ResponseRecord::answered("2+2?", "5", false, fixed_now()));
        log.persist().unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["responses"][0]["question"], "2+2?");
        assert_eq!(written["responses"][0]["correct"], false);
    }

    #[test]
    fn json_log_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = JsonFileResponseLog::new(dir.path().join("missing").join("responses.json"));
        log.append(ResponseRecord::answered("Q", "A", true, fixed_now()));

        let err = log.persist().unwrap_err();
        assert!(matches!(err, ResponseLogError::Io { .. }));
        assert_eq!(log.records().len(), 1);
    }
}
