use async_trait::async_trait;
use quiz_core::model::{ResponseRecord, SessionReport};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A finished session as stored in history, with its answer log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub id: i64,
    pub report: SessionReport,
    pub records: Vec<ResponseRecord>,
}

/// Lightweight listing row (no answer log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: i64,
    pub report: SessionReport,
}

impl SessionRow {
    #[must_use]
    pub fn new(id: i64, report: SessionReport) -> Self {
        Self { id, report }
    }
}

/// Repository contract for finished sessions.
#[async_trait]
pub trait SessionHistoryRepository: Send + Sync {
    /// Append a finished session together with its answer log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn append_session(
        &self,
        report: &SessionReport,
        records: &[ResponseRecord],
    ) -> Result<i64, StorageError>;

    /// Fetch a stored session by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, id: i64) -> Result<StoredSession, StorageError>;

    /// List the most recent sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<Vec<StoredSession>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SessionHistoryRepository for InMemoryRepository {
    async fn append_session(
        &self,
        report: &SessionReport,
        records: &[ResponseRecord],
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("session id overflow".into()))?
            + 1;
        guard.push(StoredSession {
            id,
            report: report.clone(),
            records: records.to_vec(),
        });
        Ok(id)
    }

    async fn get_session(&self, id: i64) -> Result<StoredSession, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .take(limit)
            .map(|s| SessionRow::new(s.id, s.report.clone()))
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionHistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let sessions: Arc<dyn SessionHistoryRepository> = Arc::new(InMemoryRepository::new());
        Self { sessions }
    }
}
