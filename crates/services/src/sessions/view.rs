use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{EndReason, SessionMode, SessionOutcome};
use storage::repository::{
    InMemoryRepository, SessionHistoryRepository, SessionRow, StoredSession,
};

use crate::error::SessionError;

/// Presentation-agnostic history row. No pre-formatted strings; the caller
/// decides how to render timestamps and outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistoryItem {
    pub id: i64,
    pub ended_at: DateTime<Utc>,
    pub mode: SessionMode,
    pub reason: EndReason,
    pub outcome: SessionOutcome,

    pub answered: u32,
    pub correct: u32,
    pub score: u8,
    pub stars: u8,
}

impl SessionHistoryItem {
    #[must_use]
    pub fn from_row(row: &SessionRow) -> Self {
        let report = &row.report;
        Self {
            id: row.id,
            ended_at: report.ended_at(),
            mode: report.mode(),
            reason: report.reason(),
            outcome: report.outcome(),
            answered: report.answered(),
            correct: report.correct(),
            score: report.score(),
            stars: report.stars(),
        }
    }
}

/// Read side of the session history.
#[derive(Clone)]
pub struct SessionHistoryService {
    history: Arc<dyn SessionHistoryRepository>,
}

impl SessionHistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn SessionHistoryRepository>) -> Self {
        Self { history }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<SessionHistoryItem>, SessionError> {
        let rows = self.history.list_sessions(limit).await?;
        Ok(rows.iter().map(SessionHistoryItem::from_row).collect())
    }

    /// Fetch one session with its answer log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails or the id is unknown.
    pub async fn get_session(&self, id: i64) -> Result<StoredSession, SessionError> {
        Ok(self.history.get_session(id).await?)
    }
}
