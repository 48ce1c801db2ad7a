use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use quiz_core::model::{SessionConfig, SessionMode, SessionReport};
use storage::ResponseLogError;
use storage::repository::{InMemoryRepository, SessionHistoryRepository};

use crate::error::SessionError;
use crate::runtime::{DriveOutcome, PlayerInput, SessionRuntime};

/// A session that ran to its end and was written to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedSession {
    pub history_id: i64,
    pub report: SessionReport,
    /// Failure of the per-session response log, which does not stop the
    /// history write.
    pub persist_error: Option<ResponseLogError>,
}

/// Plays sessions to completion and records them in history.
#[derive(Clone)]
pub struct SessionLoopService {
    history: Arc<dyn SessionHistoryRepository>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(history: Arc<dyn SessionHistoryRepository>) -> Self {
        Self { history }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Start a session on `runtime`, drive it until it ends, then append it
    /// to history.
    ///
    /// Returns `Ok(None)` if the player quit before the session ended.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the history write fails. The
    /// outcome has already been shown by then.
    pub async fn play(
        &self,
        runtime: &mut SessionRuntime,
        mode: SessionMode,
        config: SessionConfig,
        inputs: &mut mpsc::Receiver<PlayerInput>,
    ) -> Result<Option<PlayedSession>, SessionError> {
        runtime.start(mode, config);

        let report = match runtime.drive(inputs).await {
            DriveOutcome::Finished(report) => report,
            DriveOutcome::Abandoned => {
                info!(mode = %mode, "session left before it ended; nothing recorded");
                return Ok(None);
            }
        };

        let machine = runtime.machine();
        let records = machine.records();
        let persist_error = machine.persist_error().cloned();

        let history_id = match self.history.append_session(&report, &records).await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "failed to record session history");
                return Err(err.into());
            }
        };
        info!(history_id, score = report.score(), "session recorded");

        Ok(Some(PlayedSession {
            history_id,
            report,
            persist_error,
        }))
    }
}
