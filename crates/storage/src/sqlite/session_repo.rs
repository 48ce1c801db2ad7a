use quiz_core::model::{ResponseRecord, SessionReport};

use super::SqliteRepository;
use super::mapping::{map_report_row, map_response_row, map_session_row};
use crate::repository::{SessionHistoryRepository, SessionRow, StorageError, StoredSession};

#[async_trait::async_trait]
impl SessionHistoryRepository for SqliteRepository {
    async fn append_session(
        &self,
        report: &SessionReport,
        records: &[ResponseRecord],
    ) -> Result<i64, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_sessions (
                    mode, end_reason, outcome, answered, correct,
                    lives_remaining, time_remaining_secs, started_at, ended_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(report.mode().as_str())
        .bind(report.reason().as_str())
        .bind(report.outcome().as_str())
        .bind(i64::from(report.answered()))
        .bind(i64::from(report.correct()))
        .bind(report.lives_remaining().map(i64::from))
        .bind(report.time_remaining_secs().map(i64::from))
        .bind(report.started_at())
        .bind(report.ended_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session_id = res.last_insert_rowid();

        for (position, record) in records.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_responses (
                        session_id, position, prompt_text, chosen_option, was_correct, answered_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(session_id)
            .bind(position)
            .bind(&record.prompt_text)
            .bind(record.chosen_option.as_deref())
            .bind(i64::from(record.was_correct))
            .bind(record.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(session_id)
    }

    async fn get_session(&self, id: i64) -> Result<StoredSession, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    mode, end_reason, outcome, answered, correct,
                    lives_remaining, time_remaining_secs, started_at, ended_at
                FROM quiz_sessions
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;
        let report = map_report_row(&row)?;

        let rows = sqlx::query(
            r"
                SELECT prompt_text, chosen_option, was_correct, answered_at
                FROM quiz_responses
                WHERE session_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_response_row(&row)?);
        }

        Ok(StoredSession {
            id,
            report,
            records,
        })
    }

    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, mode, end_reason, outcome, answered, correct,
                    lives_remaining, time_remaining_secs, started_at, ended_at
                FROM quiz_sessions
                ORDER BY ended_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_session_row(&row)?);
        }
        Ok(out)
    }
}
