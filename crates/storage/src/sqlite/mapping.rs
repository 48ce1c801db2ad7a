use chrono::{DateTime, Utc};
use quiz_core::model::{EndReason, ResponseRecord, SessionMode, SessionOutcome, SessionReport};
use sqlx::Row;

use crate::repository::{SessionRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn opt_u32_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|v| u32_from_i64(field, v)).transpose()
}

pub(crate) fn map_report_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionReport, StorageError> {
    let mode: SessionMode = row
        .try_get::<String, _>("mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let reason: EndReason = row
        .try_get::<String, _>("end_reason")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let outcome: SessionOutcome = row
        .try_get::<String, _>("outcome")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let answered = u32_from_i64("answered", row.try_get::<i64, _>("answered").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let lives_remaining = opt_u32_from_i64(
        "lives_remaining",
        row.try_get::<Option<i64>, _>("lives_remaining")
            .map_err(ser)?,
    )?;
    let time_remaining_secs = opt_u32_from_i64(
        "time_remaining_secs",
        row.try_get::<Option<i64>, _>("time_remaining_secs")
            .map_err(ser)?,
    )?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let ended_at: DateTime<Utc> = row.try_get("ended_at").map_err(ser)?;

    SessionReport::from_persisted(
        mode,
        reason,
        outcome,
        answered,
        correct,
        lives_remaining,
        time_remaining_secs,
        started_at,
        ended_at,
    )
    .map_err(ser)
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(SessionRow::new(id, map_report_row(row)?))
}

pub(crate) fn map_response_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ResponseRecord, StorageError> {
    Ok(ResponseRecord {
        prompt_text: row.try_get("prompt_text").map_err(ser)?,
        chosen_option: row.try_get("chosen_option").map_err(ser)?,
        was_correct: row.try_get::<i64, _>("was_correct").map_err(ser)? != 0,
        timestamp: row.try_get("answered_at").map_err(ser)?,
    })
}
