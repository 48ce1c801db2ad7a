use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionReportError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("correct count ({correct}) exceeds answered count ({answered})")]
    CountMismatch { answered: u32, correct: u32 },

    #[error("unknown {field}: {raw}")]
    UnknownVariant { field: &'static str, raw: String },
}

/// Minimum score (percent) a completed session needs to count as won.
pub const WIN_THRESHOLD: u8 = 50;

//
// ─── MODE / OUTCOME ────────────────────────────────────────────────────────────
//

/// Fixed for a session's lifetime. Only `Timed` has a countdown and lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Practice,
    Timed,
}

impl SessionMode {
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, SessionMode::Timed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Practice => "practice",
            SessionMode::Timed => "timed",
        }
    }
}

impl FromStr for SessionMode {
    type Err = SessionReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(Self::Practice),
            "timed" => Ok(Self::Timed),
            _ => Err(SessionReportError::UnknownVariant {
                field: "mode",
                raw: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Pending,
    Won,
    Lost,
}

impl SessionOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionOutcome::Pending => "pending",
            SessionOutcome::Won => "won",
            SessionOutcome::Lost => "lost",
        }
    }
}

impl FromStr for SessionOutcome {
    type Err = SessionReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(SessionReportError::UnknownVariant {
                field: "outcome",
                raw: s.to_owned(),
            }),
        }
    }
}

/// Why a session stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every prompt was shown; the only path that can report `completed`.
    PromptsExhausted,
    LivesExhausted,
    TimeExpired,
}

impl EndReason {
    #[must_use]
    pub fn completed(self) -> bool {
        matches!(self, EndReason::PromptsExhausted)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::PromptsExhausted => "prompts_exhausted",
            EndReason::LivesExhausted => "lives_exhausted",
            EndReason::TimeExpired => "time_expired",
        }
    }
}

impl FromStr for EndReason {
    type Err = SessionReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompts_exhausted" => Ok(Self::PromptsExhausted),
            "lives_exhausted" => Ok(Self::LivesExhausted),
            "time_expired" => Ok(Self::TimeExpired),
            _ => Err(SessionReportError::UnknownVariant {
                field: "end reason",
                raw: s.to_owned(),
            }),
        }
    }
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Running answer counts. `correct <= answered` holds by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    answered: u32,
    correct: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scored strike.
    pub fn record(&mut self, was_correct: bool) {
        self.answered = self.answered.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        score_percent(self.correct, self.answered)
    }
}

/// `round(correct / max(1, answered) * 100)`, rounding halves to even.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_percent(correct: u32, answered: u32) -> u8 {
    let ratio = f64::from(correct) / f64::from(answered.max(1));
    (ratio * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Star rating shown on the result panel.
#[must_use]
pub fn stars_for(score: u8) -> u8 {
    match score {
        90.. => 3,
        60.. => 2,
        30.. => 1,
        _ => 0,
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Final, immutable result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    mode: SessionMode,
    reason: EndReason,
    outcome: SessionOutcome,
    answered: u32,
    correct: u32,
    score: u8,
    lives_remaining: Option<u32>,
    time_remaining_secs: Option<u32>,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

impl SessionReport {
    /// Compute the final result. A session is only won when every prompt was
    /// shown *and* the score reaches [`WIN_THRESHOLD`].
    #[must_use]
    pub fn conclude(
        mode: SessionMode,
        reason: EndReason,
        stats: SessionStats,
        lives_remaining: Option<u32>,
        time_remaining_secs: Option<u32>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let score = stats.score();
        let outcome = if reason.completed() && score >= WIN_THRESHOLD {
            SessionOutcome::Won
        } else {
            SessionOutcome::Lost
        };

        Self {
            mode,
            reason,
            outcome,
            answered: stats.answered(),
            correct: stats.correct(),
            score,
            lives_remaining,
            time_remaining_secs,
            started_at,
            ended_at: ended_at.max(started_at),
        }
    }

    /// Rehydrate a report from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionReportError` if counts or timestamps are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        mode: SessionMode,
        reason: EndReason,
        outcome: SessionOutcome,
        answered: u32,
        correct: u32,
        lives_remaining: Option<u32>,
        time_remaining_secs: Option<u32>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<Self, SessionReportError> {
        if ended_at < started_at {
            return Err(SessionReportError::InvalidTimeRange);
        }
        if correct > answered {
            return Err(SessionReportError::CountMismatch { answered, correct });
        }

        Ok(Self {
            mode,
            reason,
            outcome,
            answered,
            correct,
            score: score_percent(correct, answered),
            lives_remaining,
            time_remaining_secs,
            started_at,
            ended_at,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn reason(&self) -> EndReason {
        self.reason
    }

    /// True when the session ended because every prompt was shown.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.reason.completed()
    }

    #[must_use]
    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    #[must_use]
    pub fn won(&self) -> bool {
        self.outcome == SessionOutcome::Won
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn stars(&self) -> u8 {
        stars_for(self.score)
    }

    #[must_use]
    pub fn lives_remaining(&self) -> Option<u32> {
        self.lives_remaining
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> Option<u32> {
        self.time_remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn stats(correct: u32, answered: u32) -> SessionStats {
        let mut s = SessionStats::new();
        for i in 0..answered {
            s.record(i < correct);
        }
        s
    }

    fn conclude(reason: EndReason, s: SessionStats) -> SessionReport {
        let now = fixed_now();
        SessionReport::conclude(SessionMode::Practice, reason, s, None, None, now, now)
    }

    #[test]
    fn low_score_downgrades_completed_run() {
        let report = conclude(EndReason::PromptsExhausted, stats(4, 10));
        assert_eq!(report.score(), 40);
        assert!(report.completed());
        assert_eq!(report.outcome(), SessionOutcome::Lost);
    }

    #[test]
    fn high_score_completed_run_wins() {
        let report = conclude(EndReason::PromptsExhausted, stats(9, 10));
        assert_eq!(report.score(), 90);
        assert_eq!(report.outcome(), SessionOutcome::Won);
        assert_eq!(report.stars(), 3);
    }

    #[test]
    fn incomplete_run_never_wins() {
        let report = conclude(EndReason::TimeExpired, stats(10, 10));
        assert_eq!(report.score(), 100);
        assert_eq!(report.outcome(), SessionOutcome::Lost);
    }

    #[test]
    fn empty_session_scores_zero() {
        assert_eq!(score_percent(0, 0), 0);
        let report = conclude(EndReason::PromptsExhausted, SessionStats::new());
        assert_eq!(report.score(), 0);
        assert!(report.completed());
        assert!(!report.won());
    }

    #[test]
    fn score_rounds_half_to_even() {
        assert_eq!(score_percent(1, 8), 12);
        assert_eq!(score_percent(3, 8), 38);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 2), 50);
    }

    #[test]
    fn stars_follow_thresholds() {
        assert_eq!(stars_for(29), 0);
        assert_eq!(stars_for(30), 1);
        assert_eq!(stars_for(60), 2);
        assert_eq!(stars_for(89), 2);
        assert_eq!(stars_for(100), 3);
    }

    #[test]
    fn persisted_report_validates_counts() {
        let now = fixed_now();
        let err = SessionReport::from_persisted(
            SessionMode::Timed,
            EndReason::TimeExpired,
            SessionOutcome::Lost,
            2,
            3,
            Some(1),
            Some(0),
            now,
            now,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SessionReportError::CountMismatch {
                answered: 2,
                correct: 3
            }
        );
    }

    #[test]
    fn variants_round_trip_through_strings() {
        for mode in [SessionMode::Practice, SessionMode::Timed] {
            assert_eq!(mode.as_str().parse::<SessionMode>().unwrap(), mode);
        }
        for reason in [
            EndReason::PromptsExhausted,
            EndReason::LivesExhausted,
            EndReason::TimeExpired,
        ] {
            assert_eq!(reason.as_str().parse::<EndReason>().unwrap(), reason);
        }
        assert!("draw".parse::<SessionOutcome>().is_err());
    }
}
