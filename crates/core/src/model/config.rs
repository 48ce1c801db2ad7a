use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::prompt::Prompt;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("session duration must be at least 1 second")]
    InvalidDuration,

    #[error("max lives must be > 0")]
    InvalidMaxLives,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Per-session configuration supplied at session start.
///
/// Timer duration and lives only apply to timed sessions; practice sessions
/// ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    duration_secs: u32,
    max_lives: u32,
    prompts: Vec<Prompt>,
    hit_feedback: Duration,
    miss_feedback: Duration,
    outcome_delay: Duration,
    record_unresolved_rounds: bool,
}

impl SessionConfig {
    pub const DEFAULT_DURATION_SECS: u32 = 60;
    pub const DEFAULT_MAX_LIVES: u32 = 3;
    /// Hammer swing, strike, then remaining targets dropping.
    pub const DEFAULT_HIT_FEEDBACK: Duration = Duration::from_millis(2_400);
    pub const DEFAULT_MISS_FEEDBACK: Duration = Duration::from_millis(500);
    pub const DEFAULT_OUTCOME_DELAY: Duration = Duration::from_millis(1_000);

    /// Creates a configuration with default timings for the given prompts.
    #[must_use]
    pub fn new(prompts: Vec<Prompt>) -> Self {
        Self {
            duration_secs: Self::DEFAULT_DURATION_SECS,
            max_lives: Self::DEFAULT_MAX_LIVES,
            prompts,
            hit_feedback: Self::DEFAULT_HIT_FEEDBACK,
            miss_feedback: Self::DEFAULT_MISS_FEEDBACK,
            outcome_delay: Self::DEFAULT_OUTCOME_DELAY,
            record_unresolved_rounds: false,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDuration` if `secs` is zero.
    pub fn with_duration_secs(mut self, secs: u32) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        self.duration_secs = secs;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMaxLives` if `lives` is zero.
    pub fn with_max_lives(mut self, lives: u32) -> Result<Self, ConfigError> {
        if lives == 0 {
            return Err(ConfigError::InvalidMaxLives);
        }
        self.max_lives = lives;
        Ok(self)
    }

    #[must_use]
    pub fn with_hit_feedback(mut self, delay: Duration) -> Self {
        self.hit_feedback = delay;
        self
    }

    #[must_use]
    pub fn with_miss_feedback(mut self, delay: Duration) -> Self {
        self.miss_feedback = delay;
        self
    }

    #[must_use]
    pub fn with_outcome_delay(mut self, delay: Duration) -> Self {
        self.outcome_delay = delay;
        self
    }

    /// Append an unanswered record for a round cut short by the timer.
    #[must_use]
    pub fn with_record_unresolved_rounds(mut self, record: bool) -> Self {
        self.record_unresolved_rounds = record;
        self
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    #[must_use]
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    #[must_use]
    pub fn hit_feedback(&self) -> Duration {
        self.hit_feedback
    }

    #[must_use]
    pub fn miss_feedback(&self) -> Duration {
        self.miss_feedback
    }

    #[must_use]
    pub fn outcome_delay(&self) -> Duration {
        self.outcome_delay
    }

    #[must_use]
    pub fn record_unresolved_rounds(&self) -> bool {
        self.record_unresolved_rounds
    }
}

/// Serde-facing configuration. Missing fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigDraft {
    pub duration_seconds: Option<u32>,
    pub max_lives: Option<u32>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    pub hit_feedback_ms: Option<u64>,
    pub miss_feedback_ms: Option<u64>,
    pub outcome_delay_ms: Option<u64>,
    pub record_unresolved_rounds: Option<bool>,
}

impl SessionConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft into a session configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the duration or lives budget is zero.
    pub fn validate(self) -> Result<SessionConfig, ConfigError> {
        let mut config = SessionConfig::new(self.prompts)
            .with_duration_secs(
                self.duration_seconds
                    .unwrap_or(SessionConfig::DEFAULT_DURATION_SECS),
            )?
            .with_max_lives(self.max_lives.unwrap_or(SessionConfig::DEFAULT_MAX_LIVES))?;

        if let Some(ms) = self.hit_feedback_ms {
            config = config.with_hit_feedback(Duration::from_millis(ms));
        }
        if let Some(ms) = self.miss_feedback_ms {
            config = config.with_miss_feedback(Duration::from_millis(ms));
        }
        if let Some(ms) = self.outcome_delay_ms {
            config = config.with_outcome_delay(Duration::from_millis(ms));
        }
        if let Some(record) = self.record_unresolved_rounds {
            config = config.with_record_unresolved_rounds(record);
        }
        Ok(config)
    }
}
