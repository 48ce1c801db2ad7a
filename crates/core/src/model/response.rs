use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the per-session answer log.
///
/// Serialized with the field names used by the exported responses file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "question")]
    pub prompt_text: String,
    /// `None` when the round ended before any target was struck.
    #[serde(rename = "chosenAnswer")]
    pub chosen_option: Option<String>,
    #[serde(rename = "correct")]
    pub was_correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl ResponseRecord {
    #[must_use]
    pub fn answered(
        prompt_text: impl Into<String>,
        chosen_option: impl Into<String>,
        was_correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            chosen_option: Some(chosen_option.into()),
            was_correct,
            timestamp,
        }
    }

    #[must_use]
    pub fn unanswered(prompt_text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            chosen_option: None,
            was_correct: false,
            timestamp,
        }
    }
}
