use std::path::Path;

use quiz_core::model::Prompt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("failed to read or write question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid question bank: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Editable set of prompts, stored as `{"items": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    items: Vec<Prompt>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(items: Vec<Prompt>) -> Self {
        Self { items }
    }

    /// Parse a bank from JSON. Every prompt is validated on the way in.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Parse` for malformed JSON or invalid prompts.
    pub fn from_json(json: &str) -> Result<Self, QuestionBankError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Write the bank as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` if encoding or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), QuestionBankError> {
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)?;
        Ok(())
    }

    pub fn add(&mut self, prompt: Prompt) {
        self.items.push(prompt);
    }

    #[must_use]
    pub fn prompts(&self) -> &[Prompt] {
        &self.items
    }

    #[must_use]
    pub fn into_prompts(self) -> Vec<Prompt> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
