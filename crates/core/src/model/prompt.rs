use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SLOT_COUNT, Slot};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PromptError {
    #[error("prompt text cannot be empty")]
    EmptyText,

    #[error("answer options cannot be empty")]
    EmptyOption,

    #[error("expected 2 wrong answers, got {len}")]
    WrongOptionCount { len: usize },

    #[error("answer options must be distinct: {option:?} appears twice")]
    DuplicateOption { option: String },

    #[error("option order must be a permutation of 0..3, got {order:?}")]
    InvalidPermutation { order: [usize; SLOT_COUNT] },
}

//
// ─── PROMPT ────────────────────────────────────────────────────────────────────
//

/// A multiple-choice question: one correct option and two distractors.
///
/// Immutable once built. Options are compared after trimming, so a prompt never
/// carries two options that would render identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PromptDraft", into = "PromptDraft")]
pub struct Prompt {
    text: String,
    correct_option: String,
    wrong_options: [String; 2],
}

/// Wire shape of a prompt inside a question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDraft {
    pub prompt: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(rename = "wrongAnswers")]
    pub wrong_answers: Vec<String>,
}

impl Prompt {
    /// Build a validated prompt.
    ///
    /// # Errors
    ///
    /// Returns `PromptError` if any text is blank or two options collide.
    pub fn new(
        text: impl Into<String>,
        correct_option: impl Into<String>,
        wrong_options: [String; 2],
    ) -> Result<Self, PromptError> {
        let text = text.into();
        let correct_option = correct_option.into();

        if text.trim().is_empty() {
            return Err(PromptError::EmptyText);
        }
        let all = [&correct_option, &wrong_options[0], &wrong_options[1]];
        if all.iter().any(|o| o.trim().is_empty()) {
            return Err(PromptError::EmptyOption);
        }
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                if a.trim() == b.trim() {
                    return Err(PromptError::DuplicateOption {
                        option: a.trim().to_owned(),
                    });
                }
            }
        }

        Ok(Self {
            text,
            correct_option,
            wrong_options,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn wrong_options(&self) -> &[String; 2] {
        &self.wrong_options
    }

    /// Options in canonical order: the correct one first, then the distractors.
    #[must_use]
    pub fn options(&self) -> [&str; SLOT_COUNT] {
        [
            &self.correct_option,
            &self.wrong_options[0],
            &self.wrong_options[1],
        ]
    }
}

impl TryFrom<PromptDraft> for Prompt {
    type Error = PromptError;

    fn try_from(draft: PromptDraft) -> Result<Self, Self::Error> {
        let len = draft.wrong_answers.len();
        let wrong: [String; 2] = draft
            .wrong_answers
            .try_into()
            .map_err(|_| PromptError::WrongOptionCount { len })?;
        Self::new(draft.prompt, draft.correct_answer, wrong)
    }
}

impl From<Prompt> for PromptDraft {
    fn from(prompt: Prompt) -> Self {
        let [first, second] = prompt.wrong_options;
        Self {
            prompt: prompt.text,
            correct_answer: prompt.correct_option,
            wrong_answers: vec![first, second],
        }
    }
}

//
// ─── OPTION LAYOUT ─────────────────────────────────────────────────────────────
//

/// The three option texts as placed on screen, plus where the correct one landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionLayout {
    options: [String; SLOT_COUNT],
    correct_slot: Slot,
}

impl OptionLayout {
    /// Place a prompt's options using `order`, where `order[slot]` is an index
    /// into [`Prompt::options`].
    ///
    /// # Errors
    ///
    /// Returns `PromptError::InvalidPermutation` unless `order` is a permutation of `0..3`.
    pub fn arrange(prompt: &Prompt, order: [usize; SLOT_COUNT]) -> Result<Self, PromptError> {
        let mut seen = [false; SLOT_COUNT];
        for &i in &order {
            if i >= SLOT_COUNT || seen[i] {
                return Err(PromptError::InvalidPermutation { order });
            }
            seen[i] = true;
        }

        let canonical = prompt.options();
        let options = order.map(|i| canonical[i].to_owned());
        // Canonical index 0 is the correct option; exactly one slot holds it.
        let correct_slot = order
            .iter()
            .position(|&i| i == 0)
            .and_then(Slot::new)
            .ok_or(PromptError::InvalidPermutation { order })?;

        Ok(Self {
            options,
            correct_slot,
        })
    }

    /// Canonical placement: correct option in slot 0, wrong options after it.
    #[must_use]
    pub fn canonical(prompt: &Prompt) -> Self {
        Self {
            options: prompt.options().map(str::to_owned),
            correct_slot: Slot::ALL[0],
        }
    }

    #[must_use]
    pub fn options(&self) -> &[String; SLOT_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, slot: Slot) -> &str {
        &self.options[slot.index()]
    }

    #[must_use]
    pub fn correct_slot(&self) -> Slot {
        self.correct_slot
    }
}
