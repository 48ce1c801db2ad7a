//! Round control: one session of prompts, strikes, feedback delays and the
//! final outcome.

mod agenda;
mod machine;

use quiz_core::model::{OptionLayout, Prompt, SessionOutcome, SessionReport, Slot};
use storage::ResponseLogError;

pub use machine::RoundStateMachine;

/// How the current round's scored strike went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session, or the last one was abandoned.
    Idle,
    /// Drawing the next prompt and placing targets.
    Displaying,
    /// Targets are up and the round is unlocked.
    AwaitingInput,
    /// A strike was scored and its feedback delay is running.
    Resolving(Resolution),
    /// Terminal for the session; only `Won` or `Lost`.
    Ended(SessionOutcome),
}

impl Phase {
    /// Displaying, awaiting input or resolving.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Phase::Displaying | Phase::AwaitingInput | Phase::Resolving(_)
        )
    }

    #[must_use]
    pub fn is_ended(self) -> bool {
        matches!(self, Phase::Ended(_))
    }
}

/// The round currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRound {
    number: u32,
    prompt: Prompt,
    layout: OptionLayout,
    locked: bool,
    recorded: bool,
}

impl ActiveRound {
    /// 1-based position within the session.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    #[must_use]
    pub fn layout(&self) -> &OptionLayout {
        &self.layout
    }

    #[must_use]
    pub fn correct_slot(&self) -> Slot {
        self.layout.correct_slot()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Symbolic outcomes returned by every state machine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    RoundStarted {
        round: u32,
        correct_slot: Slot,
    },
    RoundResolved {
        round: u32,
        slot: Slot,
        correct: bool,
    },
    /// A miss delay finished and the same targets accept input again.
    RoundUnlocked {
        round: u32,
    },
    SessionEnded {
        report: SessionReport,
        /// Set when the response log could not be written. The outcome is
        /// still revealed.
        persist_error: Option<ResponseLogError>,
    },
    OutcomeRevealed,
}
