//! Commands the round state machine sends to whatever renders the game.
//!
//! Implementations are fire-and-forget: they never feed decisions back into
//! the machine. Feedback durations are owned by the machine's configuration.

use std::sync::{Arc, Mutex, MutexGuard};

use quiz_core::model::{SLOT_COUNT, SessionReport, Slot};

pub trait Presentation {
    fn display_prompt(&mut self, text: &str, options: &[String; SLOT_COUNT]);

    /// Spawn the three targets; `correct_slot` tags the one carrying the right answer.
    fn spawn_targets(&mut self, correct_slot: Slot);

    fn play_hit_sequence(&mut self, slot: Slot);

    fn play_miss_sequence(&mut self);

    fn show_outcome(&mut self, report: &SessionReport);

    fn update_timer_display(&mut self, text: &str);

    fn update_lives_display(&mut self, remaining: u32);

    /// Remove any targets still on screen.
    fn clear_targets(&mut self);
}

/// One recorded call on [`RecordingPresentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationCommand {
    DisplayPrompt {
        text: String,
        options: [String; SLOT_COUNT],
    },
    SpawnTargets {
        correct_slot: Slot,
    },
    PlayHit {
        slot: Slot,
    },
    PlayMiss,
    ShowOutcome {
        score: u8,
        won: bool,
    },
    TimerDisplay(String),
    LivesDisplay(u32),
    ClearTargets,
}

/// Presentation that only records what it was told to do.
///
/// Clones share one command list, so a test can keep a handle after boxing
/// another into the state machine.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    commands: Arc<Mutex<Vec<PresentationCommand>>>,
}

impl RecordingPresentation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> Vec<PresentationCommand> {
        self.lock().clone()
    }

    /// Drain the recorded commands.
    pub fn take(&self) -> Vec<PresentationCommand> {
        std::mem::take(&mut *self.lock())
    }

    fn push(&self, command: PresentationCommand) {
        self.lock().push(command);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PresentationCommand>> {
        self.commands
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Presentation for RecordingPresentation {
    fn display_prompt(&mut self, text: &str, options: &[String; SLOT_COUNT]) {
        self.push(PresentationCommand::DisplayPrompt {
            text: text.to_string(),
            options: options.clone(),
        });
    }

    fn spawn_targets(&mut self, correct_slot: Slot) {
        self.push(PresentationCommand::SpawnTargets { correct_slot });
    }

    fn play_hit_sequence(&mut self, slot: Slot) {
        self.push(PresentationCommand::PlayHit { slot });
    }

    fn play_miss_sequence(&mut self) {
        self.push(PresentationCommand::PlayMiss);
    }

    fn show_outcome(&mut self, report: &SessionReport) {
        self.push(PresentationCommand::ShowOutcome {
            score: report.score(),
            won: report.won(),
        });
    }

    fn update_timer_display(&mut self, text: &str) {
        self.push(PresentationCommand::TimerDisplay(text.to_string()));
    }

    fn update_lives_display(&mut self, remaining: u32) {
        self.push(PresentationCommand::LivesDisplay(remaining));
    }

    fn clear_targets(&mut self) {
        self.push(PresentationCommand::ClearTargets);
    }
}
