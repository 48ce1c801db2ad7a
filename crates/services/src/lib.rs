#![forbid(unsafe_code)]

pub mod error;
pub mod lives;
pub mod presentation;
pub mod round;
pub mod runtime;
pub mod sequencer;
pub mod sessions;
pub mod timer;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::SessionError;
pub use lives::LivesTracker;
pub use presentation::{Presentation, PresentationCommand, RecordingPresentation};
pub use round::{ActiveRound, Phase, Resolution, RoundEvent, RoundStateMachine};
pub use runtime::{DriveOutcome, PlayerInput, SessionRuntime};
pub use sequencer::{QuestionSequencer, arrange_options};
pub use sessions::{PlayedSession, SessionHistoryItem, SessionHistoryService, SessionLoopService};
pub use timer::{TimerService, TimerSignal, TimerState};
