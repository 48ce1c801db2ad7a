mod config;
mod ids;
mod prompt;
mod response;
mod session;

pub use ids::{Generation, SLOT_COUNT, Slot};

pub use config::{ConfigError, SessionConfig, SessionConfigDraft};
pub use prompt::{OptionLayout, Prompt, PromptDraft, PromptError};
pub use response::ResponseRecord;
pub use session::{
    EndReason, SessionMode, SessionOutcome, SessionReport, SessionReportError, SessionStats,
    WIN_THRESHOLD, score_percent, stars_for,
};
