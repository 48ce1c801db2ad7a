use thiserror::Error;

use crate::model::{ConfigError, PromptError, SessionReportError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Report(#[from] SessionReportError),
}
