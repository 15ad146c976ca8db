use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CointegrationError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Not enough observations: {needed} required, {got} available")]
    InsufficientData { needed: usize, got: usize },

    #[error("Singular moment matrix: {0}")]
    Singular(String),

    #[error("The trace test supports at most {max} assets, got {got}")]
    TooManyAssets { max: usize, got: usize },

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}
