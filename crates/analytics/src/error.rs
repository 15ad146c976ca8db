use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Return stream has {returns} values but {timestamps} timestamps")]
    LengthMismatch { returns: usize, timestamps: usize },
}
