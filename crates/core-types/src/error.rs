use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Degenerate statistics in '{0}': zero variance or too few observations")]
    DegenerateStatistics(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}
