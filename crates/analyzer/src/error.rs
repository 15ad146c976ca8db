use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Core error: {0}")]
    Core(#[from] core_types::CoreError),

    #[error("An internal calculation error occurred: {0}")]
    Calculation(String),
}
