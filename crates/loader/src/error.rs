use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Panel error: {0}")]
    Core(#[from] CoreError),

    #[error("Failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: u64, message: String },
}
