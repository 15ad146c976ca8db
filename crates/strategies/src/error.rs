use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Positions and returns do not line up: {0}")]
    ShapeMismatch(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
