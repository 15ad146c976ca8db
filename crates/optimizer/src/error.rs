use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// The solver produced no usable iterate at all.
    #[error("Optimizer did not converge to a usable allocation: {0}")]
    NonConvergence(String),
}
