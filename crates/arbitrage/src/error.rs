use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrageError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Symbol '{0}' is not part of the price panel")]
    UnknownSymbol(String),
}
