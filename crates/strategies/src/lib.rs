//! # Signal Engine
//!
//! This crate derives trading positions from a price panel and scores the
//! resulting daily return streams.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O. It depends only on `core-types` and `configuration`.
//! - **Strategy agnostic engine:** the `SignalEngine` drives every signal family
//!   through the `Strategy` trait and never looks at their internals.
//! - **Extensibility:** adding a strategy means a new module implementing
//!   `Strategy`, a new `StrategyId` variant and a new arm in the factory.
//!
//! ## Public API
//!
//! - `Strategy`: the trait every signal family implements.
//! - `create_strategy`: the factory building a strategy from its id.
//! - `combine_returns`: turns positions into a strategy return stream.
//! - `SignalEngine` / `StrategySignals`: the stage entry point and its output.

// Declare all the modules that constitute this crate.
pub mod error;
pub mod factory;
pub mod mean_reversion;
pub mod momentum;
pub mod positions;
pub mod signals;

// Re-export the key components to create a clean, public-facing API.
pub use error::StrategyError;
pub use factory::create_strategy;
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use positions::{PositionMatrix, combine_returns};
pub use signals::{SignalEngine, StrategyPerformance, StrategySignals};

pub use core_types::StrategyId;

use core_types::{PricePanel, ReturnSeries};

/// The core trait that all signal families implement.
///
/// The `Send + Sync` bounds let the engine evaluate strategies from the
/// analysis thread pool.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Computes the position held in every asset at the close of each return row.
    ///
    /// # Arguments
    ///
    /// * `panel` - The aligned close prices.
    /// * `returns` - The return series derived from `panel`.
    fn positions(&self, panel: &PricePanel, returns: &ReturnSeries) -> Result<PositionMatrix, StrategyError>;
}
