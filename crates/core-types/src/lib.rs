pub mod enums;
pub mod error;
pub mod panel;
pub mod stats;

// Re-export the core types to provide a clean public API.
pub use enums::{Position, SpreadDirection, StageName, StrategyId};
pub use error::CoreError;
pub use panel::{PricePanel, ReturnSeries};
pub use stats::{Sanitize, TRADING_DAYS_PER_YEAR};
