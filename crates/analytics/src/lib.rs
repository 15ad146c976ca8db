//! # Analytics Engine
//!
//! Performance metrics for a daily strategy return stream. It acts as the
//! "unbiased judge" of the signal engine's output.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** depends only on `core-types`. No I/O, no configuration.
//! - **Stateless calculation:** `AnalyticsEngine` takes a return stream and
//!   produces a `BacktestReport`, which makes it trivial to test.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the calculator.
//! - `BacktestReport` / `EquityPoint`: the standardized metrics.
//! - `AnalyticsError`: the errors this crate can return.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::{BacktestReport, EquityPoint};
