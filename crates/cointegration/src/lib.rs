//! # Cointegration Detector
//!
//! Tests whether the log-prices of a panel share long-run equilibria.
//!
//! ## Architectural Principles
//!
//! - **Full universe:** the Johansen trace test and the pairwise screen both
//!   run on every asset of the panel, up to [`MAX_JOHANSEN_ASSETS`].
//! - **Degenerate is not fatal:** a singular panel yields a result without a
//!   trace statistic; the pairwise screen still runs.
//! - **Reproducible bootstrap:** every resample draws from its own seeded
//!   stream, so the estimate is identical on any number of threads.
//!
//! ## Public API
//!
//! - [`CointegrationDetector`]: the stage entry point.
//! - [`johansen_trace`], [`bootstrap_probability`], [`engle_granger`]: the
//!   underlying tests, usable on their own.

pub mod bootstrap;
pub mod detector;
pub mod engle_granger;
pub mod error;
pub mod johansen;
mod linalg;

pub use bootstrap::{BootstrapEstimate, BootstrapPlan, bootstrap_probability};
pub use detector::{CointegrationDetector, CointegrationResult, SymbolPair};
pub use engle_granger::{EngleGranger, PairTest, engle_granger, mackinnon_p_value};
pub use error::CointegrationError;
pub use johansen::{JohansenOutput, MAX_JOHANSEN_ASSETS, critical_value_95, johansen_trace};
