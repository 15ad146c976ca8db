//! # Price Panel Loader
//!
//! Turns raw, unaligned per-asset price histories into the aligned
//! [`PricePanel`](core_types::PricePanel) that every analysis stage shares.
//!
//! ## Public API
//!
//! - [`build_panel`]: inner-joins raw series on timestamp and drops gaps.
//! - [`read_wide_csv`] / [`load_csv`]: parse a `timestamp,SYM1,SYM2,...` table.
//! - [`load_panel`]: the two combined, for the common file-based workflow.

pub mod align;
pub mod csv_source;
pub mod error;

pub use align::{PricePoint, RawSeries, build_panel};
pub use csv_source::{load_csv, read_wide_csv};
pub use error::LoaderError;

use configuration::DataSettings;
use core_types::PricePanel;
use std::path::Path;

/// Reads a wide price file and aligns it into a panel.
pub fn load_panel(path: &Path, settings: &DataSettings) -> Result<PricePanel, LoaderError> {
    let series = load_csv(path)?;
    build_panel(&series, settings)
}
