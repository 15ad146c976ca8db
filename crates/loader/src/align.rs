use crate::error::LoaderError;
use chrono::{DateTime, Utc};
use configuration::DataSettings;
use core_types::{CoreError, PricePanel};
use std::collections::{BTreeMap, HashSet};

/// A single close observation as delivered by a data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }

    /// A close that cannot be used for analysis marks a gap.
    fn is_usable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// The unaligned price history of one asset. May be unsorted, contain
/// duplicate timestamps, or contain gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl RawSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    /// Collapses duplicate timestamps (the last observation wins) and orders
    /// the result by time. Gap values are kept so they can veto a row.
    fn deduplicated(&self) -> BTreeMap<DateTime<Utc>, f64> {
        let mut by_time = BTreeMap::new();
        for point in &self.points {
            let close = if point.is_usable() { point.close } else { f64::NAN };
            by_time.insert(point.timestamp, close);
        }
        by_time
    }
}

/// Normalizes raw per-asset histories into an aligned, gap-free panel.
///
/// Rows are the inner join of all timestamps: a timestamp survives only if
/// every asset has a usable close at it. The panel keeps the order of
/// `series` for its columns.
pub fn build_panel(series: &[RawSeries], settings: &DataSettings) -> Result<PricePanel, LoaderError> {
    if series.len() < 2 {
        return Err(CoreError::InvalidInput(
            "series".to_string(),
            format!("at least 2 assets are required, got {}", series.len()),
        )
        .into());
    }
    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.symbol.as_str()) {
            return Err(CoreError::InvalidInput(
                "series".to_string(),
                format!("duplicate symbol '{}'", s.symbol),
            )
            .into());
        }
    }

    let maps: Vec<BTreeMap<DateTime<Utc>, f64>> =
        series.iter().map(RawSeries::deduplicated).collect();

    let mut timestamps = Vec::new();
    let mut closes: Vec<Vec<f64>> = vec![Vec::new(); series.len()];
    // Iterating the first map keeps ascending order for free.
    'rows: for (timestamp, first_close) in &maps[0] {
        if first_close.is_nan() {
            continue;
        }
        let mut row = Vec::with_capacity(maps.len());
        row.push(*first_close);
        for map in &maps[1..] {
            match map.get(timestamp) {
                Some(close) if !close.is_nan() => row.push(*close),
                _ => continue 'rows,
            }
        }
        timestamps.push(*timestamp);
        for (column, close) in closes.iter_mut().zip(row) {
            column.push(close);
        }
    }

    let longest = maps.iter().map(BTreeMap::len).max().unwrap_or(0);
    tracing::debug!(
        rows = timestamps.len(),
        dropped = longest.saturating_sub(timestamps.len()),
        "Aligned raw series on common timestamps."
    );

    if timestamps.is_empty() {
        return Err(CoreError::DataUnavailable(
            "no timestamp has a usable close for every asset".to_string(),
        )
        .into());
    }
    if timestamps.len() < settings.min_rows {
        return Err(CoreError::DataUnavailable(format!(
            "aligned panel has {} rows, at least {} are required",
            timestamps.len(),
            settings.min_rows
        ))
        .into());
    }

    let symbols = series.iter().map(|s| s.symbol.clone()).collect();
    let panel = PricePanel::new(timestamps, symbols, closes)?;
    tracing::info!(assets = panel.n_assets(), rows = panel.len(), "Price panel ready.");
    Ok(panel)
}
