use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An aligned, gap-free table of close prices for two or more assets.
///
/// Every asset shares the same strictly ascending timestamp index. The panel is
/// immutable once constructed; all analysis stages read from it concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePanel {
    timestamps: Vec<DateTime<Utc>>,
    symbols: Vec<String>,
    /// Column-major storage: `closes[asset][row]`.
    closes: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Builds a panel after validating its invariants.
    ///
    /// # Arguments
    ///
    /// * `timestamps` - The shared index, strictly ascending.
    /// * `symbols` - One unique symbol per asset column, at least two.
    /// * `closes` - One column per symbol, each as long as `timestamps`,
    ///   containing only finite, positive prices.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        symbols: Vec<String>,
        closes: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        if symbols.len() < 2 {
            return Err(CoreError::InvalidInput(
                "symbols".to_string(),
                format!("a panel needs at least 2 assets, got {}", symbols.len()),
            ));
        }
        if symbols.len() != closes.len() {
            return Err(CoreError::InvalidInput(
                "closes".to_string(),
                format!("{} symbols but {} price columns", symbols.len(), closes.len()),
            ));
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(CoreError::InvalidInput(
                    "symbols".to_string(),
                    format!("duplicate symbol '{}'", symbol),
                ));
            }
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidInput(
                "timestamps".to_string(),
                "timestamps must be strictly ascending".to_string(),
            ));
        }
        for (symbol, column) in symbols.iter().zip(&closes) {
            if column.len() != timestamps.len() {
                return Err(CoreError::InvalidInput(
                    symbol.clone(),
                    format!("{} prices for {} timestamps", column.len(), timestamps.len()),
                ));
            }
            if let Some(bad) = column.iter().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(CoreError::InvalidInput(
                    symbol.clone(),
                    format!("price {} is not a finite positive number", bad),
                ));
            }
        }

        Ok(Self { timestamps, symbols, closes })
    }

    /// Number of rows (timestamps).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The close prices of the asset at `index`.
    pub fn column(&self, index: usize) -> &[f64] {
        &self.closes[index]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.closes
    }

    /// Looks up a price column by symbol.
    pub fn column_by_symbol(&self, symbol: &str) -> Option<&[f64]> {
        self.symbol_index(symbol).map(|i| self.closes[i].as_slice())
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Natural logarithm of every close, column-major.
    pub fn log_prices(&self) -> Vec<Vec<f64>> {
        self.closes
            .iter()
            .map(|column| column.iter().map(|p| p.ln()).collect())
            .collect()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Derives the simple return series of this panel.
    pub fn returns(&self) -> ReturnSeries {
        ReturnSeries::from_panel(self)
    }
}

/// Percentage change between consecutive rows of a [`PricePanel`], per asset.
///
/// Row `r` of the return series is the change from panel row `r` to row `r + 1`
/// and carries the timestamp of panel row `r + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    timestamps: Vec<DateTime<Utc>>,
    symbols: Vec<String>,
    /// Column-major storage: `values[asset][row]`.
    values: Vec<Vec<f64>>,
}

impl ReturnSeries {
    pub fn from_panel(panel: &PricePanel) -> Self {
        let timestamps = panel.timestamps().iter().skip(1).copied().collect();
        let values = panel
            .columns()
            .iter()
            .map(|column| column.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
            .collect();

        Self {
            timestamps,
            symbols: panel.symbols().to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// The returns of every asset at one row.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|column| column[row]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn sample_panel() -> PricePanel {
        PricePanel::new(
            vec![day(1), day(2), day(3)],
            vec!["BTC".to_string(), "ETH".to_string()],
            vec![vec![100.0, 110.0, 99.0], vec![10.0, 10.0, 12.0]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_single_asset() {
        let err = PricePanel::new(vec![day(1)], vec!["BTC".to_string()], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(..)));
    }

    #[test]
    fn rejects_unsorted_timestamps() {
        let err = PricePanel::new(
            vec![day(2), day(1)],
            vec!["A".to_string(), "B".to_string()],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "timestamps"));
    }

    #[test]
    fn rejects_non_positive_prices() {
        let err = PricePanel::new(
            vec![day(1), day(2)],
            vec!["A".to_string(), "B".to_string()],
            vec![vec![1.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "A"));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let err = PricePanel::new(
            vec![day(1)],
            vec!["A".to_string(), "A".to_string()],
            vec![vec![1.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(..)));
    }

    #[test]
    fn returns_drop_the_first_row() {
        let panel = sample_panel();
        let returns = panel.returns();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.timestamps(), &[day(2), day(3)]);
        assert_relative_eq!(returns.column(0)[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns.column(0)[1], -0.1, epsilon = 1e-12);
        assert_relative_eq!(returns.column(1)[1], 0.2, epsilon = 1e-12);
        assert_eq!(returns.row(0).len(), 2);
    }

    #[test]
    fn symbol_lookup() {
        let panel = sample_panel();
        assert_eq!(panel.column_by_symbol("ETH"), Some(&[10.0, 10.0, 12.0][..]));
        assert!(panel.column_by_symbol("SOL").is_none());
        assert_relative_eq!(panel.log_prices()[0][0], 100f64.ln());
    }
}
