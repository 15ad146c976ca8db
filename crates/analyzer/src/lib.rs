//! # Market Analyzer
//!
//! A quick descriptive pass over the price panel: what was loaded, how the
//! assets behaved, and how their returns move together. Independent of every
//! other stage.

use chrono::{DateTime, Utc};
use core_types::stats::{correlation, mean, std_dev};
use core_types::{CoreError, PricePanel, Sanitize};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod error;

pub use error::AnalyzerError;

/// Shape of the loaded panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub assets: usize,
    pub observations: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DataSummary {
    pub fn from_panel(panel: &PricePanel) -> Self {
        Self {
            assets: panel.n_assets(),
            observations: panel.len(),
            start: panel.first_timestamp(),
            end: panel.last_timestamp(),
        }
    }
}

/// Daily return statistics of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetStats {
    pub symbol: String,
    pub mean_return: f64,
    /// Sample standard deviation of daily returns.
    pub volatility: f64,
    /// Last price over first price, minus one.
    pub total_return: f64,
}

/// Pairwise return correlations in panel order. `None` where an asset has no
/// return variance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub data: DataSummary,
    /// Mean of the per-asset mean daily returns.
    pub average_daily_return: f64,
    /// Mean of the per-asset daily return standard deviations.
    pub average_volatility: f64,
    pub best_performer: Option<String>,
    pub worst_performer: Option<String>,
    pub correlation: CorrelationMatrix,
    /// Best mean daily return first.
    pub ranked_assets: Vec<AssetStats>,
}

impl Sanitize for MarketSummary {
    fn sanitize(&mut self) {
        self.average_daily_return.sanitize();
        self.average_volatility.sanitize();
        for row in &mut self.correlation.values {
            row.sanitize();
        }
        for asset in &mut self.ranked_assets {
            asset.mean_return.sanitize();
            asset.volatility.sanitize();
            asset.total_return.sanitize();
        }
    }
}

#[derive(Debug, Default)]
pub struct MarketAnalyzer {}

impl MarketAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summarize(&self, panel: &PricePanel) -> Result<MarketSummary, AnalyzerError> {
        let returns = panel.returns();
        if returns.len() < 2 {
            return Err(CoreError::DataUnavailable(format!(
                "{} return rows are too few to summarize",
                returns.len()
            ))
            .into());
        }

        let mut assets: Vec<AssetStats> = panel
            .symbols()
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let prices = panel.column(i);
                let column = returns.column(i);
                AssetStats {
                    symbol: symbol.clone(),
                    mean_return: mean(column).unwrap_or(0.0),
                    volatility: std_dev(column).unwrap_or(0.0),
                    total_return: prices[prices.len() - 1] / prices[0] - 1.0,
                }
            })
            .collect();

        let average_daily_return = average(assets.iter().map(|a| a.mean_return))?;
        let average_volatility = average(assets.iter().map(|a| a.volatility))?;

        let columns = returns.columns();
        let values = columns
            .iter()
            .map(|a| columns.iter().map(|b| correlation(a, b)).collect())
            .collect();

        // 1. Rank
        assets.sort_by(|a, b| b.mean_return.partial_cmp(&a.mean_return).unwrap_or(Ordering::Equal));

        let summary = MarketSummary {
            data: DataSummary::from_panel(panel),
            average_daily_return,
            average_volatility,
            best_performer: assets.first().map(|a| a.symbol.clone()),
            worst_performer: assets.last().map(|a| a.symbol.clone()),
            correlation: CorrelationMatrix {
                symbols: panel.symbols().to_vec(),
                values,
            },
            ranked_assets: assets,
        };

        tracing::info!(
            assets = summary.data.assets,
            observations = summary.data.observations,
            best = ?summary.best_performer,
            worst = ?summary.worst_performer,
            "Market summary complete."
        );
        Ok(summary)
    }
}

fn average(values: impl Iterator<Item = f64>) -> Result<f64, AnalyzerError> {
    let values: Vec<f64> = values.collect();
    let m = mean(&values).unwrap_or(0.0);
    if m.is_finite() {
        Ok(m)
    } else {
        Err(AnalyzerError::Calculation("cross-asset average is not finite".to_string()))
    }
}
