use crate::Strategy;
use crate::error::StrategyError;
use crate::positions::PositionMatrix;
use configuration::MomentumParams;
use core_types::stats::percentile_ranks;
use core_types::{Position, PricePanel, ReturnSeries, StrategyId};

/// Cross-sectional momentum.
///
/// Each asset is scored by the sum of its last `lookback` returns. Assets are
/// then ranked against each other at every row: the top of the ranking goes
/// long, the bottom goes short, and the middle band stays flat.
pub struct Momentum {
    params: MomentumParams,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, StrategyError> {
        if params.lookback == 0 {
            return Err(StrategyError::InvalidParameters(
                "Momentum lookback cannot be zero".to_string(),
            ));
        }
        if params.short_percentile > params.long_percentile {
            return Err(StrategyError::InvalidParameters(
                "Short percentile must not exceed long percentile".to_string(),
            ));
        }
        Ok(Self { params })
    }

    /// Rolling sum of returns; `NaN` until a full window is available.
    fn scores(&self, column: &[f64]) -> Vec<f64> {
        let lookback = self.params.lookback;
        let mut scores = vec![f64::NAN; column.len()];
        for (end, window) in column.windows(lookback).enumerate() {
            scores[end + lookback - 1] = window.iter().sum();
        }
        scores
    }

    fn classify(&self, rank: Option<f64>) -> Position {
        match rank {
            Some(r) if r > self.params.long_percentile => Position::Long,
            Some(r) if r < self.params.short_percentile => Position::Short,
            _ => Position::Flat,
        }
    }
}

impl Strategy for Momentum {
    fn id(&self) -> StrategyId {
        StrategyId::Momentum
    }

    fn positions(&self, _panel: &PricePanel, returns: &ReturnSeries) -> Result<PositionMatrix, StrategyError> {
        let scores: Vec<Vec<f64>> = returns.columns().iter().map(|c| self.scores(c)).collect();
        let mut positions = vec![vec![Position::Flat; returns.len()]; returns.n_assets()];

        for row in 0..returns.len() {
            let cross_section: Vec<f64> = scores.iter().map(|column| column[row]).collect();
            for (asset, rank) in percentile_ranks(&cross_section).into_iter().enumerate() {
                positions[asset][row] = self.classify(rank);
            }
        }

        tracing::debug!(lookback = self.params.lookback, "Momentum positions computed.");
        PositionMatrix::new(returns.symbols().to_vec(), positions)
    }
}
