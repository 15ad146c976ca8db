use crate::error::StrategyError;
use crate::factory::create_strategy;
use crate::positions::{PositionMatrix, combine_returns};
use crate::Strategy;
use chrono::{DateTime, Utc};
use configuration::Config;
use core_types::stats::sharpe_or_default;
use core_types::{PricePanel, Sanitize, StrategyId};
use serde::{Deserialize, Serialize};

/// A daily return stream and its annualized Sharpe ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    pub returns: Vec<f64>,
    /// 0 when the stream has no volatility.
    pub sharpe_ratio: f64,
}

impl StrategyPerformance {
    fn from_returns(returns: Vec<f64>, label: &str) -> Self {
        let sharpe_ratio = sharpe_or_default(&returns, label);
        Self { returns, sharpe_ratio }
    }
}

impl Sanitize for StrategyPerformance {
    fn sanitize(&mut self) {
        self.returns.sanitize();
        self.sharpe_ratio.sanitize();
    }
}

/// Output of the signal engine for one panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySignals {
    /// Timestamps of the return rows.
    pub timestamps: Vec<DateTime<Utc>>,
    pub momentum: StrategyPerformance,
    pub mean_reversion: StrategyPerformance,
    /// Element-wise mean of the momentum and mean reversion streams.
    pub combined: StrategyPerformance,
    #[serde(skip)]
    pub momentum_positions: PositionMatrix,
    #[serde(skip)]
    pub mean_reversion_positions: PositionMatrix,
}

impl Sanitize for StrategySignals {
    fn sanitize(&mut self) {
        self.momentum.sanitize();
        self.mean_reversion.sanitize();
        self.combined.sanitize();
    }
}

/// Runs both signal families over a panel and scores them.
pub struct SignalEngine {
    momentum: Box<dyn Strategy>,
    mean_reversion: Box<dyn Strategy>,
}

impl SignalEngine {
    pub fn new(config: &Config) -> Result<Self, StrategyError> {
        Ok(Self {
            momentum: create_strategy(StrategyId::Momentum, config)?,
            mean_reversion: create_strategy(StrategyId::MeanReversion, config)?,
        })
    }

    pub fn run(&self, panel: &PricePanel) -> Result<StrategySignals, StrategyError> {
        let returns = panel.returns();

        let momentum_positions = self.momentum.positions(panel, &returns)?;
        let mean_reversion_positions = self.mean_reversion.positions(panel, &returns)?;

        let momentum_returns = combine_returns(&momentum_positions, &returns)?;
        let mean_reversion_returns = combine_returns(&mean_reversion_positions, &returns)?;
        let combined_returns: Vec<f64> = momentum_returns
            .iter()
            .zip(&mean_reversion_returns)
            .map(|(m, r)| (m + r) / 2.0)
            .collect();

        let signals = StrategySignals {
            timestamps: returns.timestamps().to_vec(),
            momentum: StrategyPerformance::from_returns(momentum_returns, "momentum"),
            mean_reversion: StrategyPerformance::from_returns(mean_reversion_returns, "mean_reversion"),
            combined: StrategyPerformance::from_returns(combined_returns, "combined"),
            momentum_positions,
            mean_reversion_positions,
        };

        tracing::info!(
            momentum_sharpe = signals.momentum.sharpe_ratio,
            mean_reversion_sharpe = signals.mean_reversion.sharpe_ratio,
            combined_sharpe = signals.combined.sharpe_ratio,
            "Strategy signals computed."
        );
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn synthetic_panel(rows: usize) -> PricePanel {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..rows).map(|i| start + Duration::days(i as i64)).collect();
        let closes = (0..4)
            .map(|asset| {
                (0..rows)
                    .map(|t| {
                        let x = t as f64;
                        100.0 + asset as f64 * 10.0 + (x * (0.11 + 0.07 * asset as f64)).sin() * 5.0 + x * 0.05 * asset as f64
                    })
                    .collect()
            })
            .collect();
        PricePanel::new(
            timestamps,
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            closes,
        )
        .unwrap()
    }

    #[test]
    fn reported_sharpe_ratios_round_trip_through_positions() {
        let panel = synthetic_panel(200);
        let signals = SignalEngine::new(&Config::default()).unwrap().run(&panel).unwrap();
        let returns = panel.returns();

        let momentum = combine_returns(&signals.momentum_positions, &returns).unwrap();
        let mean_reversion = combine_returns(&signals.mean_reversion_positions, &returns).unwrap();

        assert_eq!(momentum, signals.momentum.returns);
        assert_relative_eq!(
            sharpe_or_default(&momentum, "check"),
            signals.momentum.sharpe_ratio,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            sharpe_or_default(&mean_reversion, "check"),
            signals.mean_reversion.sharpe_ratio,
            epsilon = 1e-12
        );
        assert!(signals.momentum_positions.active_count() > 0);
    }

    #[test]
    fn combined_is_the_average_stream() {
        let panel = synthetic_panel(120);
        let signals = SignalEngine::new(&Config::default()).unwrap().run(&panel).unwrap();

        assert_eq!(signals.timestamps.len(), 119);
        assert_eq!(signals.combined.returns[0], 0.0);
        for i in 0..signals.combined.returns.len() {
            assert_relative_eq!(
                signals.combined.returns[i],
                (signals.momentum.returns[i] + signals.mean_reversion.returns[i]) / 2.0
            );
        }
    }

    #[test]
    fn constant_prices_give_zero_sharpe_not_nan() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..80).map(|i| start + Duration::days(i)).collect();
        let panel = PricePanel::new(
            timestamps,
            vec!["A".into(), "B".into()],
            vec![vec![10.0; 80], vec![20.0; 80]],
        )
        .unwrap();

        let signals = SignalEngine::new(&Config::default()).unwrap().run(&panel).unwrap();
        assert_eq!(signals.momentum.sharpe_ratio, 0.0);
        assert_eq!(signals.mean_reversion.sharpe_ratio, 0.0);
        assert_eq!(signals.combined.sharpe_ratio, 0.0);
    }
}
