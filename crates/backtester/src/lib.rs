//! # Backtester
//!
//! Replays the return streams produced by the signal engine through the
//! analytics engine. The combined stream is the headline backtest; the
//! individual signal families can be evaluated the same way.

use analytics::{AnalyticsEngine, BacktestReport};
use core_types::StrategyId;
use strategies::{StrategyPerformance, StrategySignals};

pub mod error;

pub use error::BacktestError;

/// The main backtesting stage.
#[derive(Debug, Default)]
pub struct Backtester {
    analytics_engine: AnalyticsEngine,
}

impl Backtester {
    pub fn new(analytics_engine: AnalyticsEngine) -> Self {
        Self { analytics_engine }
    }

    /// Evaluates the combined signal stream.
    pub fn run(&self, signals: &StrategySignals) -> Result<BacktestReport, BacktestError> {
        let report = self.evaluate(signals, &signals.combined)?;
        tracing::info!(
            total_return = report.total_return,
            sharpe = report.sharpe_ratio,
            max_drawdown = report.max_drawdown,
            win_rate = report.win_rate,
            "Backtest of the combined strategy complete."
        );
        Ok(report)
    }

    /// Evaluates a single signal family.
    pub fn run_strategy(
        &self,
        signals: &StrategySignals,
        strategy: StrategyId,
    ) -> Result<BacktestReport, BacktestError> {
        let stream = match strategy {
            StrategyId::Momentum => &signals.momentum,
            StrategyId::MeanReversion => &signals.mean_reversion,
        };
        self.evaluate(signals, stream)
    }

    fn evaluate(
        &self,
        signals: &StrategySignals,
        stream: &StrategyPerformance,
    ) -> Result<BacktestReport, BacktestError> {
        if stream.returns.is_empty() {
            return Err(BacktestError::DataUnavailable);
        }
        Ok(self
            .analytics_engine
            .calculate(&signals.timestamps, &stream.returns)?)
    }
}
