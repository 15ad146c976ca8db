use crate::error::EngineError;
use analytics::BacktestReport;
use analyzer::MarketSummary;
use arbitrage::ArbitrageReport;
use cointegration::CointegrationResult;
use core_types::StageName;
use optimizer::PortfolioAllocation;
use serde::{Deserialize, Serialize};
use strategies::StrategySignals;

/// A stage that did not produce a result, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: StageName,
    pub error: String,
}

/// Accumulates stage outputs over one pipeline run.
///
/// Each slot is written once by its stage. Downstream stages read their
/// inputs through the typed accessors, which report a missing upstream
/// result instead of panicking.
#[derive(Debug, Default)]
pub struct AnalysisResults {
    pub cointegration: Option<CointegrationResult>,
    pub signals: Option<StrategySignals>,
    pub portfolio: Option<PortfolioAllocation>,
    pub backtest: Option<BacktestReport>,
    pub arbitrage: Option<ArbitrageReport>,
    pub market_summary: Option<MarketSummary>,
    pub failures: Vec<StageFailure>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cointegration output as an input of `stage`.
    pub fn cointegration_for(&self, stage: StageName) -> Result<&CointegrationResult, EngineError> {
        self.cointegration
            .as_ref()
            .ok_or(EngineError::UpstreamDependencyMissing {
                stage,
                requires: StageName::Cointegration,
            })
    }

    /// Strategy signals as an input of `stage`.
    pub fn signals_for(&self, stage: StageName) -> Result<&StrategySignals, EngineError> {
        self.signals.as_ref().ok_or(EngineError::UpstreamDependencyMissing {
            stage,
            requires: StageName::Strategies,
        })
    }

    /// Unwraps a stage outcome, recording and logging the failure if any.
    pub fn settle<T, E>(&mut self, stage: StageName, outcome: Result<T, E>) -> Option<T>
    where
        E: Into<EngineError>,
    {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                let e: EngineError = e.into();
                tracing::error!(stage = %stage, error = %e, "Analysis stage failed.");
                self.failures.push(StageFailure {
                    stage,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    pub fn has_failed(&self, stage: StageName) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }

    /// Stages that produced a result.
    pub fn completed(&self) -> Vec<StageName> {
        StageName::ALL
            .into_iter()
            .filter(|stage| match stage {
                StageName::Cointegration => self.cointegration.is_some(),
                StageName::Strategies => self.signals.is_some(),
                StageName::Portfolio => self.portfolio.is_some(),
                StageName::Backtest => self.backtest.is_some(),
                StageName::Arbitrage => self.arbitrage.is_some(),
                StageName::MarketSummary => self.market_summary.is_some(),
            })
            .collect()
    }
}
