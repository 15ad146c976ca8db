use crate::results::{AnalysisResults, StageFailure};
use analytics::BacktestReport;
use analyzer::{DataSummary, MarketSummary};
use arbitrage::ArbitrageReport;
use chrono::{DateTime, Utc};
use cointegration::CointegrationResult;
use core_types::{Sanitize, StageName};
use optimizer::PortfolioAllocation;
use serde::{Deserialize, Serialize};
use strategies::StrategySignals;
use uuid::Uuid;

/// The serializable outcome of one pipeline run.
///
/// Every stage section is present. A stage listed in `failures` carries its
/// default (zeroed or empty) value. All floats are finite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub data: DataSummary,
    pub cointegration: CointegrationResult,
    pub strategies: StrategySignals,
    pub portfolio: PortfolioAllocation,
    pub backtest: BacktestReport,
    pub arbitrage: ArbitrageReport,
    pub market_summary: MarketSummary,
    pub failures: Vec<StageFailure>,
}

impl AnalysisReport {
    pub fn from_results(results: AnalysisResults, data: DataSummary) -> Self {
        let mut report = Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            data,
            cointegration: results.cointegration.unwrap_or_default(),
            strategies: results.signals.unwrap_or_default(),
            portfolio: results.portfolio.unwrap_or_default(),
            backtest: results.backtest.unwrap_or_default(),
            arbitrage: results.arbitrage.unwrap_or_default(),
            market_summary: results.market_summary.unwrap_or_default(),
            failures: results.failures,
        };
        report.sanitize();
        report
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, stage: StageName) -> Option<&StageFailure> {
        self.failures.iter().find(|f| f.stage == stage)
    }
}

impl Sanitize for AnalysisReport {
    fn sanitize(&mut self) {
        self.cointegration.sanitize();
        self.strategies.sanitize();
        self.portfolio.sanitize();
        self.backtest.sanitize();
        self.arbitrage.sanitize();
        self.market_summary.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_stages_get_defaults() {
        let mut results = AnalysisResults::new();
        results.failures.push(StageFailure {
            stage: StageName::Backtest,
            error: "no data".to_string(),
        });
        results.portfolio = Some(PortfolioAllocation {
            sharpe_ratio: f64::NAN,
            ..PortfolioAllocation::default()
        });

        let report = AnalysisReport::from_results(results, DataSummary::default());
        assert_eq!(report.backtest, BacktestReport::default());
        assert_eq!(report.portfolio.sharpe_ratio, 0.0);
        assert!(!report.is_complete());
        assert_eq!(report.failure(StageName::Backtest).unwrap().error, "no data");
        assert!(report.failure(StageName::Portfolio).is_none());
    }
}
