use chrono::{DateTime, Utc};
use core_types::Sanitize;
use serde::{Deserialize, Serialize};

/// Wealth of one unit invested at the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Performance of a return stream.
///
/// Returns and volatility are annualized with 252 periods per year. The
/// default value is the all-zero report substituted when the stage fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    // I. Profitability
    pub total_return: f64,
    pub annualized_return: f64,

    // II. Risk and drawdown
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a fraction of the peak. Always <= 0.
    pub max_drawdown: f64,
    pub calmar_ratio: Option<f64>, // None when there is no drawdown

    // III. Period statistics
    pub total_periods: usize,
    /// Fraction of periods with a strictly positive return.
    pub win_rate: f64,
    pub best_period: f64,
    pub worst_period: f64,

    pub equity_curve: Vec<EquityPoint>,
}

impl Sanitize for BacktestReport {
    fn sanitize(&mut self) {
        self.total_return.sanitize();
        self.annualized_return.sanitize();
        self.volatility.sanitize();
        self.sharpe_ratio.sanitize();
        self.max_drawdown.sanitize();
        self.calmar_ratio.sanitize();
        self.win_rate.sanitize();
        self.best_period.sanitize();
        self.worst_period.sanitize();
        for point in &mut self.equity_curve {
            point.equity.sanitize();
        }
    }
}
