use crate::error::AnalyticsError;
use crate::report::{BacktestReport, EquityPoint};
use chrono::{DateTime, Utc};
use core_types::stats::{mean, std_dev};
use core_types::{CoreError, TRADING_DAYS_PER_YEAR};

/// A stateless calculator for deriving performance metrics from a return stream.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `timestamps` - One timestamp per return, used to label the equity curve.
    /// * `returns` - Simple per-period returns.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `BacktestReport` or an `AnalyticsError`.
    pub fn calculate(
        &self,
        timestamps: &[DateTime<Utc>],
        returns: &[f64],
    ) -> Result<BacktestReport, AnalyticsError> {
        if returns.is_empty() {
            return Err(CoreError::DataUnavailable("empty return stream".to_string()).into());
        }
        if timestamps.len() != returns.len() {
            return Err(AnalyticsError::LengthMismatch {
                returns: returns.len(),
                timestamps: timestamps.len(),
            });
        }

        let mut report = BacktestReport {
            total_periods: returns.len(),
            ..BacktestReport::default()
        };

        self.calculate_profitability(timestamps, returns, &mut report);
        self.calculate_drawdown(&mut report);
        self.calculate_ratios(returns, &mut report);
        self.calculate_period_stats(returns, &mut report);

        tracing::debug!(
            total_return = report.total_return,
            sharpe = report.sharpe_ratio,
            max_drawdown = report.max_drawdown,
            "Backtest metrics calculated."
        );
        Ok(report)
    }

    /// Equity curve, total and annualized return.
    fn calculate_profitability(
        &self,
        timestamps: &[DateTime<Utc>],
        returns: &[f64],
        report: &mut BacktestReport,
    ) {
        let mut wealth = 1.0;
        report.equity_curve = timestamps
            .iter()
            .zip(returns)
            .map(|(timestamp, r)| {
                wealth *= 1.0 + r;
                EquityPoint {
                    timestamp: *timestamp,
                    equity: wealth,
                }
            })
            .collect();

        report.total_return = wealth - 1.0;
        report.annualized_return = if wealth > 0.0 {
            wealth.powf(TRADING_DAYS_PER_YEAR / returns.len() as f64) - 1.0
        } else {
            // Wiped out: a fractional power of a non-positive wealth is undefined.
            -1.0
        };
    }

    /// Maximum drawdown relative to the running peak of the equity curve.
    fn calculate_drawdown(&self, report: &mut BacktestReport) {
        let Some(first) = report.equity_curve.first() else {
            return;
        };
        let mut peak = first.equity;
        let mut max_drawdown: f64 = 0.0;

        for point in &report.equity_curve {
            peak = peak.max(point.equity);
            if peak > 0.0 {
                max_drawdown = max_drawdown.min((point.equity - peak) / peak);
            }
        }
        report.max_drawdown = max_drawdown;
    }

    /// Volatility, Sharpe and Calmar ratios.
    fn calculate_ratios(&self, returns: &[f64], report: &mut BacktestReport) {
        let m = mean(returns).unwrap_or(0.0);
        let sd = std_dev(returns).unwrap_or(0.0);
        // Rounding noise on a constant stream is not volatility.
        let sd = if sd > f64::EPSILON * m.abs().max(1.0) { sd } else { 0.0 };
        report.volatility = sd * TRADING_DAYS_PER_YEAR.sqrt();

        report.sharpe_ratio = if report.volatility > 0.0 {
            report.annualized_return / report.volatility
        } else {
            if report.annualized_return != 0.0 {
                tracing::warn!("Return stream has no volatility; Sharpe ratio defaults to 0.");
            }
            0.0
        };

        if report.max_drawdown < 0.0 {
            report.calmar_ratio = Some(report.annualized_return / report.max_drawdown.abs());
        }
    }

    fn calculate_period_stats(&self, returns: &[f64], report: &mut BacktestReport) {
        let wins = returns.iter().filter(|r| **r > 0.0).count();
        report.win_rate = wins as f64 / returns.len() as f64;
        report.best_period = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        report.worst_period = returns.iter().copied().fold(f64::INFINITY, f64::min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn calculate(returns: &[f64]) -> BacktestReport {
        AnalyticsEngine::new()
            .calculate(&timestamps(returns.len()), returns)
            .unwrap()
    }

    #[test]
    fn all_zero_returns() {
        let report = calculate(&[0.0; 100]);
        assert_eq!(report.total_return, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.calmar_ratio, None);
        assert_eq!(report.total_periods, 100);
    }

    #[test]
    fn constant_positive_returns_default_the_sharpe() {
        let report = calculate(&[0.001; 252]);
        assert_eq!(report.volatility, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.win_rate, 1.0);
        assert_relative_eq!(report.annualized_return, 1.001f64.powi(252) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_from_running_peak() {
        let report = calculate(&[0.10, -0.20, 0.05, 0.10]);
        // Equity 1.1, 0.88, 0.924, 1.0164; peak 1.1.
        assert_relative_eq!(report.max_drawdown, -0.2, epsilon = 1e-12);
        assert_relative_eq!(report.total_return, 0.0164, epsilon = 1e-12);
        assert_relative_eq!(report.equity_curve[1].equity, 0.88, epsilon = 1e-12);
        assert_relative_eq!(
            report.calmar_ratio.unwrap(),
            report.annualized_return / 0.2,
            epsilon = 1e-12
        );
        assert_eq!(report.best_period, 0.10);
        assert_eq!(report.worst_period, -0.20);
        assert_relative_eq!(report.win_rate, 0.75);
    }

    #[test]
    fn wipeout_annualizes_to_minus_one() {
        let report = calculate(&[0.05, -1.5, 0.1]);
        assert_eq!(report.annualized_return, -1.0);
        assert!(report.total_return < -1.0);
    }

    #[test]
    fn empty_stream_is_unavailable() {
        let err = AnalyticsEngine::new().calculate(&[], &[]).unwrap_err();
        assert!(matches!(err, AnalyticsError::Core(CoreError::DataUnavailable(_))));
    }

    #[test]
    fn mismatched_timestamps_are_rejected() {
        let err = AnalyticsEngine::new()
            .calculate(&timestamps(2), &[0.01, 0.02, 0.03])
            .unwrap_err();
        assert_eq!(err, AnalyticsError::LengthMismatch { returns: 3, timestamps: 2 });
    }

    proptest! {
        #[test]
        fn metrics_stay_in_range(returns in prop::collection::vec(-0.5f64..0.5, 1..200)) {
            let report = calculate(&returns);
            prop_assert!(report.max_drawdown <= 0.0);
            prop_assert!(report.max_drawdown >= -1.0);
            prop_assert!((0.0..=1.0).contains(&report.win_rate));
            prop_assert!(report.volatility >= 0.0);
            prop_assert!(report.annualized_return >= -1.0);
            prop_assert_eq!(report.equity_curve.len(), returns.len());
        }
    }
}
