//! Descriptive statistics shared by every analysis stage.
//!
//! Variances and standard deviations are sample estimates (n - 1 denominator).

use crate::error::CoreError;

/// Annualization factor for daily observations.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance. `None` with fewer than two observations.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Sample covariance of two equally long series.
pub fn covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (a.len() - 1) as f64)
}

/// Pearson correlation. `None` when either series has zero variance.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let cov = covariance(a, b)?;
    let sd_a = std_dev(a)?;
    let sd_b = std_dev(b)?;
    if sd_a == 0.0 || sd_b == 0.0 {
        return None;
    }
    let corr = cov / (sd_a * sd_b);
    corr.is_finite().then_some(corr.clamp(-1.0, 1.0))
}

/// Annualized Sharpe ratio of a daily return stream: mean / std * sqrt(252).
///
/// A stream with fewer than two observations or zero volatility has no defined
/// Sharpe ratio and yields `CoreError::DegenerateStatistics`.
pub fn annualized_sharpe(returns: &[f64], label: &str) -> Result<f64, CoreError> {
    let m = mean(returns).ok_or_else(|| CoreError::DegenerateStatistics(label.to_string()))?;
    let sd = std_dev(returns).ok_or_else(|| CoreError::DegenerateStatistics(label.to_string()))?;
    if !(sd > f64::EPSILON * m.abs().max(1.0)) {
        return Err(CoreError::DegenerateStatistics(label.to_string()));
    }
    let sharpe = m / sd * TRADING_DAYS_PER_YEAR.sqrt();
    if sharpe.is_finite() {
        Ok(sharpe)
    } else {
        Err(CoreError::DegenerateStatistics(label.to_string()))
    }
}

/// Like [`annualized_sharpe`], but resolves the degenerate case to the
/// documented default of 0 and logs it.
pub fn sharpe_or_default(returns: &[f64], label: &str) -> f64 {
    match annualized_sharpe(returns, label) {
        Ok(sharpe) => sharpe,
        Err(e) => {
            tracing::warn!(stream = label, error = %e, "Sharpe ratio undefined, defaulting to 0.");
            0.0
        }
    }
}

/// Percentile rank of each value within the slice, in (0, 1].
///
/// Ties receive their average rank. Non-finite values are excluded from the
/// ranking and get `None`; the denominator is the count of finite values.
pub fn percentile_ranks(values: &[f64]) -> Vec<Option<f64>> {
    let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let count = valid.len() as f64;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return None;
            }
            let below = valid.iter().filter(|&&o| o < v).count() as f64;
            let equal = valid.iter().filter(|&&o| o == v).count() as f64;
            let rank = below + (equal + 1.0) / 2.0;
            Some(rank / count)
        })
        .collect()
}

/// Replaces NaN and infinities with zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Normalizes every floating value of a result so that nothing non-finite
/// crosses the boundary of the engine.
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for f64 {
    fn sanitize(&mut self) {
        *self = finite_or_zero(*self);
    }
}

impl Sanitize for Option<f64> {
    fn sanitize(&mut self) {
        if matches!(self, Some(v) if !v.is_finite()) {
            *self = None;
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&mut self) {
        self.iter_mut().for_each(Sanitize::sanitize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sample_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(variance(&values).unwrap(), 32.0 / 7.0, epsilon = 1e-12);
        assert!(variance(&[1.0]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn correlation_of_linear_series_is_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(correlation(&a, &b).unwrap(), 1.0, epsilon = 1e-12);
        assert!(correlation(&a, &[1.0, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn sharpe_of_constant_returns_is_degenerate() {
        let returns = vec![0.01; 50];
        let err = annualized_sharpe(&returns, "constant").unwrap_err();
        assert_eq!(err, CoreError::DegenerateStatistics("constant".to_string()));
        assert_eq!(sharpe_or_default(&returns, "constant"), 0.0);
    }

    #[test]
    fn sharpe_is_annualized() {
        let returns = [0.01, -0.005, 0.02, 0.0];
        let expected = mean(&returns).unwrap() / std_dev(&returns).unwrap() * 252f64.sqrt();
        assert_relative_eq!(annualized_sharpe(&returns, "x").unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn percentile_ranks_average_ties() {
        let ranks = percentile_ranks(&[3.0, 1.0, 3.0, 2.0]);
        assert_eq!(ranks, vec![Some(0.875), Some(0.25), Some(0.875), Some(0.5)]);

        let with_nan = percentile_ranks(&[f64::NAN, 1.0, 2.0]);
        assert_eq!(with_nan, vec![None, Some(0.5), Some(1.0)]);
    }

    #[test]
    fn sanitize_replaces_non_finite_values() {
        let mut values = vec![1.0, f64::NAN, f64::INFINITY];
        values.sanitize();
        assert_eq!(values, vec![1.0, 0.0, 0.0]);

        let mut optional = Some(f64::NEG_INFINITY);
        optional.sanitize();
        assert_eq!(optional, None);
    }
}
