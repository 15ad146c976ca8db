use crate::error::ArbitrageError;
use core_types::stats::{covariance, mean, std_dev, variance};
use core_types::{CoreError, SpreadDirection};
use serde::{Deserialize, Serialize};

/// Position of the latest spread value within the spread's own distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadSignal {
    pub mean: f64,
    pub std_dev: f64,
    pub current: f64,
    /// `None` when the spread has no dispersion.
    pub z_score: Option<f64>,
    /// Set only when `|z| > entry_z`.
    pub direction: Option<SpreadDirection>,
}

impl SpreadSignal {
    pub fn is_active(&self) -> bool {
        self.direction.is_some()
    }

    /// Distance back to the mean in spread units: `|z| * std`.
    pub fn expected_profit(&self) -> f64 {
        self.z_score.map_or(0.0, |z| z.abs() * self.std_dev)
    }
}

/// Static hedge ratio of `first` on `second`: `Cov(p1, p2) / Var(p2)`.
///
/// Both moments use the `n - 1` divisor, so this is the OLS slope. Pairing a
/// sample covariance with a population variance would scale it by `n / (n - 1)`.
pub fn hedge_ratio(first: &[f64], second: &[f64]) -> Result<f64, ArbitrageError> {
    let cov = covariance(first, second)
        .ok_or_else(|| CoreError::DataUnavailable("too few prices for a hedge ratio".to_string()))?;
    let var = variance(second).unwrap_or(0.0);
    if var <= 0.0 {
        return Err(CoreError::DegenerateStatistics("hedge leg prices".to_string()).into());
    }
    Ok(cov / var)
}

/// `p1 - slope * p2` at every row.
pub fn spread(first: &[f64], second: &[f64], slope: f64) -> Vec<f64> {
    first.iter().zip(second).map(|(a, b)| a - slope * b).collect()
}

/// Scores the last value of a spread series against the whole series.
///
/// A z-score below `-entry_z` means the spread is cheap (LONG), above
/// `entry_z` rich (SHORT). The threshold itself is not a signal.
pub fn evaluate_spread(spread: &[f64], entry_z: f64) -> Result<SpreadSignal, ArbitrageError> {
    let (Some(&current), Some(m), Some(sd)) = (spread.last(), mean(spread), std_dev(spread)) else {
        return Err(CoreError::DataUnavailable(format!(
            "{} spread values are not enough to score",
            spread.len()
        ))
        .into());
    };

    let z_score = (sd > 0.0)
        .then(|| (current - m) / sd)
        .filter(|z| z.is_finite());
    let direction = match z_score {
        Some(z) if z < -entry_z => Some(SpreadDirection::Long),
        Some(z) if z > entry_z => Some(SpreadDirection::Short),
        _ => None,
    };

    Ok(SpreadSignal {
        mean: m,
        std_dev: sd,
        current,
        z_score,
        direction,
    })
}
