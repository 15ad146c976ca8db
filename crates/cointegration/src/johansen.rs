//! Johansen trace test with an unrestricted constant.
//!
//! The VECM `dx_t = Pi x_{t-p} + sum_i G_i dx_{t-i} + c + e_t` is concentrated
//! by regressing both `dx_t` and `x_{t-p}` on the lagged differences. The
//! eigenvalues of `S_kk^-1 S_k0 S_00^-1 S_0k` give the trace statistics
//! `-T * sum_{j >= r} ln(1 - lambda_j)` for each hypothesized rank `r`.

use crate::error::CointegrationError;
use crate::linalg::{demean, ensure_well_conditioned, residualize};
use core_types::CoreError;
use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// Number of variables covered by the critical value table.
pub const MAX_JOHANSEN_ASSETS: usize = 12;

/// Trace test critical values at 90%, 95% and 99% with a constant term,
/// indexed by the number of variables in the system minus one
/// (Osterwald-Lenum).
const TRACE_CRITICAL_VALUES: [[f64; 3]; MAX_JOHANSEN_ASSETS] = [
    [2.7055, 3.8415, 6.6349],
    [13.4294, 15.4943, 19.9349],
    [27.0669, 29.7961, 35.4628],
    [44.4929, 47.8545, 54.6815],
    [65.8202, 69.8189, 77.8202],
    [91.1090, 95.7542, 104.9637],
    [120.3673, 125.6185, 135.9825],
    [153.6341, 159.5290, 171.0905],
    [190.8714, 197.3772, 210.0366],
    [232.1030, 239.2468, 253.2526],
    [277.3740, 285.1402, 300.2821],
    [326.5354, 334.9795, 351.2150],
];

/// 95% trace critical value for a system of `n_vars` variables.
pub fn critical_value_95(n_vars: usize) -> Option<f64> {
    if n_vars == 0 {
        return None;
    }
    TRACE_CRITICAL_VALUES.get(n_vars - 1).map(|row| row[1])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JohansenOutput {
    /// Eigenvalues in descending order.
    pub eigenvalues: Vec<f64>,
    /// Trace statistic for each null hypothesis `rank <= r`.
    pub trace_statistics: Vec<f64>,
    /// 95% critical value matching each entry of `trace_statistics`.
    pub critical_values_95: Vec<f64>,
    /// Number of leading hypotheses rejected at 95%.
    pub rank: usize,
    /// Rows used after differencing and lagging.
    pub observations: usize,
}

impl JohansenOutput {
    /// Trace statistic against the null of no cointegration.
    pub fn trace_statistic(&self) -> f64 {
        self.trace_statistics[0]
    }

    pub fn critical_value(&self) -> f64 {
        self.critical_values_95[0]
    }

    /// True when the null of no cointegration is rejected at 95%.
    pub fn is_cointegrated(&self) -> bool {
        self.trace_statistic() > self.critical_value()
    }
}

/// Minimum number of rows for a system of `n_vars` variables with `lag_order`
/// lagged differences.
pub fn min_observations(n_vars: usize, lag_order: usize) -> usize {
    n_vars * (lag_order + 1) + lag_order + 3
}

/// Runs the trace test on a `T x N` matrix of levels (one column per asset).
pub fn johansen_trace(levels: &DMatrix<f64>, lag_order: usize) -> Result<JohansenOutput, CointegrationError> {
    let (t, n) = levels.shape();
    if n < 2 {
        return Err(CoreError::InvalidInput(
            "levels".to_string(),
            format!("the trace test needs at least 2 series, got {}", n),
        )
        .into());
    }
    if n > MAX_JOHANSEN_ASSETS {
        return Err(CointegrationError::TooManyAssets {
            max: MAX_JOHANSEN_ASSETS,
            got: n,
        });
    }
    let needed = min_observations(n, lag_order);
    if t < needed {
        return Err(CointegrationError::InsufficientData { needed, got: t });
    }

    // Row `r` of every block corresponds to time `t = r + lag_order + 1`.
    let rows = t - lag_order - 1;
    let delta = |time: usize, col: usize| levels[(time, col)] - levels[(time - 1, col)];

    let r0 = DMatrix::from_fn(rows, n, |r, c| delta(r + lag_order + 1, c));
    let lagged = DMatrix::from_fn(rows, n * lag_order, |r, c| {
        let lag = c / n + 1;
        delta(r + lag_order + 1 - lag, c % n)
    });
    let level = DMatrix::from_fn(rows, n, |r, c| levels[(r + 1, c)]);

    let lagged = demean(&lagged);
    let r0 = residualize(&demean(&r0), &lagged)?;
    let rk = residualize(&demean(&level), &lagged)?;

    let scale = rows as f64;
    let s00 = r0.transpose() * &r0 / scale;
    let sk0 = rk.transpose() * &r0 / scale;
    let skk = rk.transpose() * &rk / scale;

    ensure_well_conditioned(&s00, "S00")?;
    ensure_well_conditioned(&skk, "Skk")?;

    let s00_inv = s00
        .try_inverse()
        .ok_or_else(|| CointegrationError::Singular("S00 is not invertible".to_string()))?;
    let sig = &sk0 * s00_inv * sk0.transpose();

    // Reduce the generalized problem sig v = lambda Skk v to a symmetric one.
    let chol = skk
        .cholesky()
        .ok_or_else(|| CointegrationError::Singular("Skk is not positive definite".to_string()))?;
    let l = chol.l();
    let a = l
        .solve_lower_triangular(&sig)
        .ok_or_else(|| CointegrationError::Singular("triangular solve failed".to_string()))?;
    let m = l
        .solve_lower_triangular(&a.transpose())
        .ok_or_else(|| CointegrationError::Singular("triangular solve failed".to_string()))?;
    let m = (&m + m.transpose()) * 0.5;

    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(m).eigenvalues.iter().copied().collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));

    for lambda in eigenvalues.iter_mut() {
        if !lambda.is_finite() || *lambda >= 1.0 {
            return Err(CointegrationError::Singular(format!(
                "eigenvalue {} outside [0, 1)",
                lambda
            )));
        }
        *lambda = lambda.max(0.0);
    }

    let log_terms: Vec<f64> = eigenvalues.iter().map(|l| (1.0 - l).ln()).collect();
    let trace_statistics: Vec<f64> = (0..n)
        .map(|r| -scale * log_terms[r..].iter().sum::<f64>())
        .collect();
    let critical_values_95: Vec<f64> = (0..n)
        .map(|r| TRACE_CRITICAL_VALUES[n - r - 1][1])
        .collect();
    let rank = trace_statistics
        .iter()
        .zip(&critical_values_95)
        .take_while(|(stat, cv)| stat > cv)
        .count();

    Ok(JohansenOutput {
        eigenvalues,
        trace_statistics,
        critical_values_95,
        rank,
        observations: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_walks(t: usize, n: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut m = DMatrix::zeros(t, n);
        for c in 0..n {
            let mut level = 0.0;
            for r in 0..t {
                level += rng.gen_range(-1.0..1.0);
                m[(r, c)] = level;
            }
        }
        m
    }

    #[test]
    fn critical_values_follow_the_table() {
        assert_eq!(critical_value_95(2), Some(15.4943));
        assert_eq!(critical_value_95(12), Some(334.9795));
        assert_eq!(critical_value_95(13), None);
        assert_eq!(critical_value_95(0), None);
    }

    #[test]
    fn stationary_spread_is_detected() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let t = 400;
        let mut m = DMatrix::zeros(t, 2);
        let mut common = 0.0;
        for r in 0..t {
            common += rng.gen_range(-1.0..1.0);
            m[(r, 0)] = common + rng.gen_range(-0.3..0.3);
            m[(r, 1)] = 0.5 * common + rng.gen_range(-0.3..0.3);
        }
        let out = johansen_trace(&m, 1).unwrap();

        assert!(out.is_cointegrated(), "trace {:?}", out.trace_statistics);
        assert!(out.rank >= 1);
        assert_eq!(out.observations, t - 2);
        assert!(out.eigenvalues[0] >= out.eigenvalues[1]);
    }

    #[test]
    fn trace_statistics_decrease_with_rank() {
        let m = random_walks(300, 3, 11);
        let out = johansen_trace(&m, 1).unwrap();
        assert_eq!(out.trace_statistics.len(), 3);
        assert!(out.trace_statistics.windows(2).all(|w| w[0] >= w[1]));
        assert!(out.eigenvalues.iter().all(|l| (0.0..1.0).contains(l)));
        assert_relative_eq!(out.critical_values_95[2], 3.8415);
    }

    #[test]
    fn exact_multiple_is_singular() {
        let mut m = random_walks(200, 2, 3);
        for r in 0..200 {
            m[(r, 1)] = 2.0 * m[(r, 0)];
        }
        assert!(matches!(johansen_trace(&m, 1), Err(CointegrationError::Singular(_))));
    }

    #[test]
    fn short_sample_is_rejected() {
        let m = random_walks(5, 2, 1);
        assert!(matches!(
            johansen_trace(&m, 1),
            Err(CointegrationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn oversized_universe_is_rejected() {
        let m = random_walks(100, 13, 1);
        assert!(matches!(
            johansen_trace(&m, 1),
            Err(CointegrationError::TooManyAssets { max: 12, got: 13 })
        ));
    }
}
