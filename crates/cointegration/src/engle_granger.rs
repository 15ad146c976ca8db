//! Engle-Granger two-step test for a pair of log-price series.

use crate::error::CointegrationError;
use crate::linalg::ols;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

/// MacKinnon (1994) response surface for the tau statistic with a constant:
/// `(tau_max, tau_min, tau_star, small_p, large_p)` per number of variables.
struct TauSurface {
    max: f64,
    min: f64,
    star: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
}

const TAU_SURFACES: [TauSurface; 2] = [
    // Single series (plain ADF).
    TauSurface {
        max: 2.74,
        min: -18.83,
        star: -1.61,
        small_p: [2.1659, 1.4412, 0.038269],
        large_p: [1.7339, 0.93202, -0.12745, -0.010368],
    },
    // Residuals of a two-variable cointegrating regression.
    TauSurface {
        max: 0.92,
        min: -18.86,
        star: -2.62,
        small_p: [2.92, 1.5012, 0.039796],
        large_p: [2.1945, 0.64695, -0.29198, -0.042377],
    },
];

fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Approximate asymptotic p-value of a tau statistic for `n_vars` variables
/// (1 or 2) in a regression with a constant.
pub fn mackinnon_p_value(tau: f64, n_vars: usize) -> f64 {
    let surface = &TAU_SURFACES[n_vars.clamp(1, 2) - 1];
    if tau.is_nan() {
        return 1.0;
    }
    if tau > surface.max {
        return 1.0;
    }
    if tau < surface.min {
        return 0.0;
    }
    let poly = if tau <= surface.star {
        let c = surface.small_p;
        c[0] + c[1] * tau + c[2] * tau * tau
    } else {
        let c = surface.large_p;
        c[0] + c[1] * tau + c[2] * tau * tau + c[3] * tau * tau * tau
    };
    standard_normal_cdf(poly)
}

/// An augmented Dickey-Fuller regression without deterministic terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    /// Number of lagged differences chosen by AIC.
    pub used_lag: usize,
    pub nobs: usize,
}

/// Default upper bound on ADF lags for a series of `n` observations
/// (Schwert's rule, capped so that the regression keeps residual degrees of freedom).
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Builds the ADF design for `lags` lagged differences, dropping the first
/// `skip` usable rows so that designs of different depth share a sample.
fn adf_design(x: &[f64], lags: usize, skip: usize) -> (DMatrix<f64>, DVector<f64>) {
    let diffs: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let start = skip.max(lags);
    let nobs = diffs.len() - start;
    let design = DMatrix::from_fn(nobs, lags + 1, |r, c| {
        let j = r + start;
        if c == 0 { x[j] } else { diffs[j - c] }
    });
    let target = DVector::from_fn(nobs, |r, _| diffs[r + start]);
    (design, target)
}

/// ADF test with AIC lag selection over `0..=max_lag` lagged differences.
///
/// Candidate lags are compared on the common sample of the deepest design;
/// the chosen lag is then refitted on its full sample.
pub fn adf_no_constant(x: &[f64], max_lag: usize) -> Result<AdfResult, CointegrationError> {
    let needed = 2 * max_lag + 3;
    if x.len() < needed {
        return Err(CointegrationError::InsufficientData { needed, got: x.len() });
    }

    let mut best: Option<(f64, usize)> = None;
    for lags in 0..=max_lag {
        let (design, target) = adf_design(x, lags, max_lag);
        let fit = ols(&design, &target)?;
        let aic = fit.aic();
        if best.is_none_or(|(best_aic, _)| aic < best_aic) {
            best = Some((aic, lags));
        }
    }
    let used_lag = best.map(|(_, lags)| lags).unwrap_or(0);

    let (design, target) = adf_design(x, used_lag, used_lag);
    let fit = ols(&design, &target)?;
    Ok(AdfResult {
        statistic: fit.t_value(0),
        used_lag,
        nobs: fit.nobs(),
    })
}

/// Outcome of the Engle-Granger test for one unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairTest {
    pub first: String,
    pub second: String,
    /// `None` when the pair is perfectly collinear and no ADF regression ran.
    pub adf_statistic: Option<f64>,
    pub p_value: f64,
    /// Slope of the cointegrating regression of `first` on `second`.
    pub hedge_ratio: f64,
    pub used_lag: usize,
    pub cointegrated: bool,
}

/// Collinearity threshold on R², mirroring the usual `1 - 100 * sqrt(eps)`.
fn collinearity_threshold() -> f64 {
    1.0 - 100.0 * f64::EPSILON.sqrt()
}

/// Result of regressing one series on another and testing the residuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngleGranger {
    pub adf_statistic: Option<f64>,
    pub p_value: f64,
    pub hedge_ratio: f64,
    pub used_lag: usize,
}

/// Regresses `y` on a constant and `x`, then tests the residuals for a unit root.
pub fn engle_granger(y: &[f64], x: &[f64]) -> Result<EngleGranger, CointegrationError> {
    if y.len() != x.len() {
        return Err(core_types::CoreError::InvalidInput(
            "pair".to_string(),
            format!("series lengths differ: {} vs {}", y.len(), x.len()),
        )
        .into());
    }
    let n = y.len();
    let design = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { x[r] });
    let target = DVector::from_column_slice(y);
    let fit = ols(&design, &target)?;
    let hedge_ratio = fit.params[1];

    let y_mean = target.mean();
    let tss: f64 = target.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - fit.ssr / tss } else { 0.0 };
    if r_squared >= collinearity_threshold() {
        return Ok(EngleGranger {
            adf_statistic: None,
            p_value: 0.0,
            hedge_ratio,
            used_lag: 0,
        });
    }

    let residuals: Vec<f64> = fit.residuals.iter().copied().collect();
    let adf = adf_no_constant(&residuals, default_max_lag(n))?;
    Ok(EngleGranger {
        adf_statistic: Some(adf.statistic),
        p_value: mackinnon_p_value(adf.statistic, 2),
        hedge_ratio,
        used_lag: adf.used_lag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn p_value_surface_is_monotone_and_bounded() {
        assert_eq!(mackinnon_p_value(1.0, 2), 1.0);
        assert_eq!(mackinnon_p_value(-20.0, 2), 0.0);
        assert_eq!(mackinnon_p_value(f64::NEG_INFINITY, 2), 0.0);

        let mut previous = 0.0;
        for i in 0..200 {
            let tau = -18.0 + i as f64 * 0.09;
            let p = mackinnon_p_value(tau, 2);
            assert!((0.0..=1.0).contains(&p));
            assert!(p + 1e-3 >= previous, "not monotone at {}", tau);
            previous = p;
        }
    }

    #[test]
    fn five_percent_critical_value_of_a_pair() {
        // The asymptotic 5% critical value for two variables is about -3.34.
        assert_relative_eq!(mackinnon_p_value(-3.34, 2), 0.05, epsilon = 0.005);
        // And about -2.86 for a single series.
        assert_relative_eq!(mackinnon_p_value(-2.86, 1), 0.05, epsilon = 0.005);
    }

    #[test]
    fn schwert_lag_rule() {
        assert_eq!(default_max_lag(100), 12);
        assert_eq!(default_max_lag(300), 16);
        assert_eq!(default_max_lag(10), 3);
    }

    #[test]
    fn white_noise_has_no_unit_root() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let x: Vec<f64> = (0..300).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let adf = adf_no_constant(&x, default_max_lag(300)).unwrap();
        assert!(adf.statistic < -3.0, "statistic {}", adf.statistic);
        assert!(adf.used_lag <= 16);
    }

    #[test]
    fn cointegrated_pair_has_small_p_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut walk = 0.0;
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..300 {
            walk += rng.gen_range(-1.0..1.0);
            x.push(walk);
            y.push(1.5 * walk + 3.0 + rng.gen_range(-0.5..0.5));
        }
        let eg = engle_granger(&y, &x).unwrap();
        assert!(eg.adf_statistic.is_some());
        assert!(eg.p_value < 0.01, "p = {}", eg.p_value);
        assert_relative_eq!(eg.hedge_ratio, 1.5, epsilon = 0.05);
    }

    #[test]
    fn collinear_pair_short_circuits() {
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin() + i as f64 * 0.01).collect();
        let y: Vec<f64> = x.iter().map(|v| v + 2f64.ln()).collect();
        let eg = engle_granger(&y, &x).unwrap();
        assert_eq!(eg.adf_statistic, None);
        assert_eq!(eg.p_value, 0.0);
        assert_eq!(eg.used_lag, 0);
        assert_relative_eq!(eg.hedge_ratio, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_regressor_is_singular() {
        let x = vec![1.0; 50];
        let y: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert!(matches!(engle_granger(&y, &x), Err(CointegrationError::Singular(_))));
    }
}
