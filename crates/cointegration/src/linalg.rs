//! Small least-squares helpers shared by the Johansen and Engle-Granger tests.

use crate::error::CointegrationError;
use nalgebra::{DMatrix, DVector};

/// Smallest admissible ratio between the extreme singular values of a design
/// matrix. Anything below is treated as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// An ordinary least squares fit of `y` on the columns of `x`.
#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// `(X'X)^-1`, the unscaled parameter covariance.
    pub xtx_inv: DMatrix<f64>,
}

impl OlsFit {
    pub fn nobs(&self) -> usize {
        self.residuals.len()
    }

    /// t-statistic of the parameter at `index`, using the unbiased residual variance.
    pub fn t_value(&self, index: usize) -> f64 {
        let dof = self.nobs() - self.params.len();
        let sigma2 = self.ssr / dof as f64;
        self.params[index] / (sigma2 * self.xtx_inv[(index, index)]).sqrt()
    }

    /// Gaussian log-likelihood at the ML variance estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs() as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every regressor as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }
}

/// Fits `y = X b + e` by singular value decomposition.
///
/// A rank-deficient design is reported as `Singular` rather than silently
/// solved in the minimum-norm sense.
pub(crate) fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, CointegrationError> {
    let (n, k) = x.shape();
    if n <= k {
        return Err(CointegrationError::InsufficientData { needed: k + 1, got: n });
    }

    let svd = x.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    if !(s_max > 0.0) || !s_min.is_finite() || s_min <= s_max * RANK_TOLERANCE {
        return Err(CointegrationError::Singular(format!(
            "design matrix of {} columns is rank deficient",
            k
        )));
    }

    let params = svd
        .solve(y, 0.0)
        .map_err(|e| CointegrationError::Singular(e.to_string()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| CointegrationError::Singular("SVD did not produce V".to_string()))?;
    let inv_sq = DMatrix::from_diagonal(&svd.singular_values.map(|s| 1.0 / (s * s)));
    let xtx_inv = v_t.transpose() * inv_sq * v_t;

    let residuals = y - x * &params;
    let ssr = residuals.norm_squared();

    Ok(OlsFit {
        params,
        residuals,
        ssr,
        xtx_inv,
    })
}

/// Residuals of regressing every column of `y` on `z` (the pseudo-inverse
/// projection). An empty `z` leaves `y` unchanged.
pub(crate) fn residualize(y: &DMatrix<f64>, z: &DMatrix<f64>) -> Result<DMatrix<f64>, CointegrationError> {
    if z.ncols() == 0 {
        return Ok(y.clone());
    }
    let svd = z.clone().svd(true, true);
    let eps = svd.singular_values.max() * z.nrows().max(z.ncols()) as f64 * f64::EPSILON;
    let coefficients = svd
        .solve(y, eps)
        .map_err(|e| CointegrationError::Singular(e.to_string()))?;
    Ok(y - z * coefficients)
}

/// Subtracts each column's mean.
pub(crate) fn demean(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    let rows = m.nrows() as f64;
    for mut column in out.column_iter_mut() {
        let mean = column.sum() / rows;
        column.add_scalar_mut(-mean);
    }
    out
}

/// Rejects symmetric matrices that are not safely positive definite.
pub(crate) fn ensure_well_conditioned(m: &DMatrix<f64>, name: &str) -> Result<(), CointegrationError> {
    const CONDITION_TOLERANCE: f64 = 1e-12;

    let eigenvalues = m.symmetric_eigenvalues();
    let max = eigenvalues.max();
    let min = eigenvalues.min();
    if !(max > 0.0) || !min.is_finite() || min <= max * CONDITION_TOLERANCE {
        return Err(CointegrationError::Singular(format!(
            "{} is not positive definite",
            name
        )));
    }
    Ok(())
}
