//! # Portfolio Optimizer
//!
//! Long-only, fully invested maximum-Sharpe allocation over the assets of a
//! price panel.
//!
//! The problem `max w'mu / sqrt(w'Sigma w)` subject to `sum w = 1` and
//! `0 <= w <= 1` is solved by projected gradient ascent on the probability
//! simplex with Armijo backtracking, starting from equal weights.

use configuration::PortfolioParams;
use core_types::stats::{covariance, mean};
use core_types::{CoreError, PricePanel, Sanitize, TRADING_DAYS_PER_YEAR};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod simplex;

pub use error::OptimizerError;
pub use simplex::project_to_simplex;

/// Sufficient-increase constant of the Armijo rule.
const ARMIJO_C: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWeight {
    pub symbol: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    /// One entry per panel asset, in panel order.
    pub weights: Vec<AssetWeight>,
    /// Annualized expected return.
    pub expected_return: f64,
    /// Annualized volatility.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub converged: bool,
    pub iterations: usize,
}

impl PortfolioAllocation {
    pub fn weight_of(&self, symbol: &str) -> Option<f64> {
        self.weights.iter().find(|w| w.symbol == symbol).map(|w| w.weight)
    }
}

impl Sanitize for PortfolioAllocation {
    fn sanitize(&mut self) {
        for w in &mut self.weights {
            w.weight.sanitize();
        }
        self.expected_return.sanitize();
        self.volatility.sanitize();
        self.sharpe_ratio.sanitize();
    }
}

/// Annualized moments of the asset returns.
struct Moments {
    mu: DVector<f64>,
    sigma: DMatrix<f64>,
}

impl Moments {
    fn from_panel(panel: &PricePanel) -> Result<Self, OptimizerError> {
        let returns = panel.returns();
        if returns.len() < 2 {
            return Err(CoreError::DataUnavailable(format!(
                "{} return rows are not enough to estimate a covariance matrix",
                returns.len()
            ))
            .into());
        }
        let columns = returns.columns();
        let n = columns.len();

        let mut mu = DVector::zeros(n);
        let mut sigma = DMatrix::zeros(n, n);
        for i in 0..n {
            mu[i] = mean(&columns[i]).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR;
            for j in i..n {
                let cov = covariance(&columns[i], &columns[j]).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR;
                sigma[(i, j)] = cov;
                sigma[(j, i)] = cov;
            }
        }
        Ok(Self { mu, sigma })
    }

    fn expected_return(&self, w: &DVector<f64>) -> f64 {
        w.dot(&self.mu)
    }

    fn volatility(&self, w: &DVector<f64>) -> f64 {
        w.dot(&(&self.sigma * w)).max(0.0).sqrt()
    }

    /// Sharpe ratio, or `None` where the portfolio has no variance.
    fn sharpe(&self, w: &DVector<f64>) -> Option<f64> {
        let vol = self.volatility(w);
        let sharpe = self.expected_return(w) / vol;
        (vol > 0.0 && sharpe.is_finite()).then_some(sharpe)
    }

    /// `grad f = mu / s - (w'mu) Sigma w / s^3` with `s = sqrt(w'Sigma w)`.
    fn gradient(&self, w: &DVector<f64>) -> DVector<f64> {
        let sigma_w = &self.sigma * w;
        let s = w.dot(&sigma_w).sqrt();
        &self.mu / s - sigma_w * (self.expected_return(w) / (s * s * s))
    }
}

/// Solves for the maximum-Sharpe allocation.
pub struct PortfolioOptimizer {
    params: PortfolioParams,
}

impl PortfolioOptimizer {
    pub fn new(params: PortfolioParams) -> Self {
        Self { params }
    }

    pub fn optimize(&self, panel: &PricePanel) -> Result<PortfolioAllocation, OptimizerError> {
        let moments = Moments::from_panel(panel)?;
        let n = panel.n_assets();

        let mut w = DVector::from_element(n, 1.0 / n as f64);
        let mut value = moments
            .sharpe(&w)
            .ok_or_else(|| CoreError::DegenerateStatistics("equal-weight portfolio".to_string()))?;

        let mut step = 1.0;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.params.max_iterations {
            iterations += 1;
            let gradient = moments.gradient(&w);

            let mut accepted = None;
            let mut trial_step = step;
            for _ in 0..MAX_BACKTRACKS {
                let trial: Vec<f64> = (&w + &gradient * trial_step).iter().copied().collect();
                let candidate = DVector::from_vec(project_to_simplex(&trial));
                let moved = &candidate - &w;
                if let Some(candidate_value) = moments.sharpe(&candidate) {
                    if candidate_value >= value + ARMIJO_C * gradient.dot(&moved) {
                        accepted = Some((candidate, candidate_value, moved.amax()));
                        break;
                    }
                }
                trial_step *= 0.5;
            }

            let Some((candidate, candidate_value, largest_move)) = accepted else {
                // No ascent direction survives projection: stationary point.
                converged = true;
                break;
            };
            w = candidate;
            value = candidate_value;
            // Let the step grow again after a successful move.
            step = (trial_step * 2.0).min(1e6);

            if largest_move <= self.params.tolerance {
                converged = true;
                break;
            }
        }

        if w.iter().any(|x| !x.is_finite()) {
            return Err(OptimizerError::NonConvergence(
                "solver produced non-finite weights".to_string(),
            ));
        }
        if !converged {
            tracing::warn!(
                iterations,
                sharpe = value,
                "Portfolio optimizer hit the iteration limit; returning the best iterate."
            );
        }

        let allocation = PortfolioAllocation {
            weights: panel
                .symbols()
                .iter()
                .zip(w.iter())
                .map(|(symbol, weight)| AssetWeight {
                    symbol: symbol.clone(),
                    weight: *weight,
                })
                .collect(),
            expected_return: moments.expected_return(&w),
            volatility: moments.volatility(&w),
            sharpe_ratio: value,
            converged,
            iterations,
        };
        tracing::info!(
            sharpe = allocation.sharpe_ratio,
            volatility = allocation.volatility,
            converged,
            iterations,
            "Portfolio optimization complete."
        );
        Ok(allocation)
    }
}
