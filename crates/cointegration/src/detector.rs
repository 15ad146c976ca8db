use crate::bootstrap::{BootstrapEstimate, BootstrapPlan, bootstrap_probability};
use crate::engle_granger::{PairTest, engle_granger};
use crate::error::CointegrationError;
use crate::johansen::{JohansenOutput, MAX_JOHANSEN_ASSETS, critical_value_95, johansen_trace};
use configuration::CointegrationParams;
use core_types::{PricePanel, Sanitize};
use itertools::Itertools;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// An unordered pair of symbols, stored in panel column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolPair {
    pub first: String,
    pub second: String,
}

impl SymbolPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// True when the pair holds the two symbols in either order.
    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

impl fmt::Display for SymbolPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Everything the detector learned about the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    pub symbols: Vec<String>,
    /// Trace statistic against no cointegration; `None` when the test could
    /// not run on this panel.
    pub trace_statistic: Option<f64>,
    /// 95% critical value for the number of assets tested.
    pub critical_value: Option<f64>,
    pub is_cointegrated: bool,
    pub johansen: Option<JohansenOutput>,
    pub bootstrap: BootstrapEstimate,
    /// Every pair that could be tested, flagged or not.
    pub pair_tests: Vec<PairTest>,
    pub cointegrated_pairs: Vec<SymbolPair>,
}

impl CointegrationResult {
    pub fn cointegration_probability(&self) -> f64 {
        self.bootstrap.probability
    }
}

impl Sanitize for CointegrationResult {
    fn sanitize(&mut self) {
        self.trace_statistic.sanitize();
        self.critical_value.sanitize();
        self.bootstrap.probability.sanitize();
        if let Some(johansen) = self.johansen.as_mut() {
            johansen.eigenvalues.sanitize();
            johansen.trace_statistics.sanitize();
        }
        for pair in &mut self.pair_tests {
            pair.adf_statistic.sanitize();
            pair.p_value.sanitize();
            pair.hedge_ratio.sanitize();
        }
    }
}

/// Runs the trace test, its bootstrap and the pairwise screen on log-prices.
pub struct CointegrationDetector {
    params: CointegrationParams,
    deadline: Option<Instant>,
}

impl CointegrationDetector {
    pub fn new(params: CointegrationParams) -> Self {
        Self {
            params,
            deadline: None,
        }
    }

    /// Bounds the wall-clock time of the bootstrap loop.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn detect(&self, panel: &PricePanel) -> Result<CointegrationResult, CointegrationError> {
        let log_prices = panel.log_prices();
        let n = panel.n_assets();
        let levels = DMatrix::from_fn(panel.len(), n, |r, c| log_prices[c][r]);

        let (johansen, bootstrap) = if n > MAX_JOHANSEN_ASSETS {
            tracing::warn!(
                assets = n,
                max = MAX_JOHANSEN_ASSETS,
                "Universe exceeds the trace test table; skipping the Johansen test."
            );
            let skipped = BootstrapEstimate {
                requested: self.params.n_simulations,
                ..BootstrapEstimate::default()
            };
            (None, skipped)
        } else {
            let johansen = match johansen_trace(&levels, self.params.lag_order) {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::warn!(error = %e, "Johansen test is degenerate on this panel.");
                    None
                }
            };
            let plan = BootstrapPlan {
                n_simulations: self.params.n_simulations,
                seed: self.params.seed,
                lag_order: self.params.lag_order,
                deadline: self.deadline,
                show_progress: self.params.show_progress,
            };
            (johansen, bootstrap_probability(&levels, &plan)?)
        };

        let pair_tests = self.screen_pairs(panel.symbols(), &log_prices);
        let cointegrated_pairs: Vec<SymbolPair> = pair_tests
            .iter()
            .filter(|t| t.cointegrated)
            .map(|t| SymbolPair::new(t.first.clone(), t.second.clone()))
            .collect();

        let result = CointegrationResult {
            symbols: panel.symbols().to_vec(),
            trace_statistic: johansen.as_ref().map(JohansenOutput::trace_statistic),
            critical_value: critical_value_95(n),
            is_cointegrated: johansen.as_ref().is_some_and(JohansenOutput::is_cointegrated),
            johansen,
            bootstrap,
            pair_tests,
            cointegrated_pairs,
        };

        tracing::info!(
            trace = ?result.trace_statistic,
            cointegrated = result.is_cointegrated,
            probability = result.bootstrap.probability,
            pairs = result.cointegrated_pairs.len(),
            "Cointegration analysis complete."
        );
        Ok(result)
    }

    /// Engle-Granger test on every unordered pair; untestable pairs are logged and skipped.
    fn screen_pairs(&self, symbols: &[String], log_prices: &[Vec<f64>]) -> Vec<PairTest> {
        let pairs: Vec<(usize, usize)> = (0..symbols.len()).tuple_combinations().collect();

        pairs
            .par_iter()
            .filter_map(|&(i, j)| match engle_granger(&log_prices[i], &log_prices[j]) {
                Ok(eg) => Some(PairTest {
                    first: symbols[i].clone(),
                    second: symbols[j].clone(),
                    adf_statistic: eg.adf_statistic,
                    p_value: eg.p_value,
                    hedge_ratio: eg.hedge_ratio,
                    used_lag: eg.used_lag,
                    cointegrated: eg.p_value < self.params.significance,
                }),
                Err(e) => {
                    tracing::warn!(
                        first = %symbols[i],
                        second = %symbols[j],
                        error = %e,
                        "Skipping pair that cannot be tested."
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn panel_from_columns(symbols: &[&str], closes: Vec<Vec<f64>>) -> PricePanel {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..closes[0].len()).map(|i| start + Duration::days(i as i64)).collect();
        PricePanel::new(timestamps, symbols.iter().map(|s| s.to_string()).collect(), closes).unwrap()
    }

    fn random_walk(rng: &mut ChaCha8Rng, t: usize, start: f64) -> Vec<f64> {
        let mut price = start;
        (0..t)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.02..0.02);
                price
            })
            .collect()
    }

    fn params(n_simulations: usize) -> CointegrationParams {
        CointegrationParams {
            n_simulations,
            ..CointegrationParams::default()
        }
    }

    #[test]
    fn exact_multiple_is_flagged_without_failing() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let a = random_walk(&mut rng, 300, 100.0);
        let b: Vec<f64> = a.iter().map(|p| 2.0 * p).collect();
        let c = random_walk(&mut rng, 300, 50.0);
        let panel = panel_from_columns(&["A", "B", "C"], vec![a, b, c]);

        let result = CointegrationDetector::new(params(10)).detect(&panel).unwrap();

        assert!(result.cointegrated_pairs.iter().any(|p| p.contains_pair("A", "B")));
        assert_eq!(result.trace_statistic, None);
        assert!(!result.is_cointegrated);
        assert_eq!(result.critical_value, Some(29.7961));
        assert_eq!(result.bootstrap.completed, 10);
        assert_eq!(result.pair_tests.len(), 3);
    }

    #[test]
    fn independent_walks_produce_a_trace_statistic() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let columns = (0..3).map(|_| random_walk(&mut rng, 250, 10.0)).collect();
        let panel = panel_from_columns(&["X", "Y", "Z"], columns);

        let result = CointegrationDetector::new(params(5)).detect(&panel).unwrap();
        let trace = result.trace_statistic.unwrap();
        assert!(trace.is_finite() && trace >= 0.0);
        assert_eq!(result.johansen.as_ref().unwrap().eigenvalues.len(), 3);
        assert!((0.0..=1.0).contains(&result.cointegration_probability()));
    }

    #[test]
    fn constant_asset_pairs_are_skipped() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let a = random_walk(&mut rng, 120, 10.0);
        let flat = vec![5.0; 120];
        let panel = panel_from_columns(&["A", "FLAT"], vec![a, flat]);

        let result = CointegrationDetector::new(params(0)).detect(&panel).unwrap();
        assert!(result.pair_tests.is_empty());
        assert!(result.cointegrated_pairs.is_empty());
        assert_eq!(result.trace_statistic, None);
        assert_eq!(result.bootstrap.probability, 0.0);
    }

    #[test]
    fn pair_label_uses_a_dash() {
        assert_eq!(SymbolPair::new("BTC", "ETH").to_string(), "BTC-ETH");
        assert!(SymbolPair::new("BTC", "ETH").contains_pair("ETH", "BTC"));
    }
}
