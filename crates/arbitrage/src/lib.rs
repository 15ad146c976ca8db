//! # Arbitrage Quantifier
//!
//! Turns cointegrated pairs into spread trades. For each pair the hedge ratio
//! is estimated on raw prices over the full window, and the latest spread is
//! scored against the spread's own mean and dispersion.
//!
//! ## Public API
//!
//! - `ArbitrageQuantifier`: scores a list of pairs on a price panel.
//! - `ArbitrageReport` / `ArbitrageOpportunity` / `PairSpread`: the results.
//! - `evaluate_spread`, `hedge_ratio`: the building blocks, usable on their own.

use cointegration::SymbolPair;
use configuration::ArbitrageParams;
use core_types::stats::std_dev;
use core_types::{CoreError, PricePanel, Sanitize, SpreadDirection};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod spread;

pub use error::ArbitrageError;
pub use spread::{SpreadSignal, evaluate_spread, hedge_ratio};

/// Spread dispersion below this fraction of the first leg's price dispersion
/// is rounding noise from a perfectly hedged pair.
const SPREAD_STD_TOLERANCE: f64 = 1e-9;

/// An active spread trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// `"FIRST-SECOND"`.
    pub pair: String,
    pub z_score: f64,
    pub direction: SpreadDirection,
    /// `|z| * std(spread)`, a reversion distance in price units.
    pub expected_profit: f64,
    pub hedge_ratio: f64,
}

/// Spread statistics for every analyzed pair, active or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSpread {
    pub pair: String,
    /// `None` when the hedge leg has constant prices.
    pub hedge_ratio: Option<f64>,
    pub z_score: Option<f64>,
    pub spread_std: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageReport {
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub spreads: Vec<PairSpread>,
    pub total_pairs_analyzed: usize,
    pub active_opportunities: usize,
    pub total_opportunity_value: f64,
}

impl Sanitize for ArbitrageReport {
    fn sanitize(&mut self) {
        for opportunity in &mut self.opportunities {
            opportunity.z_score.sanitize();
            opportunity.expected_profit.sanitize();
            opportunity.hedge_ratio.sanitize();
        }
        for spread in &mut self.spreads {
            spread.hedge_ratio.sanitize();
            spread.z_score.sanitize();
            spread.spread_std.sanitize();
        }
        self.total_opportunity_value.sanitize();
    }
}

pub struct ArbitrageQuantifier {
    params: ArbitrageParams,
}

impl ArbitrageQuantifier {
    pub fn new(params: ArbitrageParams) -> Self {
        Self { params }
    }

    pub fn quantify(&self, panel: &PricePanel, pairs: &[SymbolPair]) -> Result<ArbitrageReport, ArbitrageError> {
        let mut report = ArbitrageReport {
            total_pairs_analyzed: pairs.len(),
            ..ArbitrageReport::default()
        };

        for pair in pairs {
            let first = column(panel, &pair.first)?;
            let second = column(panel, &pair.second)?;
            let label = pair.to_string();

            let slope = match hedge_ratio(first, second) {
                Ok(slope) => slope,
                Err(ArbitrageError::Core(CoreError::DegenerateStatistics(_))) => {
                    tracing::warn!(pair = %label, "Hedge leg has constant prices; pair is not tradable.");
                    report.spreads.push(PairSpread {
                        pair: label,
                        hedge_ratio: None,
                        z_score: None,
                        spread_std: 0.0,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let spread = spread::spread(first, second, slope);
            let mut signal = evaluate_spread(&spread, self.params.entry_z)?;
            let price_scale = std_dev(first).unwrap_or(0.0);
            if signal.std_dev <= SPREAD_STD_TOLERANCE * price_scale {
                signal.z_score = None;
                signal.direction = None;
            }

            tracing::debug!(
                pair = %label,
                hedge_ratio = slope,
                z_score = ?signal.z_score,
                "Spread evaluated."
            );

            if let (Some(z_score), Some(direction)) = (signal.z_score, signal.direction) {
                report.opportunities.push(ArbitrageOpportunity {
                    pair: label.clone(),
                    z_score,
                    direction,
                    expected_profit: signal.expected_profit(),
                    hedge_ratio: slope,
                });
            }
            report.spreads.push(PairSpread {
                pair: label,
                hedge_ratio: Some(slope),
                z_score: signal.z_score,
                spread_std: signal.std_dev,
            });
        }

        report.active_opportunities = report.opportunities.len();
        report.total_opportunity_value = report.opportunities.iter().map(|o| o.expected_profit).sum();

        tracing::info!(
            pairs = report.total_pairs_analyzed,
            active = report.active_opportunities,
            total_value = report.total_opportunity_value,
            "Arbitrage quantification complete."
        );
        Ok(report)
    }
}

fn column<'a>(panel: &'a PricePanel, symbol: &str) -> Result<&'a [f64], ArbitrageError> {
    panel
        .column_by_symbol(symbol)
        .ok_or_else(|| ArbitrageError::UnknownSymbol(symbol.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn panel(closes: Vec<Vec<f64>>, symbols: &[&str]) -> PricePanel {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..closes[0].len()).map(|i| start + Duration::days(i as i64)).collect();
        PricePanel::new(timestamps, symbols.iter().map(|s| s.to_string()).collect(), closes).unwrap()
    }

    fn hedge_leg(n: usize) -> Vec<f64> {
        (0..n).map(|t| 100.0 + 10.0 * (t as f64 * 0.05).sin() + t as f64 * 0.1).collect()
    }

    #[test]
    fn dislocated_pair_is_reported() {
        let n = 200;
        let second = hedge_leg(n);
        let mut first: Vec<f64> = second
            .iter()
            .enumerate()
            .map(|(t, p)| 2.0 * p + if t % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        first[n - 1] += 8.0;

        let panel = panel(vec![first, second], &["X", "Y"]);
        let report = ArbitrageQuantifier::new(ArbitrageParams::default())
            .quantify(&panel, &[SymbolPair::new("X", "Y")])
            .unwrap();

        assert_eq!(report.total_pairs_analyzed, 1);
        assert_eq!(report.active_opportunities, 1);
        let opportunity = &report.opportunities[0];
        assert_eq!(opportunity.pair, "X-Y");
        assert_eq!(opportunity.direction, SpreadDirection::Short);
        assert!(opportunity.z_score > 2.0);
        assert_relative_eq!(report.total_opportunity_value, opportunity.expected_profit);
    }

    #[test]
    fn exact_multiple_is_analyzed_but_not_active() {
        let second = hedge_leg(120);
        let first: Vec<f64> = second.iter().map(|p| 2.0 * p).collect();
        let panel = panel(vec![first, second], &["A", "B"]);

        let report = ArbitrageQuantifier::new(ArbitrageParams::default())
            .quantify(&panel, &[SymbolPair::new("A", "B")])
            .unwrap();

        assert_eq!(report.total_pairs_analyzed, 1);
        assert_eq!(report.active_opportunities, 0);
        assert_eq!(report.spreads[0].z_score, None);
        assert_eq!(report.total_opportunity_value, 0.0);
    }

    #[test]
    fn constant_hedge_leg_is_skipped() {
        let panel = panel(vec![hedge_leg(50), vec![7.0; 50]], &["A", "B"]);
        let report = ArbitrageQuantifier::new(ArbitrageParams::default())
            .quantify(&panel, &[SymbolPair::new("A", "B")])
            .unwrap();
        assert_eq!(report.active_opportunities, 0);
        assert_eq!(report.spreads[0].hedge_ratio, None);
    }

    #[test]
    fn unknown_symbols_are_errors() {
        let panel = panel(vec![hedge_leg(30), hedge_leg(30)], &["A", "B"]);
        let err = ArbitrageQuantifier::new(ArbitrageParams::default())
            .quantify(&panel, &[SymbolPair::new("A", "ZZZ")])
            .unwrap_err();
        assert_eq!(err, ArbitrageError::UnknownSymbol("ZZZ".to_string()));
    }

    #[test]
    fn no_pairs_means_an_empty_report() {
        let panel = panel(vec![hedge_leg(30), hedge_leg(30)], &["A", "B"]);
        let report = ArbitrageQuantifier::new(ArbitrageParams::default())
            .quantify(&panel, &[])
            .unwrap();
        assert_eq!(report, ArbitrageReport::default());
    }
}
