use crate::Strategy;
use crate::error::StrategyError;
use crate::positions::PositionMatrix;
use configuration::MeanReversionParams;
use core_types::stats::{mean, std_dev};
use core_types::{Position, PricePanel, ReturnSeries, StrategyId};

/// Rolling z-score mean reversion on price levels.
///
/// A price more than `entry_z` rolling standard deviations below its rolling
/// mean is bought, one as far above is sold.
pub struct MeanReversion {
    params: MeanReversionParams,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::InvalidParameters(
                "Mean reversion window must be at least 2".to_string(),
            ));
        }
        if params.entry_z <= 0.0 {
            return Err(StrategyError::InvalidParameters(
                "Mean reversion entry z-score must be positive".to_string(),
            ));
        }
        Ok(Self { params })
    }

    /// z-score of each price against the trailing window ending at it.
    /// `None` during warm-up and when the window has no dispersion.
    pub fn z_scores(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let window = self.params.window;
        let mut z = vec![None; prices.len()];
        for (start, slice) in prices.windows(window).enumerate() {
            let (Some(m), Some(sd)) = (mean(slice), std_dev(slice)) else {
                continue;
            };
            if sd > 0.0 {
                z[start + window - 1] = Some((slice[window - 1] - m) / sd);
            }
        }
        z
    }

    fn classify(&self, z: Option<f64>) -> Position {
        match z {
            Some(z) if z < -self.params.entry_z => Position::Long,
            Some(z) if z > self.params.entry_z => Position::Short,
            _ => Position::Flat,
        }
    }
}

impl Strategy for MeanReversion {
    fn id(&self) -> StrategyId {
        StrategyId::MeanReversion
    }

    /// Positions are decided on price rows; price row `t` maps onto return row `t - 1`.
    fn positions(&self, panel: &PricePanel, returns: &ReturnSeries) -> Result<PositionMatrix, StrategyError> {
        if panel.len() != returns.len() + 1 {
            return Err(StrategyError::ShapeMismatch(format!(
                "{} price rows for {} return rows",
                panel.len(),
                returns.len()
            )));
        }

        let positions: Vec<Vec<Position>> = panel
            .columns()
            .iter()
            .map(|prices| {
                self.z_scores(prices)
                    .into_iter()
                    .skip(1)
                    .map(|z| self.classify(z))
                    .collect()
            })
            .collect();

        tracing::debug!(window = self.params.window, "Mean reversion positions computed.");
        PositionMatrix::new(panel.symbols().to_vec(), positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn params(window: usize) -> MeanReversionParams {
        MeanReversionParams {
            window,
            entry_z: 2.0,
        }
    }

    #[test]
    fn z_score_of_a_spike() {
        let strategy = MeanReversion::new(params(5)).unwrap();
        let prices = [10.0, 10.0, 10.0, 10.0, 20.0];
        let z = strategy.z_scores(&prices);

        assert!(z[..4].iter().all(Option::is_none));
        // mean 12, sample std sqrt(20)
        assert_relative_eq!(z[4].unwrap(), 8.0 / 20f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn flat_window_has_no_z_score() {
        let strategy = MeanReversion::new(params(3)).unwrap();
        assert!(strategy.z_scores(&[5.0, 5.0, 5.0, 5.0]).iter().all(Option::is_none));
    }

    #[test]
    fn extremes_map_to_opposite_positions() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..12).map(|i| start + Duration::days(i)).collect();
        let mut spike_up = vec![100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0];
        spike_up[11] = 130.0;
        let spike_down: Vec<f64> = spike_up.iter().map(|p| 200.0 - p).collect();
        let panel = PricePanel::new(
            timestamps,
            vec!["UP".to_string(), "DOWN".to_string()],
            vec![spike_up, spike_down],
        )
        .unwrap();
        let returns = panel.returns();

        let positions = MeanReversion::new(params(10)).unwrap().positions(&panel, &returns).unwrap();
        assert_eq!(positions.len(), 11);
        assert_eq!(positions.get(0, 10), Position::Short);
        assert_eq!(positions.get(1, 10), Position::Long);
        assert_eq!(positions.get(0, 9), Position::Flat);
    }
}
