use crate::Strategy;
use crate::error::StrategyError;
use crate::mean_reversion::MeanReversion;
use crate::momentum::Momentum;
use configuration::Config;
use core_types::StrategyId;

/// Creates a new strategy instance based on the provided ID and configuration.
///
/// The match is exhaustive, so adding a `StrategyId` without wiring it up here
/// is a compile error.
pub fn create_strategy(id: StrategyId, config: &Config) -> Result<Box<dyn Strategy>, StrategyError> {
    match id {
        StrategyId::Momentum => {
            let params = config.strategies.momentum.clone();
            Ok(Box::new(Momentum::new(params)?))
        }
        StrategyId::MeanReversion => {
            let params = config.strategies.mean_reversion.clone();
            Ok(Box::new(MeanReversion::new(params)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_strategy() {
        let config = Config::default();
        for id in [StrategyId::Momentum, StrategyId::MeanReversion] {
            assert_eq!(create_strategy(id, &config).unwrap().id(), id);
        }
    }

    #[test]
    fn propagates_invalid_parameters() {
        let mut config = Config::default();
        config.strategies.mean_reversion.window = 1;
        assert!(create_strategy(StrategyId::MeanReversion, &config).is_err());
    }
}
