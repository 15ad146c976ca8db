//! # Configuration
//!
//! Strongly typed settings for every analysis stage, loaded from an optional
//! TOML file and `QUANTLAB__*` environment overrides, plus the shared tracing
//! setup used by the binary.
//!
//! Stage crates never read configuration themselves; they receive their
//! parameter struct from the caller.

use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ArbitrageParams, CointegrationParams, Config, DataSettings, EngineSettings, LogFormat,
    LoggingSettings, MeanReversionParams, MomentumParams, PortfolioParams, Strategies,
};
pub use telemetry::init_tracing;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quantlab.toml";

/// Prefix of environment overrides, e.g. `QUANTLAB__COINTEGRATION__SEED=7`.
pub const ENV_PREFIX: &str = "QUANTLAB";

/// Loads and validates the application configuration.
///
/// An explicit `path` must exist. Without one, `quantlab.toml` is read if
/// present and the built-in defaults are used otherwise. Environment variables
/// override file values in both cases.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data.min_rows, 60);
        assert_eq!(config.cointegration.n_simulations, 10_000);
        assert_eq!(config.strategies.momentum.lookback, 21);
        assert_eq!(config.strategies.mean_reversion.window, 20);
        assert_eq!(config.arbitrage.entry_z, 2.0);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[cointegration]\nn_simulations = 250\nseed = 7\n\n[strategies.momentum]\nlookback = 10\n"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.cointegration.n_simulations, 250);
        assert_eq!(config.cointegration.seed, 7);
        assert_eq!(config.cointegration.significance, 0.05);
        assert_eq!(config.strategies.momentum.lookback, 10);
        assert_eq!(config.strategies.momentum.long_percentile, 0.6);
        assert_eq!(config.portfolio.max_iterations, 1_000);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn inconsistent_percentiles_are_rejected() {
        let mut config = Config::default();
        config.strategies.momentum.short_percentile = 0.7;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engine]\nworker_threads = 0\n").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn log_format_parses_lowercase() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nformat = \"compact\"\nlevel = \"debug\"\n").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, "debug");
    }
}
