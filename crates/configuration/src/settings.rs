use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its `Default`, so an absent `quantlab.toml`
/// still yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSettings,
    pub cointegration: CointegrationParams,
    pub strategies: Strategies,
    pub portfolio: PortfolioParams,
    pub arbitrage: ArbitrageParams,
    pub engine: EngineSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects parameter combinations that no stage can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.min_rows < 2 {
            return Err(ConfigError::ValidationError(
                "data.min_rows must be at least 2".to_string(),
            ));
        }
        if !(self.cointegration.significance > 0.0 && self.cointegration.significance < 1.0) {
            return Err(ConfigError::ValidationError(
                "cointegration.significance must be between 0 and 1".to_string(),
            ));
        }
        if self.cointegration.lag_order == 0 {
            return Err(ConfigError::ValidationError(
                "cointegration.lag_order must be at least 1".to_string(),
            ));
        }

        let momentum = &self.strategies.momentum;
        if momentum.lookback == 0 {
            return Err(ConfigError::ValidationError(
                "strategies.momentum.lookback cannot be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&momentum.short_percentile)
            || !(0.0..=1.0).contains(&momentum.long_percentile)
            || momentum.short_percentile > momentum.long_percentile
        {
            return Err(ConfigError::ValidationError(
                "strategies.momentum percentiles must satisfy 0 <= short <= long <= 1".to_string(),
            ));
        }

        let mean_reversion = &self.strategies.mean_reversion;
        if mean_reversion.window < 2 {
            return Err(ConfigError::ValidationError(
                "strategies.mean_reversion.window must be at least 2".to_string(),
            ));
        }
        if mean_reversion.entry_z <= 0.0 {
            return Err(ConfigError::ValidationError(
                "strategies.mean_reversion.entry_z must be positive".to_string(),
            ));
        }

        if self.portfolio.max_iterations == 0 || self.portfolio.tolerance <= 0.0 {
            return Err(ConfigError::ValidationError(
                "portfolio.max_iterations and portfolio.tolerance must be positive".to_string(),
            ));
        }
        if self.arbitrage.entry_z <= 0.0 {
            return Err(ConfigError::ValidationError(
                "arbitrage.entry_z must be positive".to_string(),
            ));
        }
        if self.engine.worker_threads == Some(0) {
            return Err(ConfigError::ValidationError(
                "engine.worker_threads cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for building the price panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Minimum number of aligned rows a panel must have to be analyzed.
    pub min_rows: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { min_rows: 60 }
    }
}

/// Parameters for the Johansen test, its bootstrap and the pairwise screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CointegrationParams {
    /// Number of bootstrap resamples of the Johansen test.
    pub n_simulations: usize,
    /// Seed of the resampling generator. Equal seeds give equal estimates.
    pub seed: u64,
    /// p-value below which a pair is flagged as cointegrated.
    pub significance: f64,
    /// Number of lagged differences in the Johansen VECM.
    pub lag_order: usize,
    /// Draw a progress bar while bootstrapping.
    pub show_progress: bool,
}

impl Default for CointegrationParams {
    fn default() -> Self {
        Self {
            n_simulations: 10_000,
            seed: 42,
            significance: 0.05,
            lag_order: 1,
            show_progress: false,
        }
    }
}

/// Contains the parameter sets for all available strategies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Strategies {
    pub momentum: MomentumParams,
    pub mean_reversion: MeanReversionParams,
}

/// Parameters for the cross-sectional momentum strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    /// Number of returns summed into the momentum score.
    pub lookback: usize,
    /// Go long strictly above this percentile rank.
    pub long_percentile: f64,
    /// Go short strictly below this percentile rank.
    pub short_percentile: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback: 21,
            long_percentile: 0.6,
            short_percentile: 0.4,
        }
    }
}

/// Parameters for the rolling z-score mean reversion strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeanReversionParams {
    pub window: usize,
    /// Absolute z-score beyond which a position is taken.
    pub entry_z: f64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            window: 20,
            entry_z: 2.0,
        }
    }
}

/// Parameters for the maximum-Sharpe solver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortfolioParams {
    pub max_iterations: usize,
    /// The solver stops once a step moves no weight by more than this.
    pub tolerance: f64,
}

impl Default for PortfolioParams {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            tolerance: 1e-10,
        }
    }
}

/// Parameters for turning cointegrated pairs into spread trades.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArbitrageParams {
    /// Absolute spread z-score beyond which a pair is an active opportunity.
    pub entry_z: f64,
}

impl Default for ArbitrageParams {
    fn default() -> Self {
        Self { entry_z: 2.0 }
    }
}

/// Settings for the pipeline orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Size of the analysis thread pool. Defaults to the number of CPUs.
    pub worker_threads: Option<usize>,
    /// Wall-clock budget for the bootstrap loop, in seconds.
    pub bootstrap_deadline_secs: Option<u64>,
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
            file_prefix: "quantlab.log".to_string(),
        }
    }
}
