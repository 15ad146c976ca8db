//! # Analysis Engine
//!
//! The master orchestrator. It wires the loader and every analysis stage
//! into one pipeline run and turns their outputs into an `AnalysisReport`.
//!
//! ## Architectural Principles
//!
//! - **Stage isolation:** a failing stage is recorded as a `StageFailure` and
//!   the run continues; only stages that depend on it are skipped.
//! - **Explicit data flow:** stage outputs live in an `AnalysisResults`
//!   accumulator passed by `&mut`. Backtest reads the strategy signals and
//!   arbitrage reads the cointegrated pairs through typed accessors.
//! - **Dedicated parallelism:** the independent stages run concurrently via
//!   `rayon::join` on a pool owned by the engine, so a run never competes
//!   with the global rayon pool of the host application.
//!
//! ## Public API
//!
//! - `AnalysisEngine`: builds the pool and runs the pipeline.
//! - `AnalysisResults` / `StageFailure`: the per-run accumulator.
//! - `AnalysisReport`: the serializable, sanitized outcome.

use analytics::AnalyticsEngine;
use analyzer::{DataSummary, MarketAnalyzer};
use arbitrage::ArbitrageQuantifier;
use backtester::Backtester;
use cointegration::CointegrationDetector;
use configuration::Config;
use core_types::{PricePanel, StageName};
use optimizer::PortfolioOptimizer;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;
use std::time::{Duration, Instant};
use strategies::SignalEngine;

pub mod error;
pub mod report;
pub mod results;

pub use error::EngineError;
pub use report::AnalysisReport;
pub use results::{AnalysisResults, StageFailure};

pub struct AnalysisEngine {
    config: Config,
    pool: ThreadPool,
}

impl AnalysisEngine {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let threads = config.engine.worker_threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("quantlab-worker-{}", i))
            .build()?;
        tracing::debug!(threads, "Analysis thread pool ready.");
        Ok(Self { config, pool })
    }

    /// Loads a wide price CSV and runs the full pipeline on it.
    pub fn run_csv(&self, path: &Path) -> Result<AnalysisReport, EngineError> {
        let panel = loader::load_panel(path, &self.config.data)?;
        Ok(self.run(&panel))
    }

    /// Runs every stage and assembles the report.
    pub fn run(&self, panel: &PricePanel) -> AnalysisReport {
        let results = self.analyze(panel);
        let report = AnalysisReport::from_results(results, DataSummary::from_panel(panel));
        tracing::info!(
            run_id = %report.run_id,
            failures = report.failures.len(),
            "Analysis run complete."
        );
        report
    }

    /// Runs every stage and returns the raw accumulator.
    pub fn analyze(&self, panel: &PricePanel) -> AnalysisResults {
        tracing::info!(
            assets = panel.n_assets(),
            observations = panel.len(),
            "Starting analysis run."
        );
        let mut results = AnalysisResults::new();

        self.pool.install(|| {
            self.run_independent_stages(panel, &mut results);
            self.run_backtest(&mut results);
            self.run_arbitrage(panel, &mut results);
        });

        results
    }

    /// Cointegration, signals, portfolio and market summary only read the panel.
    fn run_independent_stages(&self, panel: &PricePanel, results: &mut AnalysisResults) {
        let deadline = self
            .config
            .engine
            .bootstrap_deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let ((cointegration, signals), (portfolio, market_summary)) = rayon::join(
            || {
                rayon::join(
                    || {
                        CointegrationDetector::new(self.config.cointegration.clone())
                            .with_deadline(deadline)
                            .detect(panel)
                    },
                    || SignalEngine::new(&self.config).and_then(|engine| engine.run(panel)),
                )
            },
            || {
                rayon::join(
                    || PortfolioOptimizer::new(self.config.portfolio.clone()).optimize(panel),
                    || MarketAnalyzer::new().summarize(panel),
                )
            },
        );

        results.cointegration = results.settle(StageName::Cointegration, cointegration);
        results.signals = results.settle(StageName::Strategies, signals);
        results.portfolio = results.settle(StageName::Portfolio, portfolio);
        results.market_summary = results.settle(StageName::MarketSummary, market_summary);
    }

    fn run_backtest(&self, results: &mut AnalysisResults) {
        let outcome = results.signals_for(StageName::Backtest).and_then(|signals| {
            Ok(Backtester::new(AnalyticsEngine::new()).run(signals)?)
        });
        results.backtest = results.settle(StageName::Backtest, outcome);
    }

    fn run_arbitrage(&self, panel: &PricePanel, results: &mut AnalysisResults) {
        let outcome = results.cointegration_for(StageName::Arbitrage).and_then(|cointegration| {
            Ok(ArbitrageQuantifier::new(self.config.arbitrage.clone())
                .quantify(panel, &cointegration.cointegrated_pairs)?)
        });
        results.arbitrage = results.settle(StageName::Arbitrage, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn config() -> Config {
        let mut config = Config::default();
        config.cointegration.n_simulations = 20;
        config.engine.worker_threads = Some(2);
        config
    }

    fn wavy_panel(rows: usize) -> PricePanel {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..rows).map(|i| start + ChronoDuration::days(i as i64)).collect();
        let closes = (0..3)
            .map(|asset| {
                (0..rows)
                    .map(|t| {
                        let x = t as f64;
                        100.0 + 5.0 * (x * (0.13 + 0.04 * asset as f64)).sin() + 0.02 * x * asset as f64
                    })
                    .collect()
            })
            .collect();
        PricePanel::new(timestamps, vec!["A".into(), "B".into(), "C".into()], closes).unwrap()
    }

    #[test]
    fn every_stage_produces_a_result() {
        let engine = AnalysisEngine::new(config()).unwrap();
        let results = engine.analyze(&wavy_panel(120));
        assert!(results.failures.is_empty(), "{:?}", results.failures);
        assert_eq!(results.completed(), StageName::ALL.to_vec());
    }

    #[test]
    fn missing_signals_fail_the_backtest_only() {
        let engine = AnalysisEngine::new(config()).unwrap();
        let mut results = AnalysisResults::new();
        engine.run_backtest(&mut results);

        assert!(results.backtest.is_none());
        assert_eq!(results.failures.len(), 1);
        assert_eq!(results.failures[0].stage, StageName::Backtest);
        assert!(results.failures[0].error.contains("strategies"));
    }

    #[test]
    fn report_carries_the_data_summary() {
        let engine = AnalysisEngine::new(config()).unwrap();
        let panel = wavy_panel(90);
        let report = engine.run(&panel);
        assert_eq!(report.data.assets, 3);
        assert_eq!(report.data.observations, 90);
        assert_eq!(report.data.start, panel.first_timestamp());
        assert!(report.is_complete());
    }
}
