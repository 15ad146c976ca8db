use core_types::StageName;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Data loading error: {0}")]
    Loader(#[from] loader::LoaderError),

    #[error("Cointegration error: {0}")]
    Cointegration(#[from] cointegration::CointegrationError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Portfolio optimization error: {0}")]
    Optimizer(#[from] optimizer::OptimizerError),

    #[error("Backtest error: {0}")]
    Backtest(#[from] backtester::BacktestError),

    #[error("Arbitrage error: {0}")]
    Arbitrage(#[from] arbitrage::ArbitrageError),

    #[error("Market analysis error: {0}")]
    Analyzer(#[from] analyzer::AnalyzerError),

    #[error("Stage '{stage}' requires the output of stage '{requires}', which is missing.")]
    UpstreamDependencyMissing { stage: StageName, requires: StageName },

    #[error("Failed to build the analysis thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
