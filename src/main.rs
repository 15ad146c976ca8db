use analyzer::{MarketAnalyzer, MarketSummary};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{Config, LogFormat, init_tracing, load_config};
use engine::{AnalysisEngine, AnalysisReport};
use std::path::PathBuf;
use std::process::ExitCode;

/// The main entry point for the QuantLab analysis application.
fn main() -> ExitCode {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // The guard flushes the file writer on drop, so it lives until main returns.
    let _guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config),
        Commands::Summary(args) => handle_summary(args, config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed.");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Statistical analysis of crypto price panels: cointegration, signals,
/// portfolio construction, backtesting and spread arbitrage.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./quantlab.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `logging.format`.
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline on a price file.
    Analyze(AnalyzeArgs),
    /// Print descriptive market statistics for a price file.
    Summary(SummaryArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Wide CSV of closes: a timestamp column followed by one column per symbol.
    #[arg(long)]
    prices: PathBuf,

    /// Where to write the JSON report.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of bootstrap resamples for the cointegration probability.
    #[arg(long)]
    simulations: Option<usize>,

    /// Seed of the bootstrap generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Size of the analysis thread pool.
    #[arg(long)]
    threads: Option<usize>,

    /// Show a progress bar while bootstrapping.
    #[arg(long)]
    progress: bool,
}

#[derive(Parser)]
struct SummaryArgs {
    /// Wide CSV of closes: a timestamp column followed by one column per symbol.
    #[arg(long)]
    prices: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_analyze(args: AnalyzeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(simulations) = args.simulations {
        config.cointegration.n_simulations = simulations;
    }
    if let Some(seed) = args.seed {
        config.cointegration.seed = seed;
    }
    if args.threads.is_some() {
        config.engine.worker_threads = args.threads;
    }
    config.cointegration.show_progress |= args.progress;

    tracing::info!(prices = %args.prices.display(), "Starting analysis.");
    let engine = AnalysisEngine::new(config).context("Failed to start the analysis engine")?;
    let report = engine
        .run_csv(&args.prices)
        .with_context(|| format!("Failed to analyze {}", args.prices.display()))?;

    print_report(&report);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs, config: Config) -> anyhow::Result<()> {
    let panel = loader::load_panel(&args.prices, &config.data)
        .with_context(|| format!("Failed to load {}", args.prices.display()))?;
    let summary = MarketAnalyzer::new().summarize(&panel)?;
    print_market_summary(&summary);
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn print_report(report: &AnalysisReport) {
    println!("\nRun {} ({})", report.run_id, report.generated_at.to_rfc3339());
    println!(
        "{} assets, {} observations",
        report.data.assets, report.data.observations
    );

    let coint = &report.cointegration;
    let mut table = new_table(vec!["Cointegration", "Value"]);
    table.add_row(vec!["Trace statistic".to_string(), fmt_opt(coint.trace_statistic)]);
    table.add_row(vec!["95% critical value".to_string(), fmt_opt(coint.critical_value)]);
    table.add_row(vec!["Cointegrated".to_string(), coint.is_cointegrated.to_string()]);
    table.add_row(vec![
        "Bootstrap probability".to_string(),
        format!(
            "{:.4} ({}/{} resamples{})",
            coint.bootstrap.probability,
            coint.bootstrap.completed,
            coint.bootstrap.requested,
            if coint.bootstrap.interrupted { ", interrupted" } else { "" }
        ),
    ]);
    let pairs: Vec<String> = coint.cointegrated_pairs.iter().map(ToString::to_string).collect();
    table.add_row(vec!["Cointegrated pairs".to_string(), pairs.join(", ")]);
    println!("{table}");

    let signals = &report.strategies;
    let mut table = new_table(vec!["Strategy", "Sharpe ratio"]);
    table.add_row(vec!["Momentum".to_string(), format!("{:.4}", signals.momentum.sharpe_ratio)]);
    table.add_row(vec![
        "Mean reversion".to_string(),
        format!("{:.4}", signals.mean_reversion.sharpe_ratio),
    ]);
    table.add_row(vec!["Combined".to_string(), format!("{:.4}", signals.combined.sharpe_ratio)]);
    println!("{table}");

    let portfolio = &report.portfolio;
    let mut table = new_table(vec!["Asset", "Weight"]);
    for weight in &portfolio.weights {
        table.add_row(vec![weight.symbol.clone(), fmt_pct(weight.weight)]);
    }
    println!("{table}");
    println!(
        "Expected return {}, volatility {}, Sharpe {:.4}{}",
        fmt_pct(portfolio.expected_return),
        fmt_pct(portfolio.volatility),
        portfolio.sharpe_ratio,
        if portfolio.converged { "" } else { " (not converged)" }
    );

    let backtest = &report.backtest;
    let mut table = new_table(vec!["Backtest", "Value"]);
    table.add_row(vec!["Total return".to_string(), fmt_pct(backtest.total_return)]);
    table.add_row(vec!["Annualized return".to_string(), fmt_pct(backtest.annualized_return)]);
    table.add_row(vec!["Volatility".to_string(), fmt_pct(backtest.volatility)]);
    table.add_row(vec!["Sharpe ratio".to_string(), format!("{:.4}", backtest.sharpe_ratio)]);
    table.add_row(vec!["Max drawdown".to_string(), fmt_pct(backtest.max_drawdown)]);
    table.add_row(vec!["Calmar ratio".to_string(), fmt_opt(backtest.calmar_ratio)]);
    table.add_row(vec!["Win rate".to_string(), fmt_pct(backtest.win_rate)]);
    table.add_row(vec!["Periods".to_string(), backtest.total_periods.to_string()]);
    println!("{table}");

    let arbitrage = &report.arbitrage;
    let mut table = new_table(vec!["Pair", "Z-score", "Direction", "Expected profit"]);
    for opportunity in &arbitrage.opportunities {
        table.add_row(vec![
            opportunity.pair.clone(),
            format!("{:.3}", opportunity.z_score),
            opportunity.direction.to_string(),
            format!("{:.4}", opportunity.expected_profit),
        ]);
    }
    println!("{table}");
    println!(
        "{} pairs analyzed, {} active, total opportunity value {:.4}",
        arbitrage.total_pairs_analyzed, arbitrage.active_opportunities, arbitrage.total_opportunity_value
    );

    print_market_summary(&report.market_summary);

    if !report.failures.is_empty() {
        let mut table = new_table(vec!["Failed stage", "Error"]);
        for failure in &report.failures {
            table.add_row(vec![failure.stage.to_string(), failure.error.clone()]);
        }
        println!("{table}");
    }
}

fn print_market_summary(summary: &MarketSummary) {
    let mut table = new_table(vec!["Asset", "Mean daily return", "Daily volatility", "Total return"]);
    for asset in &summary.ranked_assets {
        table.add_row(vec![
            asset.symbol.clone(),
            fmt_pct(asset.mean_return),
            fmt_pct(asset.volatility),
            fmt_pct(asset.total_return),
        ]);
    }
    println!("{table}");
    println!(
        "Average daily return {}, average volatility {}, best {}, worst {}",
        fmt_pct(summary.average_daily_return),
        fmt_pct(summary.average_volatility),
        summary.best_performer.as_deref().unwrap_or("n/a"),
        summary.worst_performer.as_deref().unwrap_or("n/a"),
    );
}
