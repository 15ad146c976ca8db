use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the signal families produced by the signal engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    Momentum,
    MeanReversion,
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyId::Momentum => write!(f, "momentum"),
            StrategyId::MeanReversion => write!(f, "mean_reversion"),
        }
    }
}

/// A position held in a single asset for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    Long,
    Short,
    #[default]
    Flat,
}

impl Position {
    /// The signed exposure of the position: +1, -1 or 0.
    pub fn exposure(&self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
            Position::Flat => 0.0,
        }
    }
}

/// The trade recommended for a mispriced spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpreadDirection {
    /// Enter long the spread: buy the first leg, sell the hedge.
    Long,
    /// Enter short the spread: sell the first leg, buy the hedge.
    Short,
}

impl fmt::Display for SpreadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadDirection::Long => write!(f, "LONG"),
            SpreadDirection::Short => write!(f, "SHORT"),
        }
    }
}

/// The analysis stages of one pipeline run. Used as the key of the result accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Cointegration,
    Strategies,
    Portfolio,
    Backtest,
    Arbitrage,
    MarketSummary,
}

impl StageName {
    pub const ALL: [StageName; 6] = [
        StageName::Cointegration,
        StageName::Strategies,
        StageName::Portfolio,
        StageName::Backtest,
        StageName::Arbitrage,
        StageName::MarketSummary,
    ];
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::Cointegration => "cointegration",
            StageName::Strategies => "strategies",
            StageName::Portfolio => "portfolio",
            StageName::Backtest => "backtest",
            StageName::Arbitrage => "arbitrage",
            StageName::MarketSummary => "market_summary",
        };
        write!(f, "{}", name)
    }
}
