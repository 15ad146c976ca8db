use crate::error::StrategyError;
use core_types::{Position, ReturnSeries};
use serde::{Deserialize, Serialize};

/// Positions per asset, aligned to the rows of a [`ReturnSeries`].
///
/// `positions[asset][row]` is the position held at the close of return row
/// `row`; it earns the return of row `row + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionMatrix {
    symbols: Vec<String>,
    positions: Vec<Vec<Position>>,
}

impl PositionMatrix {
    pub fn new(symbols: Vec<String>, positions: Vec<Vec<Position>>) -> Result<Self, StrategyError> {
        if symbols.len() != positions.len() {
            return Err(StrategyError::ShapeMismatch(format!(
                "{} symbols but {} position columns",
                symbols.len(),
                positions.len()
            )));
        }
        if let Some(first) = positions.first() {
            if positions.iter().any(|column| column.len() != first.len()) {
                return Err(StrategyError::ShapeMismatch(
                    "position columns have different lengths".to_string(),
                ));
            }
        }
        Ok(Self { symbols, positions })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.positions.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, asset: usize) -> &[Position] {
        &self.positions[asset]
    }

    pub fn get(&self, asset: usize, row: usize) -> Position {
        self.positions[asset][row]
    }

    /// Count of non-flat positions in the whole matrix.
    pub fn active_count(&self) -> usize {
        self.positions
            .iter()
            .flatten()
            .filter(|p| **p != Position::Flat)
            .count()
    }
}

/// Daily strategy return: the previous row's positions applied to this row's
/// asset returns, summed across assets. Row 0 has no prior position and is 0.
///
/// Positions are raw units per asset and are not divided by the number of
/// active positions.
pub fn combine_returns(positions: &PositionMatrix, returns: &ReturnSeries) -> Result<Vec<f64>, StrategyError> {
    if positions.symbols() != returns.symbols() {
        return Err(StrategyError::ShapeMismatch(
            "positions and returns cover different symbols".to_string(),
        ));
    }
    if positions.len() != returns.len() {
        return Err(StrategyError::ShapeMismatch(format!(
            "{} position rows for {} return rows",
            positions.len(),
            returns.len()
        )));
    }

    let mut combined = vec![0.0; returns.len()];
    for (asset, asset_returns) in returns.columns().iter().enumerate() {
        for row in 1..asset_returns.len() {
            combined[row] += positions.get(asset, row - 1).exposure() * asset_returns[row];
        }
    }
    Ok(combined)
}
