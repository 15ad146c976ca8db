use crate::error::CointegrationError;
use crate::johansen::johansen_trace;
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Fraction of row resamples in which the trace test rejects the null of no
/// cointegration.
///
/// Degenerate resamples count as failures and stay in the denominator.
/// Iterations skipped because of a deadline are excluded entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapEstimate {
    /// In `[0, 1]`; 0 when no iteration completed.
    pub probability: f64,
    pub requested: usize,
    pub completed: usize,
    pub passed: usize,
    pub degenerate: usize,
    /// True when a deadline stopped the loop before all iterations ran.
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    completed: usize,
    passed: usize,
    degenerate: usize,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            completed: self.completed + other.completed,
            passed: self.passed + other.passed,
            degenerate: self.degenerate + other.degenerate,
        }
    }
}

/// Settings of one bootstrap run.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapPlan {
    pub n_simulations: usize,
    pub seed: u64,
    pub lag_order: usize,
    pub deadline: Option<Instant>,
    pub show_progress: bool,
}

/// Draws `T` row indices with replacement, keeping draw order.
fn resample(levels: &DMatrix<f64>, rng: &mut ChaCha8Rng) -> DMatrix<f64> {
    let rows = levels.nrows();
    let picks: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..rows)).collect();
    DMatrix::from_fn(rows, levels.ncols(), |r, c| levels[(picks[r], c)])
}

fn progress_bar(plan: &BootstrapPlan) -> Result<ProgressBar, CointegrationError> {
    if !plan.show_progress {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(plan.n_simulations as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map_err(|e| CointegrationError::ProgressBarTemplate(e.to_string()))?
            .progress_chars("=>-"),
    );
    Ok(bar)
}

/// Runs the bootstrap on a `T x N` level matrix.
///
/// Iteration `i` draws from a ChaCha stream keyed by `(seed, i)`, so the
/// estimate does not depend on how rayon schedules the work.
pub fn bootstrap_probability(
    levels: &DMatrix<f64>,
    plan: &BootstrapPlan,
) -> Result<BootstrapEstimate, CointegrationError> {
    if plan.n_simulations == 0 {
        return Ok(BootstrapEstimate::default());
    }
    if levels.nrows() < 2 {
        // Nothing to resample: every iteration is a degenerate failure.
        tracing::warn!(rows = levels.nrows(), "Too few rows to bootstrap; probability is 0.");
        return Ok(BootstrapEstimate {
            probability: 0.0,
            requested: plan.n_simulations,
            completed: plan.n_simulations,
            passed: 0,
            degenerate: plan.n_simulations,
            interrupted: false,
        });
    }

    let bar = progress_bar(plan)?;
    let tally = (0..plan.n_simulations)
        .into_par_iter()
        .fold(Tally::default, |mut tally, i| {
            if plan.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return tally;
            }
            let mut rng = ChaCha8Rng::seed_from_u64(plan.seed);
            rng.set_stream(i as u64);
            let sample = resample(levels, &mut rng);

            tally.completed += 1;
            match johansen_trace(&sample, plan.lag_order) {
                Ok(output) if output.is_cointegrated() => tally.passed += 1,
                Ok(_) => {}
                Err(_) => tally.degenerate += 1,
            }
            bar.inc(1);
            tally
        })
        .reduce(Tally::default, Tally::merge);
    bar.finish_and_clear();

    let probability = if tally.completed == 0 {
        0.0
    } else {
        tally.passed as f64 / tally.completed as f64
    };
    let interrupted = tally.completed < plan.n_simulations;
    if interrupted {
        tracing::warn!(
            completed = tally.completed,
            requested = plan.n_simulations,
            "Bootstrap deadline reached; probability covers completed iterations only."
        );
    }
    if tally.degenerate > 0 {
        tracing::debug!(degenerate = tally.degenerate, "Degenerate resamples counted as failures.");
    }

    Ok(BootstrapEstimate {
        probability,
        requested: plan.n_simulations,
        completed: tally.completed,
        passed: tally.passed,
        degenerate: tally.degenerate,
        interrupted,
    })
}
