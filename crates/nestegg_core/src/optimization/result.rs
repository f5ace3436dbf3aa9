//! Optimization result types

use serde::{Deserialize, Serialize};

use crate::model::{Allocation, PortfolioStats};

/// Reason why optimization terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Every start point converged
    Converged,

    /// At least one start hit the iteration limit; the best feasible point
    /// found so far is returned
    MaxIterationsReached,
}

/// Best feasible allocation found by the optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Weights keyed by asset; sums to one within 1e-6
    pub allocation: Allocation,

    /// Return, volatility and Sharpe ratio of `allocation`
    pub stats: PortfolioStats,

    /// False when the result is the best point seen rather than a converged optimum
    pub converged: bool,

    pub termination_reason: TerminationReason,

    /// Simplex iterations summed over all start points
    pub iterations: usize,

    /// Objective evaluations summed over all start points
    pub evaluations: usize,

    /// Number of start points searched
    pub starts: usize,
}

/// Best constraint-satisfying point seen during a search
#[derive(Debug, Clone, Default)]
pub(crate) struct SearchHistory {
    pub evaluations: usize,
    pub best_feasible: Option<(Vec<f64>, f64)>,
}

impl SearchHistory {
    /// Record an evaluated weight vector and its (unpenalized) Sharpe ratio
    pub fn record(&mut self, weights: &[f64], sharpe: f64, feasible: bool) {
        self.evaluations += 1;
        if !feasible || !sharpe.is_finite() {
            return;
        }
        let improved = self
            .best_feasible
            .as_ref()
            .is_none_or(|(_, best)| sharpe > *best);
        if improved {
            self.best_feasible = Some((weights.to_vec(), sharpe));
        }
    }
}
