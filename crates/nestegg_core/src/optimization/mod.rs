//! Sharpe-ratio portfolio optimization
//!
//! Finds the weight vector maximizing `(w·μ - r_f) / (sqrt(wᵀΣw) + 1e-10)`
//! subject to `Σw = 1`, per-asset bounds, and optional minimum-return and
//! maximum-volatility limits.
//!
//! The search runs Nelder-Mead over an unconstrained vector that is projected
//! onto the bounded simplex before every evaluation, so the sum and bound
//! constraints always hold exactly. Return and volatility limits enter the
//! objective as a graded penalty, and the best constraint-satisfying point
//! seen during the search is what gets returned.
//!
//! The objective is not convex in general. The optimizer accepts the best local
//! optimum found from its start points (equal weights, plus one tilt toward
//! each asset when `multi_start` is enabled); it does not guarantee a global
//! optimum.

mod constraints;
mod frontier;
mod nelder_mead;
mod result;

pub use constraints::{OptimizationConstraints, max_achievable_return, project};
pub use frontier::{FrontierPoint, best_sample, sample_frontier, sample_frontier_seeded};
pub use nelder_mead::{SimplexOutcome, SimplexSettings, minimize};
pub use result::{OptimizationResult, TerminationReason};

use tracing::{info, warn};

use crate::config::{EngineConfig, OptimizerConfig};
use crate::error::{EngineError, Result};
use crate::metrics::sharpe_ratio;
use crate::model::ReturnModel;

use constraints::check_feasible;
use result::SearchHistory;

/// Multiplier on constraint violations added to the negative Sharpe ratio
const PENALTY_WEIGHT: f64 = 1e3;

/// Initial simplex offset in the unconstrained space
const INITIAL_STEP: f64 = 0.1;

/// Constrained max-Sharpe optimizer and frontier sampler
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioOptimizer {
    risk_free_rate: f64,
    seed: Option<u64>,
    config: OptimizerConfig,
}

impl Default for PortfolioOptimizer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl PortfolioOptimizer {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            seed: config.seed,
            config: config.optimizer.clone(),
        }
    }

    #[must_use]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Maximize the Sharpe ratio of `model` under `constraints`
    pub fn optimize(
        &self,
        model: &ReturnModel,
        constraints: &OptimizationConstraints,
    ) -> Result<OptimizationResult> {
        let bounds = constraints.bounds_for(model)?;
        let tolerance = self.config.constraint_tolerance;
        check_feasible(model, &bounds, constraints, tolerance)?;

        let n = model.len();
        let rf = self.risk_free_rate;
        let settings = SimplexSettings {
            initial_step: INITIAL_STEP,
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
        };

        let mut history = SearchHistory::default();
        let mut iterations = 0;
        let mut all_converged = true;
        let starts = self.start_points(n);

        for start in &starts {
            let outcome = minimize(
                |x| {
                    let weights = project(x, &bounds);
                    let ret = model.portfolio_return(&weights);
                    let vol = model.portfolio_volatility(&weights);
                    let sharpe = sharpe_ratio(ret, vol, rf);
                    let violation = constraints.violation(ret, vol);
                    history.record(&weights, sharpe, violation <= tolerance);
                    -sharpe + PENALTY_WEIGHT * violation
                },
                start,
                &settings,
            );
            iterations += outcome.iterations;
            all_converged &= outcome.converged;
        }

        let Some((weights, _)) = history.best_feasible else {
            return Err(EngineError::infeasible(
                "no evaluated allocation satisfies the return and volatility limits",
            ));
        };

        let stats = model.stats_for_weights(&weights, rf);
        let termination_reason = if all_converged {
            TerminationReason::Converged
        } else {
            warn!(
                iterations,
                sharpe = stats.sharpe_ratio,
                "Optimizer hit its iteration limit, returning best feasible point"
            );
            TerminationReason::MaxIterationsReached
        };

        info!(
            assets = n,
            starts = starts.len(),
            iterations,
            evaluations = history.evaluations,
            sharpe = stats.sharpe_ratio,
            ?termination_reason,
            "Optimization complete"
        );

        Ok(OptimizationResult {
            allocation: model.allocation_from(&weights),
            stats,
            converged: all_converged,
            termination_reason,
            iterations,
            evaluations: history.evaluations,
            starts: starts.len(),
        })
    }

    /// Sample `sample_count` random long-only portfolios.
    ///
    /// Seeded from the configured seed, otherwise from process entropy.
    #[must_use]
    pub fn efficient_frontier(
        &self,
        model: &ReturnModel,
        sample_count: usize,
    ) -> Vec<FrontierPoint> {
        match self.seed {
            Some(seed) => sample_frontier_seeded(model, sample_count, self.risk_free_rate, seed),
            None => sample_frontier(model, sample_count, self.risk_free_rate, &mut rand::rng()),
        }
    }

    /// Equal weights, then (with `multi_start`) a tilt toward each asset
    fn start_points(&self, n: usize) -> Vec<Vec<f64>> {
        let equal = vec![1.0 / n as f64; n];
        let mut starts = vec![equal.clone()];
        if self.config.multi_start && n > 1 {
            starts.extend((0..n).map(|i| {
                let mut tilt: Vec<f64> = equal.iter().map(|w| 0.5 * w).collect();
                tilt[i] += 0.5;
                tilt
            }));
        }
        starts
    }
}
