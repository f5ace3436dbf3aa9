//! Portfolio construction and simulation engine
//!
//! This crate turns asset return histories into recommended portfolios and
//! distributions of plausible outcomes. It provides:
//! - Return estimation (annualized expected returns and covariance)
//! - Sharpe-ratio maximizing optimization with bound, return and volatility constraints
//! - A sampled efficient frontier
//! - Monte Carlo simulation of lump-sum growth and monthly contribution schedules
//! - What-if scenario comparison with derived insights
//! - Template or optimized recommendations with a closed-form projection
//!
//! All computation is synchronous and CPU-bound. With the default `parallel`
//! feature, Monte Carlo batches run on rayon; results are identical either way
//! for a given seed.
//!
//! ```ignore
//! use nestegg_core::{ContributionSchedule, EngineConfig, MonteCarloSimulator};
//!
//! let simulator = MonteCarloSimulator::new(EngineConfig::default().with_seed(42));
//! let schedule = ContributionSchedule::new(1000.0, 100.0, 10.0);
//! let result = simulator.simulate_contributions(0.07, 0.15, &schedule)?;
//! assert_eq!(result.total_contributions, 13_000.0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod estimation;
pub mod market_data;
pub mod metrics;
pub mod optimization;
pub mod progress;
pub mod recommendation;
pub mod scenario;
pub mod simulation;
pub mod statistics;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{EngineConfig, OptimizerConfig};
pub use error::{EngineError, Result};
pub use estimation::ReturnEstimator;
pub use optimization::{OptimizationConstraints, OptimizationResult, PortfolioOptimizer};
pub use progress::SimulationProgress;
pub use recommendation::{RecommendationAssembler, RecommendationRequest};
pub use scenario::ScenarioComparator;
pub use simulation::{ContributionSchedule, GrowthParams, MonteCarloSimulator};
