//! Engine configuration
//!
//! `EngineConfig` holds the tunables shared by the estimator, optimizer and
//! simulators. Every field has a serde default so partial YAML/JSON documents
//! deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Paths per Monte Carlo batch (unit of parallel work and cancellation)
pub const DEFAULT_BATCH_SIZE: usize = 100;

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_periods_per_year() -> u32 {
    TRADING_DAYS_PER_YEAR
}

fn default_simulations() -> usize {
    1000
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_iterations() -> usize {
    2000
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_multi_start() -> bool {
    true
}

fn default_constraint_tolerance() -> f64 {
    1e-6
}

/// Settings for the Sharpe-ratio optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Maximum simplex iterations per start point
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence threshold on the spread of objective values in the simplex
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Also start from each single-asset tilt, not only equal weights
    #[serde(default = "default_multi_start")]
    pub multi_start: bool,

    /// Allowed slack on target-return / max-volatility constraints
    #[serde(default = "default_constraint_tolerance")]
    pub constraint_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            multi_start: default_multi_start(),
            constraint_tolerance: default_constraint_tolerance(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Annual risk-free rate used in Sharpe ratios
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Observation frequency of return series (252 for daily data)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    /// Monte Carlo paths per simulation call
    #[serde(default = "default_simulations")]
    pub simulations: usize,

    /// Master seed; `None` draws one from process entropy per call
    #[serde(default)]
    pub seed: Option<u64>,

    /// Paths per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            periods_per_year: default_periods_per_year(),
            simulations: default_simulations(),
            seed: None,
            batch_size: default_batch_size(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Same configuration with a fixed seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same configuration with a different path count
    #[must_use]
    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(EngineError::Config(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if self.periods_per_year == 0 {
            return Err(EngineError::Config(
                "periods_per_year must be at least 1".to_string(),
            ));
        }
        if self.simulations == 0 {
            return Err(EngineError::Config(
                "simulations must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(EngineError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(EngineError::Config(
                "optimizer.max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.optimizer.tolerance.is_finite() && self.optimizer.tolerance >= 0.0) {
            return Err(EngineError::Config(
                "optimizer.tolerance must be a non-negative number".to_string(),
            ));
        }
        if !(self.optimizer.constraint_tolerance.is_finite()
            && self.optimizer.constraint_tolerance >= 0.0)
        {
            return Err(EngineError::Config(
                "optimizer.constraint_tolerance must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}
