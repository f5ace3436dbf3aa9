//! Monte Carlo simulation results
//!
//! Results are created fresh per simulation call and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::statistics::{
    mean, median_of_sorted, percent_where, percentile_of_sorted, sorted, std_dev,
};

use super::returns::PortfolioStats;

/// Percentiles reported for growth (no-contribution) simulations
pub const GROWTH_PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// Percentiles reported for contribution-schedule simulations
pub const CONTRIBUTION_PERCENTILES: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];

/// Cross-sectional distribution of terminal portfolio values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Terminal value of every path, in path order
    pub final_values: Vec<f64>,

    /// (percentile, value) pairs in ascending percentile order
    pub percentile_values: Vec<(f64, f64)>,

    pub mean_value: f64,
    pub median_value: f64,
    /// Population standard deviation of terminal values
    pub std_dev: f64,
    pub best_case: f64,
    pub worst_case: f64,

    /// Money put in over the schedule (initial + contributions)
    pub total_contributions: f64,
    /// `mean_value - total_contributions`
    pub mean_profit: f64,
    /// Percent of paths ending below `total_contributions`
    pub probability_of_loss: f64,
    /// Percent of paths ending above `total_contributions`
    pub probability_of_profit: f64,
}

impl SimulationResult {
    /// Summarize terminal values against the amount contributed
    pub(crate) fn from_final_values(
        final_values: Vec<f64>,
        percentiles: &[f64],
        total_contributions: f64,
    ) -> Self {
        let ordered = sorted(&final_values);
        let mean_value = mean(&final_values);

        Self {
            percentile_values: percentiles
                .iter()
                .map(|&p| (p, percentile_of_sorted(&ordered, p)))
                .collect(),
            mean_value,
            median_value: median_of_sorted(&ordered),
            std_dev: std_dev(&final_values),
            best_case: ordered.last().copied().unwrap_or(0.0),
            worst_case: ordered.first().copied().unwrap_or(0.0),
            total_contributions,
            mean_profit: mean_value - total_contributions,
            probability_of_loss: percent_where(&final_values, |v| v < total_contributions),
            probability_of_profit: percent_where(&final_values, |v| v > total_contributions),
            final_values,
        }
    }

    /// Value at a reported percentile
    #[must_use]
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentile_values
            .iter()
            .find(|(q, _)| (q - p).abs() < f64::EPSILON)
            .map(|(_, v)| *v)
    }

    #[must_use]
    pub fn num_paths(&self) -> usize {
        self.final_values.len()
    }
}

/// Value of one percentile at each year end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentilePath {
    pub percentile: f64,
    /// Index 0 is the starting value; index `k` is the value after year `k`
    pub values: Vec<f64>,
}

/// Lump-sum growth simulation (no contributions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSimulation {
    pub result: SimulationResult,

    /// Portfolio-level statistics the paths were drawn from
    pub stats: PortfolioStats,

    pub years: f64,
    /// Compounding periods per path
    pub periods: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile_paths: Option<Vec<PercentilePath>>,
}
