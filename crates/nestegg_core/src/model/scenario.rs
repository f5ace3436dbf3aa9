//! What-if scenarios and their comparison records

use serde::{Deserialize, Serialize};

use super::allocation::Allocation;
use super::results::SimulationResult;

fn default_initial_investment() -> f64 {
    1000.0
}

fn default_monthly_contribution() -> f64 {
    100.0
}

fn default_expected_return() -> f64 {
    0.07
}

fn default_volatility() -> f64 {
    0.15
}

/// Immutable description of one hypothetical plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub allocation: Allocation,

    #[serde(default = "default_initial_investment")]
    pub initial_investment: f64,

    #[serde(default = "default_monthly_contribution")]
    pub monthly_contribution: f64,

    /// Annual expected return of the whole portfolio
    #[serde(default = "default_expected_return")]
    pub expected_return: f64,

    /// Annual volatility of the whole portfolio
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Overrides the comparison-wide horizon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<f64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: String::new(),
            allocation: Allocation::default(),
            initial_investment: default_initial_investment(),
            monthly_contribution: default_monthly_contribution(),
            expected_return: default_expected_return(),
            volatility: default_volatility(),
            years: None,
        }
    }
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    #[must_use]
    pub fn with_initial_investment(mut self, amount: f64) -> Self {
        self.initial_investment = amount;
        self
    }

    #[must_use]
    pub fn with_monthly_contribution(mut self, amount: f64) -> Self {
        self.monthly_contribution = amount;
        self
    }

    #[must_use]
    pub fn with_return_profile(mut self, expected_return: f64, volatility: f64) -> Self {
        self.expected_return = expected_return;
        self.volatility = volatility;
        self
    }

    #[must_use]
    pub fn with_years(mut self, years: f64) -> Self {
        self.years = Some(years);
        self
    }
}

/// Simulation outcome of one named scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub years: f64,
    pub result: SimulationResult,
}

/// How alternative scenarios source their random draws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPairing {
    /// Every scenario draws from its own stream
    #[default]
    Independent,
    /// Alternatives reuse the base scenario's stream (common random numbers)
    CommonRandomNumbers,
}

/// Deltas of one alternative relative to the base (always alternative - base)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Position of the alternative in the comparison input
    pub alternative: usize,
    pub name: String,
    pub mean_value_delta: f64,
    /// Percent change of the mean terminal value; 0 when the base mean is 0
    pub mean_value_pct_change: f64,
    pub risk_delta: f64,
    pub prob_loss_delta: f64,
    /// Percent of index-aligned path pairs where the alternative ends higher
    pub better_outcome_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Opportunity,
    Risk,
    Warning,
}

/// Qualitative observation derived from a `ComparisonResult`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub alternative: usize,
    pub title: String,
    pub description: String,
    pub priority: InsightPriority,
    pub kind: InsightKind,
}

/// Full output of a scenario comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub base: ScenarioOutcome,
    pub alternatives: Vec<ScenarioOutcome>,
    pub deltas: Vec<ComparisonResult>,
    pub insights: Vec<Insight>,
    pub pairing: PathPairing,
}
