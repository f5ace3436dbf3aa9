//! Request documents accepted by the runner
//!
//! One request per file, selected by its `kind`:
//!
//! ```yaml
//! kind: optimize
//! series:
//!   VTI: [0.010, -0.004, 0.007]
//!   BND: [0.001, 0.002, -0.001]
//! constraints:
//!   target_return: 0.06
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use jiff::civil::Date;
use nestegg_core::estimation::estimate;
use nestegg_core::market_data::StaticMarketData;
use nestegg_core::model::{
    Allocation, AllocationStrategy, AssetReturnSeries, PathPairing, ReturnModel, Scenario,
};
use nestegg_core::optimization::OptimizationConstraints;
use nestegg_core::simulation::GrowthParams;
use nestegg_core::{EngineError, RecommendationRequest};
use serde::{Deserialize, Serialize};

use crate::settings::is_json;

fn default_samples() -> usize {
    1000
}

fn default_initial_value() -> f64 {
    1.0
}

#[derive(Debug, Clone)]
pub enum RequestError {
    MissingField(&'static str),
    ConflictingMarketData,
    Engine(EngineError),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MissingField(field) => write!(f, "Missing field: {}", field),
            RequestError::ConflictingMarketData => write!(
                f,
                "Give either market_data or synthetic_market_data, not both"
            ),
            RequestError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<EngineError> for RequestError {
    fn from(e: EngineError) -> Self {
        RequestError::Engine(e)
    }
}

/// Inline periodic return history, one column per asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineHistory {
    pub series: BTreeMap<String, Vec<f64>>,

    /// Observation dates shared by every column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<Date>>,
}

impl InlineHistory {
    pub fn to_series(&self) -> Result<AssetReturnSeries, RequestError> {
        let mut series = AssetReturnSeries::new(
            self.series
                .iter()
                .map(|(asset, returns)| (asset.clone(), returns.clone())),
        );
        series.dates = self.dates.clone();
        series.observations()?;
        Ok(series)
    }

    pub fn to_model(&self, periods_per_year: u32) -> Result<ReturnModel, RequestError> {
        Ok(estimate(&self.to_series()?, periods_per_year)?)
    }
}

/// Where a simulation's return and volatility come from
///
/// Either given directly, or derived from an allocation over an inline history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_return: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<InlineHistory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Allocation>,
}

impl ReturnProfile {
    /// `(expected_return, volatility)` for this profile
    pub fn resolve(&self, periods_per_year: u32) -> Result<(f64, f64), RequestError> {
        if let (Some(history), Some(allocation)) = (&self.history, &self.allocation) {
            let model = history.to_model(periods_per_year)?;
            let weights = model.weights_for(allocation)?;
            return Ok((
                model.portfolio_return(&weights),
                model.portfolio_volatility(&weights),
            ));
        }
        let expected_return = self
            .expected_return
            .ok_or(RequestError::MissingField("expected_return"))?;
        let volatility = self
            .volatility
            .ok_or(RequestError::MissingField("volatility"))?;
        Ok((expected_return, volatility))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    /// Annualized expected returns and covariance
    Estimate { history: InlineHistory },

    /// Max-Sharpe allocation
    Optimize {
        history: InlineHistory,
        #[serde(default)]
        constraints: OptimizationConstraints,
    },

    /// Randomly sampled long-only portfolios
    Frontier {
        history: InlineHistory,
        #[serde(default = "default_samples")]
        samples: usize,
    },

    /// Lump-sum growth
    SimulateGrowth {
        profile: ReturnProfile,
        years: f64,
        #[serde(default = "default_initial_value")]
        initial_value: f64,
        #[serde(default)]
        yearly_paths: bool,
    },

    /// Monthly contribution schedule
    SimulateContributions {
        profile: ReturnProfile,
        years: f64,
        #[serde(default)]
        initial_investment: f64,
        monthly_contribution: f64,
    },

    /// Base scenario versus alternatives
    Compare {
        base: Scenario,
        alternatives: Vec<Scenario>,
        years: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        simulations: Option<usize>,
        #[serde(default)]
        pairing: PathPairing,
    },

    /// Tier basket recommendation
    Recommend {
        monthly_investment: f64,
        risk_tolerance: String,
        time_horizon: String,
        #[serde(default)]
        goal: String,
        #[serde(default)]
        strategy: AllocationStrategy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        market_data: Option<StaticMarketData>,
        /// Seed for generated market data; only used when explicitly given
        #[serde(default, skip_serializing_if = "Option::is_none")]
        synthetic_market_data: Option<u64>,
    },
}

impl Request {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).wrap_err("Failed to parse YAML request")
    }

    /// Load from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse JSON request")
    }

    /// Load a request file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read request file {}", path.display()))?;
        if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Estimate { .. } => "estimate",
            Request::Optimize { .. } => "optimize",
            Request::Frontier { .. } => "frontier",
            Request::SimulateGrowth { .. } => "simulate_growth",
            Request::SimulateContributions { .. } => "simulate_contributions",
            Request::Compare { .. } => "compare",
            Request::Recommend { .. } => "recommend",
        }
    }
}

/// Growth parameters for a `simulate_growth` request
pub fn growth_params(
    profile: &ReturnProfile,
    years: f64,
    initial_value: f64,
    yearly_paths: bool,
    periods_per_year: u32,
) -> Result<GrowthParams, RequestError> {
    let (expected_return, volatility) = profile.resolve(periods_per_year)?;
    let params =
        GrowthParams::new(expected_return, volatility, years).with_initial_value(initial_value);
    Ok(if yearly_paths {
        params.with_yearly_paths()
    } else {
        params
    })
}

/// Core recommendation request for a `recommend` request's fields
pub fn recommendation_request(
    monthly_investment: f64,
    risk_tolerance: &str,
    time_horizon: &str,
    goal: &str,
    strategy: AllocationStrategy,
) -> RecommendationRequest {
    RecommendationRequest::new(monthly_investment, risk_tolerance, time_horizon)
        .with_goal(goal)
        .with_strategy(strategy)
}
