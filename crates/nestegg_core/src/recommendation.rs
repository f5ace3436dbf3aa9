//! Portfolio recommendations
//!
//! Maps free-text risk and horizon labels onto a tier and a year count, picks
//! the tier's basket (template weights or Sharpe-optimized weights over the
//! same symbols), measures it on one year of history, and projects monthly
//! contributions with a closed-form formula.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::estimation::estimate;
use crate::market_data::{BasketCatalog, MarketDataProvider};
use crate::metrics::portfolio_metrics;
use crate::model::{
    Allocation, AllocationStrategy, InvestmentOption, RecommendationPayload, RiskTier,
};
use crate::optimization::{OptimizationConstraints, PortfolioOptimizer};

/// History period used to measure the recommended basket
pub const METRICS_PERIOD: &str = "1y";

/// Years assumed for an unrecognized horizon label
pub const DEFAULT_HORIZON_YEARS: f64 = 10.0;

const HORIZON_TABLE: [(&str, f64); 10] = [
    ("1-2 years", 1.5),
    ("3-5 years", 4.0),
    ("5-10 years", 7.0),
    ("10+ years", 15.0),
    ("Less than 1 year", 0.25),
    ("3 months", 0.25),
    ("1-3 years", 2.0),
    ("3-7 years", 5.0),
    ("7-15 years", 10.0),
    ("15+ years", 20.0),
];

/// Tier for a free-text risk label
///
/// Case-insensitive substring match, checked in order: "conservative";
/// "balanced" or "moderate"; "growth" or "aggressive". Anything else is
/// moderate.
#[must_use]
pub fn resolve_risk_tier(label: &str) -> RiskTier {
    let lower = label.to_lowercase();
    if lower.contains("conservative") {
        RiskTier::Conservative
    } else if lower.contains("balanced") || lower.contains("moderate") {
        RiskTier::Moderate
    } else if lower.contains("growth") || lower.contains("aggressive") {
        RiskTier::Aggressive
    } else {
        warn!(label, "Unrecognized risk tolerance, using moderate");
        RiskTier::Moderate
    }
}

/// Year count for a horizon label (exact lookup, surrounding whitespace ignored)
#[must_use]
pub fn parse_time_horizon(label: &str) -> f64 {
    let label = label.trim();
    match HORIZON_TABLE.iter().find(|(key, _)| *key == label) {
        Some((_, years)) => *years,
        None => {
            warn!(
                label,
                default_years = DEFAULT_HORIZON_YEARS,
                "Unrecognized time horizon, using default"
            );
            DEFAULT_HORIZON_YEARS
        }
    }
}

/// Closed-form value of `monthly` deposits after `years` at `annual_return`
///
/// Under one year this is simple interest on the total deposited. From one
/// year on it is the future value of an ordinary annuity at
/// `annual_return / 12` per month, or the plain deposit total when that rate
/// is not positive.
#[must_use]
pub fn project_contributions(monthly: f64, annual_return: f64, years: f64) -> f64 {
    let months = years * 12.0;
    let monthly_return = annual_return / 12.0;
    if years < 1.0 {
        monthly * months * (1.0 + annual_return * years)
    } else if monthly_return > 0.0 {
        monthly * (((1.0 + monthly_return).powf(months) - 1.0) / monthly_return)
    } else {
        monthly * months
    }
}

/// Inputs for one recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub monthly_investment: f64,
    pub risk_tolerance: String,
    pub time_horizon: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub strategy: AllocationStrategy,
}

impl RecommendationRequest {
    #[must_use]
    pub fn new(
        monthly_investment: f64,
        risk_tolerance: impl Into<String>,
        time_horizon: impl Into<String>,
    ) -> Self {
        Self {
            monthly_investment,
            risk_tolerance: risk_tolerance.into(),
            time_horizon: time_horizon.into(),
            goal: String::new(),
            strategy: AllocationStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: AllocationStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Builds recommendation payloads from market-data collaborators
pub struct RecommendationAssembler<'a> {
    provider: &'a dyn MarketDataProvider,
    catalog: &'a dyn BasketCatalog,
    config: EngineConfig,
}

impl<'a> RecommendationAssembler<'a> {
    pub fn new(
        provider: &'a dyn MarketDataProvider,
        catalog: &'a dyn BasketCatalog,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            catalog,
            config,
        }
    }

    pub fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationPayload> {
        let monthly = request.monthly_investment;
        if !(monthly.is_finite() && monthly >= 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "monthly investment must be non-negative, got {monthly}"
            )));
        }

        let tier = resolve_risk_tier(&request.risk_tolerance);
        let years = parse_time_horizon(&request.time_horizon);
        let basket = self.catalog.template_basket(tier);
        let symbols: Vec<String> = basket.iter().map(|e| e.symbol.clone()).collect();
        let history = self.provider.historical_returns(&symbols, METRICS_PERIOD)?;

        let allocation = match request.strategy {
            AllocationStrategy::Template => basket
                .iter()
                .map(|e| (e.symbol.clone(), e.target_weight))
                .collect::<Allocation>(),
            AllocationStrategy::Optimized => {
                let model = estimate(&history, self.config.periods_per_year)?;
                PortfolioOptimizer::new(&self.config)
                    .optimize(&model, &OptimizationConstraints::default())?
                    .allocation
            }
        };

        let metrics = portfolio_metrics(
            &history,
            &allocation,
            self.config.periods_per_year,
            self.config.risk_free_rate,
        )?;

        let investments = basket
            .iter()
            .map(|entry| {
                let meta = self.provider.asset_metadata(&entry.symbol)?;
                let weight = allocation.get(&entry.symbol).unwrap_or(0.0);
                Ok(InvestmentOption::from_metadata(entry.symbol.clone(), weight, meta))
            })
            .collect::<Result<Vec<_>>>()?;

        let projected_value = project_contributions(monthly, metrics.expected_annual_return, years);
        let total_contributions = monthly * years * 12.0;

        debug!(
            %tier,
            years,
            strategy = ?request.strategy,
            annual_return = metrics.expected_annual_return,
            projected_value,
            "Assembled recommendation"
        );

        Ok(RecommendationPayload {
            monthly_amount: monthly,
            investments,
            allocation,
            total_expected_return: metrics.expected_annual_return * 100.0,
            projected_value,
            total_contributions,
            projected_gains: projected_value - total_contributions,
            time_horizon_years: years,
            risk_level: tier,
            goal: request.goal.clone(),
            strategy: request.strategy,
            sharpe_ratio: metrics.sharpe_ratio,
            volatility: metrics.annual_volatility * 100.0,
            max_drawdown: metrics.max_drawdown * 100.0,
            portfolio_metrics: metrics,
        })
    }
}
