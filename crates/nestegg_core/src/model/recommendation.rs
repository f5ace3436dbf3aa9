//! Risk tiers, asset baskets and the recommendation payload

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::PortfolioMetrics;

use super::allocation::Allocation;

/// Coarse risk bucket driving template allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [
        RiskTier::Conservative,
        RiskTier::Moderate,
        RiskTier::Aggressive,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Conservative => "conservative",
            RiskTier::Moderate => "moderate",
            RiskTier::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the recommended allocation was produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    /// Fixed per-tier basket weights
    #[default]
    Template,
    /// Sharpe-maximizing weights over the tier's basket
    Optimized,
}

/// One symbol of a template basket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketEntry {
    pub symbol: String,
    pub target_weight: f64,
}

impl BasketEntry {
    #[must_use]
    pub fn new(symbol: impl Into<String>, target_weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            target_weight,
        }
    }
}

/// Descriptive data for a symbol, supplied by the market-data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    pub expense_ratio: f64,
    pub dividend_yield: f64,
    pub sector: String,
}

impl AssetMetadata {
    /// Placeholder record for a symbol with no descriptive data
    #[must_use]
    pub fn unknown(symbol: &str) -> Self {
        Self {
            name: symbol.to_string(),
            expense_ratio: 0.0,
            dividend_yield: 0.0,
            sector: "Unknown".to_string(),
        }
    }
}

/// A recommended holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentOption {
    pub symbol: String,
    pub name: String,
    pub target_weight: f64,
    pub expense_ratio: f64,
    pub dividend_yield: f64,
    pub sector: String,
}

impl InvestmentOption {
    #[must_use]
    pub fn from_metadata(
        symbol: impl Into<String>,
        target_weight: f64,
        meta: AssetMetadata,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: meta.name,
            target_weight,
            expense_ratio: meta.expense_ratio,
            dividend_yield: meta.dividend_yield,
            sector: meta.sector,
        }
    }
}

/// Complete portfolio recommendation
///
/// Percent-valued fields (`total_expected_return`, `volatility`,
/// `max_drawdown`) are scaled by 100; everything else is a plain fraction or
/// currency amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPayload {
    pub monthly_amount: f64,
    pub investments: Vec<InvestmentOption>,
    pub allocation: Allocation,
    pub total_expected_return: f64,
    pub projected_value: f64,
    pub total_contributions: f64,
    pub projected_gains: f64,
    pub time_horizon_years: f64,
    pub risk_level: RiskTier,
    pub goal: String,
    pub strategy: AllocationStrategy,
    pub portfolio_metrics: PortfolioMetrics,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskTier::Aggressive).unwrap(),
            r#""aggressive""#
        );
        let tier: RiskTier = serde_json::from_str(r#""conservative""#).unwrap();
        assert_eq!(tier, RiskTier::Conservative);
        assert_eq!(RiskTier::Moderate.to_string(), "moderate");
    }

    #[test]
    fn test_strategy_serde() {
        assert_eq!(
            serde_json::to_string(&AllocationStrategy::Optimized).unwrap(),
            r#""optimized""#
        );
    }
}
