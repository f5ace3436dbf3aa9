//! Market-data collaborators
//!
//! The engine never fetches prices itself. Callers hand it a
//! [`MarketDataProvider`] (return histories and asset metadata) and, for
//! template recommendations, a [`BasketCatalog`]. Fallback policy belongs to
//! the caller: [`SyntheticMarketData`] exists for demos and offline runs and is
//! only used when explicitly chosen.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{AssetMetadata, AssetReturnSeries, BasketEntry, RiskTier};

/// Observations for a history period label; unknown labels get five years
#[must_use]
pub fn period_observations(period: &str) -> usize {
    match period {
        "1y" => 252,
        "2y" => 504,
        "5y" => 1260,
        "10y" => 2520,
        _ => 1260,
    }
}

/// Source of historical returns and descriptive asset data
pub trait MarketDataProvider {
    /// Aligned periodic returns for `symbols` over `period` ("1y", "5y", ...)
    fn historical_returns(&self, symbols: &[String], period: &str) -> Result<AssetReturnSeries>;

    fn asset_metadata(&self, symbol: &str) -> Result<AssetMetadata>;
}

/// Preset per-tier baskets for template recommendations
pub trait BasketCatalog {
    fn template_basket(&self, tier: RiskTier) -> Vec<BasketEntry>;
}

/// In-memory provider over caller-supplied histories
///
/// Returns the most recent `period_observations(period)` rows of each
/// requested symbol. Symbols without metadata report [`AssetMetadata::unknown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMarketData {
    #[serde(default)]
    pub returns: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, AssetMetadata>,
}

impl StaticMarketData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_returns(mut self, symbol: impl Into<String>, returns: Vec<f64>) -> Self {
        self.returns.insert(symbol.into(), returns);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, symbol: impl Into<String>, metadata: AssetMetadata) -> Self {
        self.metadata.insert(symbol.into(), metadata);
        self
    }
}

impl MarketDataProvider for StaticMarketData {
    fn historical_returns(&self, symbols: &[String], period: &str) -> Result<AssetReturnSeries> {
        let wanted = period_observations(period);
        let columns = symbols
            .iter()
            .map(|symbol| {
                let returns = self.returns.get(symbol).ok_or_else(|| EngineError::MarketData {
                    symbol: symbol.clone(),
                    reason: "no history available".to_string(),
                })?;
                let start = returns.len().saturating_sub(wanted);
                Ok((symbol.clone(), returns[start..].to_vec()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AssetReturnSeries::new(columns))
    }

    fn asset_metadata(&self, symbol: &str) -> Result<AssetMetadata> {
        Ok(self
            .metadata
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| AssetMetadata::unknown(symbol)))
    }
}

/// Seeded generator of plausible daily returns
///
/// Bond-like symbols (BND, VGIT) draw from N(0.0002, 0.005), broad equity
/// (VTI, VTIAX) from N(0.0004, 0.015), and everything else from
/// N(0.0003, 0.012).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticMarketData {
    pub seed: u64,
}

impl SyntheticMarketData {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// (mean, std_dev) of the daily return distribution for `symbol`
    #[must_use]
    pub fn daily_parameters(symbol: &str) -> (f64, f64) {
        if symbol.contains("BND") || symbol.contains("VGIT") {
            (0.0002, 0.005)
        } else if symbol.contains("VTI") {
            (0.0004, 0.015)
        } else {
            (0.0003, 0.012)
        }
    }
}

impl MarketDataProvider for SyntheticMarketData {
    fn historical_returns(&self, symbols: &[String], period: &str) -> Result<AssetReturnSeries> {
        let days = period_observations(period);
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let columns = symbols
            .iter()
            .map(|symbol| {
                let (mean, std_dev) = Self::daily_parameters(symbol);
                let dist = Normal::new(mean, std_dev).map_err(|_| {
                    EngineError::InvalidDistributionParameters {
                        mean,
                        std_dev,
                        reason: "std_dev must be non-negative and finite",
                    }
                })?;
                let returns: Vec<f64> = (0..days).map(|_| dist.sample(&mut rng)).collect();
                Ok((symbol.clone(), returns))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AssetReturnSeries::new(columns))
    }

    fn asset_metadata(&self, symbol: &str) -> Result<AssetMetadata> {
        Ok(AssetMetadata::unknown(symbol))
    }
}

/// The three fixed four-symbol baskets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultBasketCatalog;

impl BasketCatalog for DefaultBasketCatalog {
    fn template_basket(&self, tier: RiskTier) -> Vec<BasketEntry> {
        let entries: [(&str, f64); 4] = match tier {
            RiskTier::Conservative => [("BND", 0.4), ("VGIT", 0.2), ("VTI", 0.3), ("VTIAX", 0.1)],
            RiskTier::Moderate => [("VTI", 0.4), ("VTIAX", 0.2), ("BND", 0.3), ("VNQ", 0.1)],
            RiskTier::Aggressive => [("VTI", 0.4), ("VGT", 0.3), ("VWO", 0.2), ("VNQ", 0.1)],
        };
        entries
            .into_iter()
            .map(|(symbol, weight)| BasketEntry::new(symbol, weight))
            .collect()
    }
}
