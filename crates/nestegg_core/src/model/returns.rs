//! Return histories and the annualized return model estimated from them

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::metrics::sharpe_ratio;

use super::allocation::Allocation;

/// Per-asset periodic returns sharing one observation index.
///
/// `returns[i]` belongs to `assets[i]`. When `dates` is present it indexes
/// every series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetReturnSeries {
    pub assets: Vec<String>,
    pub returns: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<Date>>,
}

impl AssetReturnSeries {
    /// Build from `(asset, returns)` columns in the given order
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, Vec<f64>)>) -> Self {
        let (assets, returns): (Vec<String>, Vec<Vec<f64>>) =
            columns.into_iter().map(|(a, r)| (a.into(), r)).unzip();
        Self {
            assets,
            returns,
            dates: None,
        }
    }

    /// Align dated observations on the dates every asset has, in date order
    pub fn from_dated<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Vec<(Date, f64)>)>,
    ) -> Self {
        let columns: Vec<(String, FxHashMap<Date, f64>)> = columns
            .into_iter()
            .map(|(asset, obs)| (asset.into(), obs.into_iter().collect()))
            .collect();

        let mut dates: Vec<Date> = match columns.first() {
            Some((_, first)) => first
                .keys()
                .copied()
                .filter(|d| columns.iter().all(|(_, col)| col.contains_key(d)))
                .collect(),
            None => Vec::new(),
        };
        dates.sort_unstable();

        let (assets, returns): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(asset, col)| {
                let values: Vec<f64> = dates.iter().map(|d| col[d]).collect();
                (asset, values)
            })
            .unzip();

        Self {
            assets,
            returns,
            dates: Some(dates),
        }
    }

    /// Convert aligned price histories to simple periodic returns `p_t / p_{t-1} - 1`
    pub fn from_prices<S: Into<String>>(columns: impl IntoIterator<Item = (S, Vec<f64>)>) -> Self {
        Self::new(columns.into_iter().map(|(asset, prices)| {
            let returns: Vec<f64> = prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
            (asset, returns)
        }))
    }

    /// Drop every observation where any asset has a non-finite value.
    ///
    /// Fails when the series do not share a length.
    pub fn drop_gaps(&self) -> Result<Self> {
        let len = self.observations()?;
        let keep: Vec<usize> = (0..len)
            .filter(|&t| self.returns.iter().all(|col| col[t].is_finite()))
            .collect();

        Ok(Self {
            assets: self.assets.clone(),
            returns: self
                .returns
                .iter()
                .map(|col| keep.iter().map(|&t| col[t]).collect())
                .collect(),
            dates: self
                .dates
                .as_ref()
                .map(|dates| keep.iter().filter_map(|&t| dates.get(t).copied()).collect()),
        })
    }

    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn series(&self, asset: &str) -> Option<&[f64]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.returns[i].as_slice())
    }

    /// Shared number of observations, or `InconsistentSeries` if lengths differ
    pub fn observations(&self) -> Result<usize> {
        if self.assets.len() != self.returns.len() {
            return Err(EngineError::inconsistent(format!(
                "{} asset names for {} return columns",
                self.assets.len(),
                self.returns.len()
            )));
        }
        let len = self.returns.first().map_or(0, Vec::len);
        if let Some((asset, col)) = self
            .assets
            .iter()
            .zip(&self.returns)
            .find(|(_, col)| col.len() != len)
        {
            return Err(EngineError::inconsistent(format!(
                "{asset} has {} observations, expected {len}",
                col.len()
            )));
        }
        if let Some(dates) = &self.dates
            && dates.len() != len
        {
            return Err(EngineError::inconsistent(format!(
                "{} dates for {len} observations",
                dates.len()
            )));
        }
        Ok(len)
    }
}

/// Aggregate return/risk of one weight vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Annualized expected returns and covariance for an ordered asset list.
///
/// Immutable once built; construction validates shape and finiteness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReturnModel")]
pub struct ReturnModel {
    assets: Vec<String>,
    expected_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawReturnModel {
    assets: Vec<String>,
    expected_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
}

impl TryFrom<RawReturnModel> for ReturnModel {
    type Error = EngineError;

    fn try_from(raw: RawReturnModel) -> Result<Self> {
        ReturnModel::new(raw.assets, raw.expected_returns, raw.covariance)
    }
}

impl ReturnModel {
    /// Relative asymmetry tolerated in the covariance matrix
    const SYMMETRY_TOLERANCE: f64 = 1e-9;

    pub fn new(
        assets: Vec<String>,
        expected_returns: Vec<f64>,
        covariance: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n = assets.len();
        if n == 0 {
            return Err(EngineError::inconsistent("return model has no assets"));
        }
        if expected_returns.len() != n {
            return Err(EngineError::inconsistent(format!(
                "{} expected returns for {n} assets",
                expected_returns.len()
            )));
        }
        if covariance.len() != n || covariance.iter().any(|row| row.len() != n) {
            return Err(EngineError::inconsistent(format!(
                "covariance must be {n}x{n}"
            )));
        }
        if expected_returns.iter().any(|r| !r.is_finite())
            || covariance.iter().flatten().any(|c| !c.is_finite())
        {
            return Err(EngineError::inconsistent(
                "return model contains non-finite values",
            ));
        }
        for i in 0..n {
            if covariance[i][i] < 0.0 {
                return Err(EngineError::inconsistent(format!(
                    "negative variance for {}",
                    assets[i]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (covariance[i][j], covariance[j][i]);
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > Self::SYMMETRY_TOLERANCE * scale {
                    return Err(EngineError::inconsistent(format!(
                        "covariance is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(Self {
            assets,
            expected_returns,
            covariance,
        })
    }

    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    #[must_use]
    pub fn expected_returns(&self) -> &[f64] {
        &self.expected_returns
    }

    #[must_use]
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Weight vector in model order; assets missing from the allocation get 0
    pub fn weights_for(&self, allocation: &Allocation) -> Result<Vec<f64>> {
        let mut weights = vec![0.0; self.len()];
        for (asset, weight) in allocation.iter() {
            let idx = self
                .index_of(asset)
                .ok_or_else(|| EngineError::UnknownAsset(asset.to_string()))?;
            weights[idx] = weight;
        }
        Ok(weights)
    }

    /// Allocation keyed by this model's assets
    #[must_use]
    pub fn allocation_from(&self, weights: &[f64]) -> Allocation {
        self.assets
            .iter()
            .zip(weights)
            .map(|(a, w)| (a.clone(), *w))
            .collect()
    }

    /// `w · μ`
    #[must_use]
    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights
            .iter()
            .zip(&self.expected_returns)
            .map(|(w, r)| w * r)
            .sum()
    }

    /// `sqrt(wᵀ Σ w)`, floored at zero against rounding
    #[must_use]
    pub fn portfolio_volatility(&self, weights: &[f64]) -> f64 {
        let variance: f64 = self
            .covariance
            .iter()
            .zip(weights)
            .map(|(row, wi)| wi * row.iter().zip(weights).map(|(c, wj)| c * wj).sum::<f64>())
            .sum();
        variance.max(0.0).sqrt()
    }

    #[must_use]
    pub fn stats_for_weights(&self, weights: &[f64], risk_free_rate: f64) -> PortfolioStats {
        let expected_return = self.portfolio_return(weights);
        let volatility = self.portfolio_volatility(weights);
        PortfolioStats {
            expected_return,
            volatility,
            sharpe_ratio: sharpe_ratio(expected_return, volatility, risk_free_rate),
        }
    }

    pub fn portfolio_stats(
        &self,
        allocation: &Allocation,
        risk_free_rate: f64,
    ) -> Result<PortfolioStats> {
        let weights = self.weights_for(allocation)?;
        Ok(self.stats_for_weights(&weights, risk_free_rate))
    }
}
