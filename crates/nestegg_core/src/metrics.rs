//! Risk/return metrics for a portfolio
//!
//! `PortfolioMetrics` is derived from a historical return series and an
//! allocation. It is recomputed from scratch whenever either input changes.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{Allocation, AssetReturnSeries};
use crate::statistics::{mean, sample_std_dev};

/// Added to volatility before dividing in Sharpe ratios
pub const VOLATILITY_EPSILON: f64 = 1e-10;

/// `(expected_return - risk_free_rate) / (volatility + 1e-10)`
///
/// Zero volatility yields a large but finite ratio with the sign of the
/// excess return.
#[must_use]
#[inline]
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    (expected_return - risk_free_rate) / (volatility + VOLATILITY_EPSILON)
}

/// Compound a mean periodic return to an annual figure: `(1 + mean)^periods - 1`
#[must_use]
#[inline]
pub fn annualize_return(mean_periodic: f64, periods_per_year: u32) -> f64 {
    (1.0 + mean_periodic).powi(periods_per_year as i32) - 1.0
}

/// Historical performance summary of an allocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub expected_annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    /// Deepest peak-to-trough decline of the compounded path (non-positive)
    pub max_drawdown: f64,
    pub total_return: f64,
    pub best_period: f64,
    pub worst_period: f64,
}

/// Weighted periodic return of the allocation at each observation
pub fn portfolio_returns(series: &AssetReturnSeries, allocation: &Allocation) -> Result<Vec<f64>> {
    let len = series.observations()?;
    let mut combined = vec![0.0; len];
    for (asset, weight) in allocation.iter() {
        let column = series
            .series(asset)
            .ok_or_else(|| EngineError::UnknownAsset(asset.to_string()))?;
        for (acc, r) in combined.iter_mut().zip(column) {
            *acc += weight * r;
        }
    }
    Ok(combined)
}

/// Largest relative decline from a running peak of the compounded return path
#[must_use]
pub fn max_drawdown(periodic_returns: &[f64]) -> f64 {
    let mut value = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for r in periodic_returns {
        value *= 1.0 + r;
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst
}

/// Compute `PortfolioMetrics` for an allocation over a return history
pub fn portfolio_metrics(
    series: &AssetReturnSeries,
    allocation: &Allocation,
    periods_per_year: u32,
    risk_free_rate: f64,
) -> Result<PortfolioMetrics> {
    let returns = portfolio_returns(series, allocation)?;
    if returns.len() < 2 {
        return Err(EngineError::InsufficientData {
            asset: "portfolio".to_string(),
            observations: returns.len(),
        });
    }

    let expected_annual_return = annualize_return(mean(&returns), periods_per_year);
    let annual_volatility = sample_std_dev(&returns) * f64::from(periods_per_year).sqrt();
    let sharpe = if annual_volatility > 0.0 {
        (expected_annual_return - risk_free_rate) / annual_volatility
    } else {
        0.0
    };
    let total_return = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;

    Ok(PortfolioMetrics {
        expected_annual_return,
        annual_volatility,
        sharpe_ratio: sharpe,
        max_drawdown: max_drawdown(&returns),
        total_return,
        best_period: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_period: returns.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe_ratio() {
        let sharpe = sharpe_ratio(0.08, 0.15, 0.02);
        assert!((sharpe - 0.06 / 0.15).abs() < 1e-6);

        let zero_vol = sharpe_ratio(0.08, 0.0, 0.02);
        assert!(zero_vol > 0.0);
        assert!(zero_vol.is_finite());
    }

    #[test]
    fn test_annualize_return() {
        assert!((annualize_return(0.01, 12) - (1.01_f64.powi(12) - 1.0)).abs() < 1e-12);
        assert_eq!(annualize_return(0.0, 252), 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        // 1.0 -> 1.1 -> 0.88 -> 0.968
        let dd = max_drawdown(&[0.10, -0.20, 0.10]);
        assert!((dd + 0.20).abs() < 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn test_portfolio_metrics() {
        let series = AssetReturnSeries::new([
            ("A", vec![0.01, -0.02, 0.03, 0.00]),
            ("B", vec![0.00, 0.01, 0.00, 0.01]),
        ]);
        let allocation = Allocation::new().with("A", 0.5).with("B", 0.5);
        let metrics = portfolio_metrics(&series, &allocation, 252, 0.02).unwrap();

        assert!((metrics.best_period - 0.015).abs() < 1e-12);
        assert!((metrics.worst_period + 0.005).abs() < 1e-12);
        assert!(metrics.max_drawdown <= 0.0);
        let expected_total = 1.005 * 0.995 * 1.015 * 1.005 - 1.0;
        assert!((metrics.total_return - expected_total).abs() < 1e-12);
        assert!(metrics.annual_volatility > 0.0);
    }

    #[test]
    fn test_portfolio_metrics_unknown_asset() {
        let series = AssetReturnSeries::new([("A", vec![0.01, 0.02])]);
        let allocation = Allocation::new().with("Z", 1.0);
        assert!(matches!(
            portfolio_metrics(&series, &allocation, 252, 0.02),
            Err(EngineError::UnknownAsset(_))
        ));
    }
}
