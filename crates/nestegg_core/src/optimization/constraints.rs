//! Optimization constraints and the feasible weight region
//!
//! The feasible region is `{w : Σw = 1, low_i ≤ w_i ≤ high_i}`. Points of the
//! unconstrained search space are mapped onto it by Euclidean projection:
//! `w_i = clamp(x_i - τ, low_i, high_i)` with the shift `τ` chosen so the
//! weights sum to one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{ReturnModel, WeightBounds};

const PROJECTION_ITERATIONS: usize = 200;

/// Constraints on a Sharpe-maximizing allocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    /// Minimum portfolio expected return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_return: Option<f64>,

    /// Maximum portfolio volatility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_volatility: Option<f64>,

    /// Bounds for every asset without its own entry in `asset_bounds`
    #[serde(default)]
    pub weight_bounds: WeightBounds,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub asset_bounds: BTreeMap<String, WeightBounds>,
}

impl OptimizationConstraints {
    #[must_use]
    pub fn with_target_return(mut self, target: f64) -> Self {
        self.target_return = Some(target);
        self
    }

    #[must_use]
    pub fn with_max_volatility(mut self, max: f64) -> Self {
        self.max_volatility = Some(max);
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: WeightBounds) -> Self {
        self.weight_bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_asset_bounds(mut self, asset: impl Into<String>, bounds: WeightBounds) -> Self {
        self.asset_bounds.insert(asset.into(), bounds);
        self
    }

    /// Per-asset bounds in model order
    pub fn bounds_for(&self, model: &ReturnModel) -> Result<Vec<WeightBounds>> {
        if let Some(asset) = self.asset_bounds.keys().find(|a| model.index_of(a).is_none()) {
            return Err(EngineError::UnknownAsset(asset.clone()));
        }
        let bounds: Vec<WeightBounds> = model
            .assets()
            .iter()
            .map(|a| self.asset_bounds.get(a).copied().unwrap_or(self.weight_bounds))
            .collect();
        if let Some((asset, b)) = model.assets().iter().zip(&bounds).find(|(_, b)| !b.is_valid()) {
            return Err(EngineError::infeasible(format!(
                "invalid bounds [{}, {}] for {asset}",
                b.low, b.high
            )));
        }
        Ok(bounds)
    }

    /// True when `(expected_return, volatility)` meets the return/volatility limits
    #[must_use]
    pub fn satisfied_by(&self, expected_return: f64, volatility: f64, tolerance: f64) -> bool {
        self.violation(expected_return, volatility) <= tolerance
    }

    /// Total amount by which the return/volatility limits are missed
    #[must_use]
    pub fn violation(&self, expected_return: f64, volatility: f64) -> f64 {
        let shortfall = self
            .target_return
            .map_or(0.0, |t| (t - expected_return).max(0.0));
        let excess = self.max_volatility.map_or(0.0, |m| (volatility - m).max(0.0));
        shortfall + excess
    }
}

/// Fail fast on constraint sets no allocation can meet
pub fn check_feasible(
    model: &ReturnModel,
    bounds: &[WeightBounds],
    constraints: &OptimizationConstraints,
    tolerance: f64,
) -> Result<()> {
    let low: f64 = bounds.iter().map(|b| b.low).sum();
    let high: f64 = bounds.iter().map(|b| b.high).sum();
    if low > 1.0 + tolerance {
        return Err(EngineError::infeasible(format!(
            "lower bounds sum to {low:.4}, above 1"
        )));
    }
    if high < 1.0 - tolerance {
        return Err(EngineError::infeasible(format!(
            "upper bounds sum to {high:.4}, below 1"
        )));
    }
    if let Some(target) = constraints.target_return {
        let best = max_achievable_return(model.expected_returns(), bounds);
        if target > best + tolerance {
            return Err(EngineError::infeasible(format!(
                "target return {target:.4} exceeds the best achievable {best:.4}"
            )));
        }
    }
    if let Some(max) = constraints.max_volatility
        && (max.is_nan() || max < 0.0)
    {
        return Err(EngineError::infeasible(format!(
            "max volatility {max} is negative"
        )));
    }
    Ok(())
}

/// Highest `w·μ` over the feasible region: start at the lower bounds and fill
/// the highest-returning assets first
#[must_use]
pub fn max_achievable_return(expected_returns: &[f64], bounds: &[WeightBounds]) -> f64 {
    let mut order: Vec<usize> = (0..expected_returns.len()).collect();
    order.sort_by(|&a, &b| expected_returns[b].total_cmp(&expected_returns[a]));

    let mut remaining = 1.0 - bounds.iter().map(|b| b.low).sum::<f64>();
    let mut total: f64 = expected_returns
        .iter()
        .zip(bounds)
        .map(|(r, b)| r * b.low)
        .sum();
    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let add = (bounds[i].high - bounds[i].low).min(remaining);
        total += add * expected_returns[i];
        remaining -= add;
    }
    total
}

/// Euclidean projection of `x` onto the bounded simplex.
///
/// Requires `Σlow ≤ 1 ≤ Σhigh`; the result sums to one and respects every bound.
#[must_use]
pub fn project(x: &[f64], bounds: &[WeightBounds]) -> Vec<f64> {
    let weights_at = |tau: f64| -> Vec<f64> {
        x.iter()
            .zip(bounds)
            .map(|(xi, b)| b.clamp(xi - tau))
            .collect()
    };
    let sum_at = |tau: f64| -> f64 { x.iter().zip(bounds).map(|(xi, b)| b.clamp(xi - tau)).sum() };

    // Σ clamp(x_i - τ) is non-increasing in τ: at `lo` every weight sits at
    // its upper bound, at `hi` every weight sits at its lower bound
    let mut lo = x
        .iter()
        .zip(bounds)
        .map(|(xi, b)| xi - b.high)
        .fold(f64::INFINITY, f64::min);
    let mut hi = x
        .iter()
        .zip(bounds)
        .map(|(xi, b)| xi - b.low)
        .fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        return bounds.iter().map(|b| b.low).collect();
    }

    for _ in 0..PROJECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if sum_at(mid) > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
            break;
        }
    }
    weights_at(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_only(n: usize) -> Vec<WeightBounds> {
        vec![WeightBounds::long_only(); n]
    }

    #[test]
    fn test_project_onto_simplex() {
        let w = project(&[0.5, 0.5, 0.5], &long_only(3));
        for wi in &w {
            assert!((wi - 1.0 / 3.0).abs() < 1e-9);
        }

        let w = project(&[2.0, -1.0], &long_only(2));
        assert!((w[0] - 1.0).abs() < 1e-9);
        assert!(w[1].abs() < 1e-9);
    }

    #[test]
    fn test_project_respects_bounds() {
        let bounds = vec![WeightBounds::new(0.1, 0.5), WeightBounds::new(0.2, 0.9)];
        let w = project(&[5.0, 0.0], &bounds);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((w[0] - 0.5).abs() < 1e-9);
        assert!(bounds.iter().zip(&w).all(|(b, wi)| b.contains(*wi)));
    }

    #[test]
    fn test_max_achievable_return() {
        let bounds = vec![WeightBounds::new(0.0, 0.7), WeightBounds::long_only()];
        assert!((max_achievable_return(&[0.10, 0.05], &bounds) - 0.085).abs() < 1e-12);
    }

    #[test]
    fn test_violation() {
        let constraints = OptimizationConstraints::default()
            .with_target_return(0.08)
            .with_max_volatility(0.1);
        assert_eq!(constraints.violation(0.09, 0.05), 0.0);
        assert!((constraints.violation(0.07, 0.12) - 0.03).abs() < 1e-12);
        assert!(!constraints.satisfied_by(0.07, 0.05, 1e-6));
    }
}
