//! Sampled efficient frontier
//!
//! Random long-only portfolios (uniform draws normalized to sum to one) scored
//! by return, volatility and Sharpe ratio. This approximates the shape of the
//! frontier for display and diagnostics; it is not the analytical frontier.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{Allocation, ReturnModel};

/// One sampled portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub volatility: f64,
    pub expected_return: f64,
    pub sharpe_ratio: f64,
    pub weights: Allocation,
}

/// Random weights summing to one; equal weights if every draw is zero
fn random_weights<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    let draws: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
    let total: f64 = draws.iter().sum();
    if total > 0.0 {
        draws.into_iter().map(|d| d / total).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}

/// Score `sample_count` random portfolios drawn from `rng`
pub fn sample_frontier<R: Rng>(
    model: &ReturnModel,
    sample_count: usize,
    risk_free_rate: f64,
    rng: &mut R,
) -> Vec<FrontierPoint> {
    (0..sample_count)
        .map(|_| {
            let weights = random_weights(model.len(), rng);
            let stats = model.stats_for_weights(&weights, risk_free_rate);
            FrontierPoint {
                volatility: stats.volatility,
                expected_return: stats.expected_return,
                sharpe_ratio: stats.sharpe_ratio,
                weights: model.allocation_from(&weights),
            }
        })
        .collect()
}

/// `sample_frontier` with a generator seeded from `seed`
pub fn sample_frontier_seeded(
    model: &ReturnModel,
    sample_count: usize,
    risk_free_rate: f64,
    seed: u64,
) -> Vec<FrontierPoint> {
    let mut rng = SmallRng::seed_from_u64(seed);
    sample_frontier(model, sample_count, risk_free_rate, &mut rng)
}

/// Highest-Sharpe sample, if any
#[must_use]
pub fn best_sample(points: &[FrontierPoint]) -> Option<&FrontierPoint> {
    points
        .iter()
        .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_weights_sum_to_one() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let w = random_weights(4, &mut rng);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(w.iter().all(|x| (0.0..=1.0).contains(x)));
        }
    }
}
