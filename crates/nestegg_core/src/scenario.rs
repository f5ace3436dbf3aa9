//! What-if scenario comparison
//!
//! Every scenario is simulated independently with the contribution-schedule
//! simulator using its own return and volatility. Alternatives are then
//! compared with the base (always alternative minus base) and the deltas are
//! turned into qualitative insights using fixed thresholds.
//!
//! `better_outcome_probability` compares paths by index. Under
//! [`PathPairing::Independent`] every scenario draws its own random stream, so
//! the figure estimates P(alternative > base) for independent outcomes. Under
//! [`PathPairing::CommonRandomNumbers`] every scenario replays the base
//! scenario's stream, so each pair differs only by the scenario parameters.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{
    Allocation, ComparisonResult, Insight, InsightKind, InsightPriority, PathPairing, RiskTier,
    Scenario, ScenarioComparison, ScenarioOutcome, SimulationResult,
};
use crate::progress::SimulationProgress;
use crate::simulation::{ContributionSchedule, MonteCarloSimulator};

/// Percent change in mean value above which an alternative is flagged
const SIGNIFICANT_CHANGE_PCT: f64 = 10.0;
const HIGH_SUCCESS_PCT: f64 = 70.0;
const LOW_SUCCESS_PCT: f64 = 30.0;

/// Base-mean magnitude below which percent change is reported as 0
const ZERO_MEAN_EPSILON: f64 = 1e-12;

/// Allocation (in percent), expected return and volatility for a tier
#[must_use]
pub fn tier_profile(tier: RiskTier) -> (Allocation, f64, f64) {
    let (stocks, bonds, cash, expected_return, volatility) = match tier {
        RiskTier::Conservative => (30.0, 60.0, 10.0, 0.05, 0.08),
        RiskTier::Moderate => (60.0, 35.0, 5.0, 0.07, 0.12),
        RiskTier::Aggressive => (85.0, 15.0, 0.0, 0.10, 0.18),
    };
    let allocation = Allocation::new()
        .with("Stocks", stocks)
        .with("Bonds", bonds)
        .with("Cash", cash);
    (allocation, expected_return, volatility)
}

/// Runs and compares scenario simulations
#[derive(Debug, Clone, Default)]
pub struct ScenarioComparator {
    simulator: MonteCarloSimulator,
    pairing: PathPairing,
}

impl ScenarioComparator {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            simulator: MonteCarloSimulator::new(config),
            pairing: PathPairing::default(),
        }
    }

    #[must_use]
    pub fn with_pairing(mut self, pairing: PathPairing) -> Self {
        self.pairing = pairing;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: SimulationProgress) -> Self {
        self.simulator = self.simulator.with_progress(progress);
        self
    }

    #[must_use]
    pub fn pairing(&self) -> PathPairing {
        self.pairing
    }

    /// Simulate `base` and every alternative for `years` (unless a scenario
    /// overrides it) with `simulations` paths each
    pub fn compare(
        &self,
        base: &Scenario,
        alternatives: &[Scenario],
        years: f64,
        simulations: usize,
    ) -> Result<ScenarioComparison> {
        let seed = self.simulator.resolve_seed();
        self.compare_seeded(base, alternatives, years, simulations, seed)
    }

    pub fn compare_seeded(
        &self,
        base: &Scenario,
        alternatives: &[Scenario],
        years: f64,
        simulations: usize,
        seed: u64,
    ) -> Result<ScenarioComparison> {
        let simulator = self.simulator.clone().with_simulations(simulations);
        let seeds = self.scenario_seeds(seed, alternatives.len());

        debug!(
            alternatives = alternatives.len(),
            years,
            simulations,
            pairing = ?self.pairing,
            "Comparing scenarios"
        );

        let base_outcome = simulate_scenario(&simulator, base, years, seeds[0])?;
        let alternative_outcomes = alternatives
            .iter()
            .zip(&seeds[1..])
            .map(|(scenario, &s)| simulate_scenario(&simulator, scenario, years, s))
            .collect::<Result<Vec<_>>>()?;

        let deltas: Vec<ComparisonResult> = alternative_outcomes
            .iter()
            .enumerate()
            .map(|(i, alt)| compare_outcomes(i, &base_outcome, alt))
            .collect();
        let insights = derive_insights(&deltas);

        Ok(ScenarioComparison {
            base: base_outcome,
            alternatives: alternative_outcomes,
            deltas,
            insights,
            pairing: self.pairing,
        })
    }

    /// Same plan at `base_monthly` versus each alternative contribution
    pub fn contribution_changes(
        &self,
        base_monthly: f64,
        alternatives: &[f64],
        params: &Scenario,
        years: f64,
    ) -> Result<ScenarioComparison> {
        let base = params
            .clone()
            .with_monthly_contribution(base_monthly)
            .named(format!("{base_monthly:.0}/month"));
        let scenarios: Vec<Scenario> = alternatives
            .iter()
            .map(|&amount| {
                params
                    .clone()
                    .with_monthly_contribution(amount)
                    .named(format!("{amount:.0}/month"))
            })
            .collect();
        self.compare(&base, &scenarios, years, self.simulator.config().simulations)
    }

    /// Current allocation versus the fixed profile of each tier
    pub fn risk_tolerance_changes(
        &self,
        base_allocation: &Allocation,
        tiers: &[RiskTier],
        params: &Scenario,
        years: f64,
    ) -> Result<ScenarioComparison> {
        let base = params
            .clone()
            .with_allocation(base_allocation.clone())
            .named("current");
        let scenarios: Vec<Scenario> = tiers
            .iter()
            .map(|&tier| {
                let (allocation, expected_return, volatility) = tier_profile(tier);
                params
                    .clone()
                    .with_allocation(allocation.normalized())
                    .with_return_profile(expected_return, volatility)
                    .named(tier.as_str())
            })
            .collect();
        self.compare(&base, &scenarios, years, self.simulator.config().simulations)
    }

    /// Independent simulation of the same plan at each horizon, keyed by years.
    ///
    /// Runs the configured number of paths per horizon (1000 by default).
    pub fn time_horizon_impact(
        &self,
        params: &Scenario,
        horizons: &[u32],
    ) -> Result<BTreeMap<u32, SimulationResult>> {
        let simulator = &self.simulator;
        horizons
            .iter()
            .map(|&years| {
                let schedule = ContributionSchedule::new(
                    params.initial_investment,
                    params.monthly_contribution,
                    f64::from(years),
                );
                let result = simulator.simulate_contributions(
                    params.expected_return,
                    params.volatility,
                    &schedule,
                )?;
                Ok((years, result))
            })
            .collect()
    }

    /// Base seed followed by one seed per alternative
    fn scenario_seeds(&self, seed: u64, alternatives: usize) -> Vec<u64> {
        match self.pairing {
            PathPairing::CommonRandomNumbers => vec![seed; alternatives + 1],
            PathPairing::Independent => {
                let mut master = SmallRng::seed_from_u64(seed);
                (0..=alternatives).map(|_| master.next_u64()).collect()
            }
        }
    }
}

impl Scenario {
    #[must_use]
    fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

fn simulate_scenario(
    simulator: &MonteCarloSimulator,
    scenario: &Scenario,
    years: f64,
    seed: u64,
) -> Result<ScenarioOutcome> {
    let years = scenario.years.unwrap_or(years);
    let schedule = ContributionSchedule::new(
        scenario.initial_investment,
        scenario.monthly_contribution,
        years,
    );
    let result = simulator.simulate_contributions_seeded(
        scenario.expected_return,
        scenario.volatility,
        &schedule,
        seed,
    )?;
    Ok(ScenarioOutcome {
        name: scenario.name.clone(),
        years,
        result,
    })
}

/// Deltas of `alternative` relative to `base`
#[must_use]
pub fn compare_outcomes(
    index: usize,
    base: &ScenarioOutcome,
    alternative: &ScenarioOutcome,
) -> ComparisonResult {
    let (b, a) = (&base.result, &alternative.result);
    let mean_value_pct_change = if b.mean_value.abs() < ZERO_MEAN_EPSILON {
        0.0
    } else {
        (a.mean_value / b.mean_value - 1.0) * 100.0
    };

    ComparisonResult {
        alternative: index,
        name: alternative.name.clone(),
        mean_value_delta: a.mean_value - b.mean_value,
        mean_value_pct_change,
        risk_delta: a.std_dev - b.std_dev,
        prob_loss_delta: a.probability_of_loss - b.probability_of_loss,
        better_outcome_probability: better_outcome_probability(&b.final_values, &a.final_values),
    }
}

/// Percent of index-aligned pairs where `alternative` ends higher; ties count half
#[must_use]
pub fn better_outcome_probability(base: &[f64], alternative: &[f64]) -> f64 {
    let pairs = base.len().min(alternative.len());
    if pairs == 0 {
        return 0.0;
    }
    let wins: f64 = base
        .iter()
        .zip(alternative)
        .map(|(b, a)| match a.total_cmp(b) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        })
        .sum();
    wins / pairs as f64 * 100.0
}

/// Qualitative insights for each comparison, in input order
#[must_use]
pub fn derive_insights(deltas: &[ComparisonResult]) -> Vec<Insight> {
    let mut insights = Vec::new();
    for delta in deltas {
        let change = delta.mean_value_pct_change;
        if change > SIGNIFICANT_CHANGE_PCT {
            insights.push(Insight {
                alternative: delta.alternative,
                title: "Significant Improvement Potential".to_string(),
                description: format!(
                    "This scenario could increase your expected portfolio value by {change:.1}%."
                ),
                priority: InsightPriority::High,
                kind: InsightKind::Opportunity,
            });
        } else if change < -SIGNIFICANT_CHANGE_PCT {
            insights.push(Insight {
                alternative: delta.alternative,
                title: "Potential Downside Risk".to_string(),
                description: format!(
                    "This scenario could decrease your expected portfolio value by {:.1}%.",
                    change.abs()
                ),
                priority: InsightPriority::High,
                kind: InsightKind::Risk,
            });
        }

        let better = delta.better_outcome_probability;
        if better > HIGH_SUCCESS_PCT {
            insights.push(Insight {
                alternative: delta.alternative,
                title: "High Success Probability".to_string(),
                description: format!(
                    "This scenario has a {better:.1}% chance of outperforming your current plan."
                ),
                priority: InsightPriority::Medium,
                kind: InsightKind::Opportunity,
            });
        } else if better < LOW_SUCCESS_PCT {
            insights.push(Insight {
                alternative: delta.alternative,
                title: "Lower Success Probability".to_string(),
                description: format!(
                    "This scenario has only a {better:.1}% chance of outperforming your current plan."
                ),
                priority: InsightPriority::Medium,
                kind: InsightKind::Warning,
            });
        }
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(pct: f64, better: f64) -> ComparisonResult {
        ComparisonResult {
            alternative: 0,
            name: "alt".to_string(),
            mean_value_delta: 0.0,
            mean_value_pct_change: pct,
            risk_delta: 0.0,
            prob_loss_delta: 0.0,
            better_outcome_probability: better,
        }
    }

    #[test]
    fn test_better_outcome_counts_ties_half() {
        assert_eq!(better_outcome_probability(&[1.0, 2.0], &[1.0, 2.0]), 50.0);
        assert_eq!(better_outcome_probability(&[1.0, 2.0], &[2.0, 1.0]), 50.0);
        assert_eq!(better_outcome_probability(&[1.0, 1.0], &[2.0, 2.0]), 100.0);
        assert_eq!(better_outcome_probability(&[], &[]), 0.0);
    }

    #[test]
    fn test_insight_thresholds_are_strict() {
        assert!(derive_insights(&[delta(10.0, 70.0)]).is_empty());
        assert!(derive_insights(&[delta(-10.0, 30.0)]).is_empty());

        let insights = derive_insights(&[delta(12.34, 75.0)]);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].title, "Significant Improvement Potential");
        assert_eq!(
            insights[0].description,
            "This scenario could increase your expected portfolio value by 12.3%."
        );
        assert_eq!(insights[0].priority, InsightPriority::High);
        assert_eq!(insights[1].kind, InsightKind::Opportunity);
        assert_eq!(
            insights[1].description,
            "This scenario has a 75.0% chance of outperforming your current plan."
        );
    }

    #[test]
    fn test_downside_insights() {
        let insights = derive_insights(&[delta(-15.0, 20.0)]);
        assert_eq!(insights[0].title, "Potential Downside Risk");
        assert_eq!(
            insights[0].description,
            "This scenario could decrease your expected portfolio value by 15.0%."
        );
        assert_eq!(insights[0].kind, InsightKind::Risk);
        assert_eq!(insights[1].title, "Lower Success Probability");
        assert_eq!(insights[1].kind, InsightKind::Warning);
        assert_eq!(
            insights[1].description,
            "This scenario has only a 20.0% chance of outperforming your current plan."
        );
    }

    #[test]
    fn test_tier_profiles() {
        let (allocation, ret, vol) = tier_profile(RiskTier::Aggressive);
        assert_eq!(allocation.get("Stocks"), Some(85.0));
        assert_eq!((ret, vol), (0.10, 0.18));
        assert!((allocation.normalized().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_crn_seeds_repeat() {
        let comparator =
            ScenarioComparator::default().with_pairing(PathPairing::CommonRandomNumbers);
        assert_eq!(comparator.scenario_seeds(7, 2), vec![7, 7, 7]);

        let independent = ScenarioComparator::default();
        let seeds = independent.scenario_seeds(7, 2);
        assert_eq!(seeds.len(), 3);
        assert_ne!(seeds[0], seeds[1]);
    }
}
