//! Monte Carlo simulation of portfolio value paths
//!
//! Two modes share one batched path runner:
//! - growth: compound i.i.d. normal periodic returns on a lump sum
//! - contributions: add a monthly deposit, then apply a normal monthly return,
//!   flooring the running value at zero
//!
//! Paths are split into batches. Each batch gets a seed drawn in order from a
//! master `SmallRng`, and each path gets its own seed from its batch stream, so
//! results depend only on the master seed and never on thread scheduling. The
//! `parallel` feature runs batches on rayon; without it the same schedule runs
//! sequentially and produces identical output.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::metrics::sharpe_ratio;
use crate::model::{
    Allocation, CONTRIBUTION_PERCENTILES, GROWTH_PERCENTILES, GrowthSimulation, PercentilePath,
    PortfolioStats, ReturnModel, SimulationResult,
};
use crate::progress::SimulationProgress;
use crate::statistics::{percentile_of_sorted, sorted};

const MONTHS_PER_YEAR: u32 = 12;

/// How far `years × 12` may sit from an integer and still count as whole months
const WHOLE_MONTH_TOLERANCE: f64 = 1e-9;

fn default_initial_value() -> f64 {
    1.0
}

/// Inputs for a lump-sum growth simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Annual portfolio expected return
    pub expected_return: f64,
    /// Annual portfolio volatility
    pub volatility: f64,
    pub years: f64,
    /// Starting value of every path (1.0 reports growth multiples)
    #[serde(default = "default_initial_value")]
    pub initial_value: f64,
    /// Also report percentile values at every year end
    #[serde(default)]
    pub record_yearly_paths: bool,
}

impl GrowthParams {
    #[must_use]
    pub fn new(expected_return: f64, volatility: f64, years: f64) -> Self {
        Self {
            expected_return,
            volatility,
            years,
            initial_value: default_initial_value(),
            record_yearly_paths: false,
        }
    }

    /// Aggregate `allocation` through `model`: `μ_p = w·μ`, `σ_p = sqrt(wᵀΣw)`
    pub fn from_allocation(
        model: &ReturnModel,
        allocation: &Allocation,
        years: f64,
    ) -> Result<Self> {
        let weights = model.weights_for(allocation)?;
        Ok(Self::new(
            model.portfolio_return(&weights),
            model.portfolio_volatility(&weights),
            years,
        ))
    }

    #[must_use]
    pub fn with_initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    #[must_use]
    pub fn with_yearly_paths(mut self) -> Self {
        self.record_yearly_paths = true;
        self
    }
}

/// Deposit schedule for a contribution simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionSchedule {
    #[serde(default)]
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub years: f64,
}

impl ContributionSchedule {
    #[must_use]
    pub fn new(initial_investment: f64, monthly_contribution: f64, years: f64) -> Self {
        Self {
            initial_investment,
            monthly_contribution,
            years,
        }
    }

    /// Number of monthly steps, validating the schedule
    pub fn months(&self) -> Result<usize> {
        if !(self.years.is_finite() && self.years > 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "years must be positive, got {}",
                self.years
            )));
        }
        if !(self.monthly_contribution.is_finite() && self.monthly_contribution >= 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "monthly contribution must be non-negative, got {}",
                self.monthly_contribution
            )));
        }
        if !(self.initial_investment.is_finite() && self.initial_investment >= 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "initial investment must be non-negative, got {}",
                self.initial_investment
            )));
        }
        let exact = self.years * f64::from(MONTHS_PER_YEAR);
        let months = exact.round();
        if months < 1.0 {
            return Err(EngineError::invalid_schedule(format!(
                "{} years is shorter than one month",
                self.years
            )));
        }
        if (exact - months).abs() > WHOLE_MONTH_TOLERANCE {
            return Err(EngineError::invalid_schedule(format!(
                "{} years is not a whole number of months",
                self.years
            )));
        }
        Ok(months as usize)
    }

    /// `initial + monthly × months`
    pub fn total_contributions(&self) -> Result<f64> {
        let months = self.months()?;
        Ok(self.initial_investment + self.monthly_contribution * months as f64)
    }
}

/// Normal distribution of one period's return given annual figures
fn periodic_distribution(
    expected_return: f64,
    volatility: f64,
    periods_per_year: u32,
) -> Result<Normal<f64>> {
    if !(expected_return.is_finite() && expected_return > -1.0) {
        return Err(EngineError::InvalidDistributionParameters {
            mean: expected_return,
            std_dev: volatility,
            reason: "expected return must be finite and greater than -100%",
        });
    }
    let periods = f64::from(periods_per_year);
    let mean = (1.0 + expected_return).powf(1.0 / periods) - 1.0;
    let std_dev = volatility / periods.sqrt();
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(EngineError::InvalidDistributionParameters {
            mean: expected_return,
            std_dev: volatility,
            reason: "volatility must be non-negative and finite",
        });
    }
    Normal::new(mean, std_dev).map_err(|_| EngineError::InvalidDistributionParameters {
        mean: expected_return,
        std_dev: volatility,
        reason: "volatility must be non-negative and finite",
    })
}

/// Seeded, batched Monte Carlo engine
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: EngineConfig,
    progress: Option<SimulationProgress>,
}

impl MonteCarloSimulator {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report progress to, and honor cancellation from, `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: SimulationProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.config.simulations = simulations;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Configured seed, or a fresh one from process entropy
    #[must_use]
    pub fn resolve_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(|| rand::rng().random())
    }

    /// Mode A: lump-sum growth without contributions
    pub fn simulate_growth(&self, params: &GrowthParams) -> Result<GrowthSimulation> {
        self.simulate_growth_seeded(params, self.resolve_seed())
    }

    pub fn simulate_growth_seeded(
        &self,
        params: &GrowthParams,
        seed: u64,
    ) -> Result<GrowthSimulation> {
        self.config.validate()?;
        if !(params.years.is_finite() && params.years > 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "years must be positive, got {}",
                params.years
            )));
        }
        if !(params.initial_value.is_finite() && params.initial_value >= 0.0) {
            return Err(EngineError::invalid_schedule(format!(
                "initial value must be non-negative, got {}",
                params.initial_value
            )));
        }
        let ppy = self.config.periods_per_year;
        let dist = periodic_distribution(params.expected_return, params.volatility, ppy)?;
        let periods = (params.years * f64::from(ppy)).round() as usize;
        if periods == 0 {
            return Err(EngineError::invalid_schedule(format!(
                "{} years is shorter than one period",
                params.years
            )));
        }
        let checkpoint_every = ppy as usize;
        let record = params.record_yearly_paths;
        let initial = params.initial_value;

        debug!(
            expected_return = params.expected_return,
            volatility = params.volatility,
            periods,
            simulations = self.config.simulations,
            seed,
            "Running growth simulation"
        );

        let paths = self.run_paths(seed, |rng| {
            let mut value = initial;
            let mut checkpoints = Vec::new();
            if record {
                checkpoints.reserve(periods / checkpoint_every + 1);
                checkpoints.push(value);
            }
            for period in 1..=periods {
                value *= 1.0 + dist.sample(rng);
                if record && period % checkpoint_every == 0 {
                    checkpoints.push(value);
                }
            }
            (value, checkpoints)
        })?;

        let percentile_paths = record.then(|| yearly_percentiles(&paths, &GROWTH_PERCENTILES));
        let final_values: Vec<f64> = paths.into_iter().map(|(v, _)| v).collect();

        Ok(GrowthSimulation {
            result: SimulationResult::from_final_values(final_values, &GROWTH_PERCENTILES, initial),
            stats: PortfolioStats {
                expected_return: params.expected_return,
                volatility: params.volatility,
                sharpe_ratio: sharpe_ratio(
                    params.expected_return,
                    params.volatility,
                    self.config.risk_free_rate,
                ),
            },
            years: params.years,
            periods,
            percentile_paths,
        })
    }

    /// Mode B: monthly contribution schedule
    pub fn simulate_contributions(
        &self,
        expected_return: f64,
        volatility: f64,
        schedule: &ContributionSchedule,
    ) -> Result<SimulationResult> {
        self.simulate_contributions_seeded(
            expected_return,
            volatility,
            schedule,
            self.resolve_seed(),
        )
    }

    pub fn simulate_contributions_seeded(
        &self,
        expected_return: f64,
        volatility: f64,
        schedule: &ContributionSchedule,
        seed: u64,
    ) -> Result<SimulationResult> {
        self.config.validate()?;
        let months = schedule.months()?;
        let dist = periodic_distribution(expected_return, volatility, MONTHS_PER_YEAR)?;
        let initial = schedule.initial_investment;
        let monthly = schedule.monthly_contribution;

        debug!(
            expected_return,
            volatility,
            months,
            monthly,
            simulations = self.config.simulations,
            seed,
            "Running contribution simulation"
        );

        let final_values = self.run_paths(seed, |rng| {
            let mut value = initial;
            for _ in 0..months {
                value = ((value + monthly) * (1.0 + dist.sample(rng))).max(0.0);
            }
            value
        })?;

        Ok(SimulationResult::from_final_values(
            final_values,
            &CONTRIBUTION_PERCENTILES,
            schedule.total_contributions()?,
        ))
    }

    /// Mode B for an allocation aggregated through a return model
    pub fn simulate_allocation_contributions(
        &self,
        model: &ReturnModel,
        allocation: &Allocation,
        schedule: &ContributionSchedule,
    ) -> Result<SimulationResult> {
        let weights = model.weights_for(allocation)?;
        self.simulate_contributions(
            model.portfolio_return(&weights),
            model.portfolio_volatility(&weights),
            schedule,
        )
    }

    /// Run `config.simulations` paths in batches, returning them in path order.
    ///
    /// All-or-nothing: a cancellation observed between batches discards every
    /// finished batch and fails with `Cancelled`.
    fn run_paths<T, F>(&self, seed: u64, path: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&mut SmallRng) -> T + Sync,
    {
        let simulations = self.config.simulations;
        let batch_size = self.config.batch_size.max(1);
        let num_batches = simulations.div_ceil(batch_size);

        let mut master = SmallRng::seed_from_u64(seed);
        let batch_seeds: Vec<u64> = (0..num_batches).map(|_| master.next_u64()).collect();

        let progress = self.progress.clone().unwrap_or_default();
        progress.add_total(simulations);

        let run_batch = |(i, batch_seed): (usize, &u64)| -> Option<Vec<T>> {
            if progress.is_cancelled() {
                return None;
            }
            let len = if i + 1 == num_batches {
                simulations - i * batch_size
            } else {
                batch_size
            };
            let mut rng = SmallRng::seed_from_u64(*batch_seed);
            let paths = (0..len)
                .map(|_| {
                    let mut path_rng = SmallRng::seed_from_u64(rng.next_u64());
                    path(&mut path_rng)
                })
                .collect();
            progress.advance(len);
            Some(paths)
        };

        #[cfg(feature = "parallel")]
        let batches: Option<Vec<Vec<T>>> =
            batch_seeds.par_iter().enumerate().map(run_batch).collect();

        #[cfg(not(feature = "parallel"))]
        let batches: Option<Vec<Vec<T>>> = batch_seeds.iter().enumerate().map(run_batch).collect();

        match batches {
            Some(batches) => Ok(batches.into_iter().flatten().collect()),
            None => {
                warn!(
                    completed = progress.completed(),
                    total = progress.total(),
                    "Simulation cancelled"
                );
                Err(EngineError::Cancelled)
            }
        }
    }
}

/// Cross-sectional percentiles at each recorded checkpoint
fn yearly_percentiles(paths: &[(f64, Vec<f64>)], percentiles: &[f64]) -> Vec<PercentilePath> {
    let checkpoints = paths.first().map_or(0, |(_, c)| c.len());
    let columns: Vec<Vec<f64>> = (0..checkpoints)
        .map(|k| sorted(&paths.iter().map(|(_, c)| c[k]).collect::<Vec<_>>()))
        .collect();

    percentiles
        .iter()
        .map(|&p| PercentilePath {
            percentile: p,
            values: columns.iter().map(|col| percentile_of_sorted(col, p)).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(simulations: usize) -> MonteCarloSimulator {
        MonteCarloSimulator::new(EngineConfig::default().with_simulations(simulations))
    }

    #[test]
    fn test_periodic_distribution_rejects_bad_inputs() {
        assert!(periodic_distribution(-1.5, 0.1, 12).is_err());
        assert!(periodic_distribution(0.07, -0.1, 12).is_err());
        assert!(periodic_distribution(0.07, f64::NAN, 12).is_err());
        assert!(periodic_distribution(0.07, 0.0, 12).is_ok());
    }

    #[test]
    fn test_schedule_validation() {
        assert_eq!(ContributionSchedule::new(0.0, 100.0, 10.0).months(), Ok(120));
        assert!(matches!(
            ContributionSchedule::new(0.0, 100.0, 0.0).months(),
            Err(EngineError::InvalidSchedule { .. })
        ));
        assert!(matches!(
            ContributionSchedule::new(0.0, -1.0, 5.0).months(),
            Err(EngineError::InvalidSchedule { .. })
        ));
        assert!(ContributionSchedule::new(0.0, 100.0, 0.01).months().is_err());
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let schedule = ContributionSchedule::new(0.0, 100.0, 1.0);
        let result = simulator(10)
            .simulate_contributions_seeded(0.0, 0.0, &schedule, 1)
            .unwrap();
        assert!(result.final_values.iter().all(|v| (v - 1200.0).abs() < 1e-9));
        assert_eq!(result.std_dev, 0.0);
    }

    #[test]
    fn test_batch_remainder_yields_exact_count() {
        let sim = MonteCarloSimulator::new(EngineConfig {
            simulations: 250,
            batch_size: 100,
            ..Default::default()
        });
        let growth = sim
            .simulate_growth_seeded(&GrowthParams::new(0.05, 0.1, 1.0), 3)
            .unwrap();
        assert_eq!(growth.result.num_paths(), 250);
        assert_eq!(growth.periods, 252);
    }

    #[test]
    fn test_cancelled_before_start() {
        let progress = SimulationProgress::new();
        progress.cancel();
        let sim = simulator(100).with_progress(progress);
        let schedule = ContributionSchedule::new(0.0, 100.0, 1.0);
        assert_eq!(
            sim.simulate_contributions_seeded(0.07, 0.15, &schedule, 1),
            Err(EngineError::Cancelled)
        );
    }
}
