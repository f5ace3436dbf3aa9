//! Tests for the Monte Carlo simulator
//!
//! These tests verify:
//! - Growth (lump-sum) results are ordered and sized correctly
//! - Contribution schedules account for every deposit
//! - Seeds make runs reproducible independent of batch scheduling
//! - Cancellation and invalid inputs fail cleanly

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::{Allocation, ReturnModel};
use crate::progress::SimulationProgress;
use crate::simulation::{ContributionSchedule, GrowthParams, MonteCarloSimulator};

fn seeded(simulations: usize, seed: u64) -> MonteCarloSimulator {
    MonteCarloSimulator::new(EngineConfig::default().with_simulations(simulations).with_seed(seed))
}

fn is_ascending(values: &[(f64, f64)]) -> bool {
    values.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 <= w[1].1)
}

#[test]
fn test_growth_result_shape() {
    let growth = seeded(500, 7)
        .simulate_growth(&GrowthParams::new(0.07, 0.15, 5.0))
        .unwrap();
    let result = &growth.result;

    assert_eq!(result.num_paths(), 500);
    assert_eq!(growth.periods, 5 * 252);
    assert!(is_ascending(&result.percentile_values));
    assert_eq!(
        result.percentile_values.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
        vec![5.0, 25.0, 50.0, 75.0, 95.0]
    );
    assert!(result.worst_case <= result.median_value && result.median_value <= result.best_case);
    assert!(result.final_values.iter().all(|v| v.is_finite()));
    assert_eq!(result.total_contributions, 1.0);
    assert!(growth.percentile_paths.is_none());
}

#[test]
fn test_growth_mean_tracks_expected_return() {
    let growth = seeded(2000, 3)
        .simulate_growth(&GrowthParams::new(0.08, 0.10, 1.0).with_initial_value(100.0))
        .unwrap();
    // E[V_1] = 100 * 1.08; sampling error on 2000 paths is well under 1
    assert!((growth.result.mean_value - 108.0).abs() < 1.5, "{}", growth.result.mean_value);
}

#[test]
fn test_growth_yearly_paths() {
    let growth = seeded(200, 5)
        .simulate_growth(
            &GrowthParams::new(0.07, 0.15, 3.0)
                .with_initial_value(10.0)
                .with_yearly_paths(),
        )
        .unwrap();
    let paths = growth.percentile_paths.unwrap();
    assert_eq!(paths.len(), 5);
    for path in &paths {
        assert_eq!(path.values.len(), 4);
        assert_eq!(path.values[0], 10.0);
    }
    // the final checkpoint is the terminal distribution
    let median_path = paths.iter().find(|p| p.percentile == 50.0).unwrap();
    assert!((median_path.values[3] - growth.result.median_value).abs() < 1e-9);
}

#[test]
fn test_growth_from_allocation() {
    let model = ReturnModel::new(
        vec!["A".into(), "B".into()],
        vec![0.10, 0.05],
        vec![vec![0.04, 0.0], vec![0.0, 0.01]],
    )
    .unwrap();
    let allocation = Allocation::new().with("A", 0.4).with("B", 0.6);
    let params = GrowthParams::from_allocation(&model, &allocation, 2.0).unwrap();
    assert!((params.expected_return - 0.07).abs() < 1e-12);
    assert!((params.volatility - 0.1).abs() < 1e-12);

    let growth = seeded(100, 1).simulate_growth(&params).unwrap();
    assert!((growth.stats.sharpe_ratio - 0.5).abs() < 1e-6);

    let unknown = Allocation::new().with("Z", 1.0);
    assert!(matches!(
        GrowthParams::from_allocation(&model, &unknown, 2.0),
        Err(EngineError::UnknownAsset(_))
    ));
}

#[test]
fn test_contribution_totals() {
    let schedule = ContributionSchedule::new(1000.0, 100.0, 10.0);
    let result = seeded(300, 42)
        .simulate_contributions(0.07, 0.15, &schedule)
        .unwrap();

    assert_eq!(result.num_paths(), 300);
    assert_eq!(result.total_contributions, 13_000.0);
    assert!((result.mean_profit - (result.mean_value - 13_000.0)).abs() < 1e-9);
    assert!(result.final_values.iter().all(|v| *v >= 0.0));
    assert!(is_ascending(&result.percentile_values));
    assert!(result.percentile(10.0).is_some());
    assert!(result.probability_of_loss + result.probability_of_profit <= 100.0 + 1e-9);
}

#[test]
fn test_contribution_without_initial_investment() {
    let schedule = ContributionSchedule::new(0.0, 250.0, 2.0);
    let result = seeded(50, 1)
        .simulate_contributions(0.05, 0.0, &schedule)
        .unwrap();
    assert_eq!(result.total_contributions, 6000.0);
    // zero volatility: every path is identical and above what was deposited
    assert!(result.std_dev < 1e-9);
    assert_eq!(result.probability_of_profit, 100.0);
}

#[test]
fn test_same_seed_same_paths() {
    let schedule = ContributionSchedule::new(500.0, 50.0, 3.0);
    let a = seeded(250, 99).simulate_contributions(0.06, 0.2, &schedule).unwrap();
    let b = seeded(250, 99).simulate_contributions(0.06, 0.2, &schedule).unwrap();
    let c = seeded(250, 100).simulate_contributions(0.06, 0.2, &schedule).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.final_values, c.final_values);
}

#[test]
fn test_prefix_is_stable_across_path_counts() {
    // paths are generated batch by batch from the same seed stream
    let schedule = ContributionSchedule::new(0.0, 100.0, 1.0);
    let short = seeded(100, 8).simulate_contributions(0.07, 0.15, &schedule).unwrap();
    let long = seeded(300, 8).simulate_contributions(0.07, 0.15, &schedule).unwrap();
    assert_eq!(short.final_values[..], long.final_values[..100]);
}

#[test]
fn test_progress_reaches_total() {
    let progress = SimulationProgress::new();
    let sim = seeded(250, 2).with_progress(progress.clone());
    sim.simulate_contributions(0.07, 0.15, &ContributionSchedule::new(0.0, 10.0, 1.0))
        .unwrap();
    assert_eq!(progress.total(), 250);
    assert_eq!(progress.completed(), 250);
    assert!((progress.fraction() - 1.0).abs() < 1e-12);
}

#[test]
fn test_invalid_inputs() {
    let sim = seeded(10, 1);
    assert!(matches!(
        sim.simulate_contributions(0.07, 0.15, &ContributionSchedule::new(0.0, 100.0, 0.0)),
        Err(EngineError::InvalidSchedule { .. })
    ));
    assert!(matches!(
        sim.simulate_contributions(0.07, -0.2, &ContributionSchedule::new(0.0, 100.0, 1.0)),
        Err(EngineError::InvalidDistributionParameters { .. })
    ));
    assert!(matches!(
        sim.simulate_growth(&GrowthParams::new(0.07, 0.15, -1.0)),
        Err(EngineError::InvalidSchedule { .. })
    ));
    assert!(matches!(
        seeded(0, 1).simulate_growth(&GrowthParams::new(0.07, 0.15, 1.0)),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_cancellation_discards_results() {
    let progress = SimulationProgress::new();
    progress.cancel();
    let sim = seeded(1000, 4).with_progress(progress);
    assert_eq!(
        sim.simulate_growth(&GrowthParams::new(0.07, 0.15, 1.0)),
        Err(EngineError::Cancelled)
    );
}

#[test]
fn test_cancellation_after_finished_batches_discards_results() {
    let mut config = EngineConfig::default().with_simulations(20_000).with_seed(4);
    config.batch_size = 10;
    let progress = SimulationProgress::new().with_path_budget(50);
    let sim = MonteCarloSimulator::new(config).with_progress(progress.clone());

    let schedule = ContributionSchedule::new(0.0, 100.0, 1.0);
    let result = sim.simulate_contributions(0.07, 0.15, &schedule);
    assert_eq!(result, Err(EngineError::Cancelled));
    // some batches ran to completion before the stop was observed
    assert!(progress.completed() >= 50);
    assert!(progress.completed() < 20_000);
    assert_eq!(progress.total(), 20_000);
}

#[test]
fn test_partial_month_horizons_are_rejected() {
    let sim = seeded(10, 1);
    for years in [0.05, 1.0 / 24.0, 2.01] {
        assert!(matches!(
            sim.simulate_contributions(0.07, 0.15, &ContributionSchedule::new(0.0, 100.0, years)),
            Err(EngineError::InvalidSchedule { .. })
        ));
    }
    // whole months stay exact
    for (years, total) in [(0.5, 600.0), (2.5, 3000.0), (0.25, 300.0)] {
        let result = sim
            .simulate_contributions(0.07, 0.15, &ContributionSchedule::new(0.0, 100.0, years))
            .unwrap();
        assert_eq!(result.total_contributions, total);
    }
}

#[test]
fn test_growth_rejects_bad_initial_value() {
    let sim = seeded(10, 1);
    for initial in [-1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            sim.simulate_growth(&GrowthParams::new(0.07, 0.15, 1.0).with_initial_value(initial)),
            Err(EngineError::InvalidSchedule { .. })
        ));
    }
    let zero = sim
        .simulate_growth(&GrowthParams::new(0.07, 0.15, 1.0).with_initial_value(0.0))
        .unwrap();
    assert!(zero.result.final_values.iter().all(|v| *v == 0.0));
}
