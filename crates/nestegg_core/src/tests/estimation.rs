//! Tests for return estimation
//!
//! These tests verify:
//! - Covariance scaling and symmetry
//! - Perfectly correlated inputs
//! - Dated histories aligned before estimation

use crate::error::EngineError;
use crate::estimation::ReturnEstimator;
use crate::model::AssetReturnSeries;

fn alternating(amplitude: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

/// Covariance of a scaled copy is the scaled variance, annualized linearly
#[test]
fn test_covariance_scales_with_periods() {
    let series = AssetReturnSeries::new([
        ("A", alternating(0.01, 4)),
        ("B", alternating(0.02, 4)),
    ]);
    let model = ReturnEstimator::new(12).estimate(&series).unwrap();

    // mean 0, sample variance 0.0004 / 3
    let var_a = 0.0004 / 3.0 * 12.0;
    let cov = model.covariance();
    assert!((cov[0][0] - var_a).abs() < 1e-12);
    assert!((cov[1][1] - 4.0 * var_a).abs() < 1e-12);
    assert!((cov[0][1] - 2.0 * var_a).abs() < 1e-12);
    assert_eq!(cov[0][1], cov[1][0]);
    assert!(model.expected_returns().iter().all(|r| r.abs() < 1e-12));
}

/// Daily default: a constant 0.1% return compounds over 252 days
#[test]
fn test_default_estimator_is_daily() {
    let estimator = ReturnEstimator::default();
    assert_eq!(estimator.periods_per_year(), 252);

    let series = AssetReturnSeries::new([("A", vec![0.001; 10])]);
    let model = estimator.estimate(&series).unwrap();
    let expected = 1.001_f64.powi(252) - 1.0;
    assert!((model.expected_returns()[0] - expected).abs() < 1e-12);
    assert!(model.covariance()[0][0].abs() < 1e-18);
}

/// Gaps are dropped before estimation; unaligned series are rejected
#[test]
fn test_gaps_and_alignment() {
    let raw = AssetReturnSeries::new([
        ("A", vec![0.01, f64::NAN, 0.02, 0.03]),
        ("B", vec![0.00, 0.01, f64::INFINITY, 0.01]),
    ]);
    let clean = raw.drop_gaps().unwrap();
    assert_eq!(clean.observations().unwrap(), 2);
    assert!(ReturnEstimator::default().estimate(&clean).is_ok());

    let unaligned = AssetReturnSeries::new([("A", vec![0.01; 5]), ("B", vec![0.01; 4])]);
    assert!(matches!(
        ReturnEstimator::default().estimate(&unaligned),
        Err(EngineError::InconsistentSeries { .. })
    ));
}

/// Dated histories keep only shared dates
#[test]
fn test_dated_series_estimates_on_common_dates() {
    let d = |day| jiff::civil::date(2024, 1, day);
    let series = AssetReturnSeries::from_dated([
        ("A", vec![(d(2), 0.01), (d(3), -0.01), (d(4), 0.02), (d(5), 0.0)]),
        ("B", vec![(d(3), 0.02), (d(4), 0.01), (d(5), -0.01)]),
    ]);
    assert_eq!(series.observations().unwrap(), 3);
    let model = ReturnEstimator::new(252).estimate(&series).unwrap();
    assert_eq!(model.assets(), ["A".to_string(), "B".to_string()]);
}
