//! Return estimation
//!
//! Turns aligned periodic return histories into an annualized [`ReturnModel`].
//! Expected returns compound the mean periodic return over a year; covariance
//! is the sample covariance scaled linearly by the number of periods.

use tracing::debug;

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::{EngineError, Result};
use crate::metrics::annualize_return;
use crate::model::{AssetReturnSeries, ReturnModel};
use crate::statistics::{mean, sample_covariance};

/// Estimates annualized return models from periodic return series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnEstimator {
    periods_per_year: u32,
}

impl Default for ReturnEstimator {
    fn default() -> Self {
        Self::new(TRADING_DAYS_PER_YEAR)
    }
}

impl ReturnEstimator {
    #[must_use]
    pub const fn new(periods_per_year: u32) -> Self {
        Self { periods_per_year }
    }

    #[must_use]
    pub const fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    pub fn estimate(&self, series: &AssetReturnSeries) -> Result<ReturnModel> {
        estimate(series, self.periods_per_year)
    }
}

/// Estimate a `ReturnModel` from `series` observed `periods_per_year` times a year.
///
/// Series must already be aligned (see [`AssetReturnSeries::from_dated`] and
/// [`AssetReturnSeries::drop_gaps`]); misaligned lengths fail with
/// `InconsistentSeries` and fewer than two observations with `InsufficientData`.
pub fn estimate(series: &AssetReturnSeries, periods_per_year: u32) -> Result<ReturnModel> {
    if periods_per_year == 0 {
        return Err(EngineError::Config(
            "periods_per_year must be at least 1".to_string(),
        ));
    }
    if series.assets.is_empty() {
        return Err(EngineError::inconsistent("no asset series supplied"));
    }

    let observations = series.observations()?;
    if observations < 2 {
        return Err(EngineError::InsufficientData {
            asset: series.assets[0].clone(),
            observations,
        });
    }

    debug!(
        assets = series.num_assets(),
        observations, periods_per_year, "Estimating return model"
    );

    let expected_returns = series
        .returns
        .iter()
        .map(|col| annualize_return(mean(col), periods_per_year))
        .collect();

    let scale = f64::from(periods_per_year);
    let n = series.num_assets();
    let mut covariance = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let c = sample_covariance(&series.returns[i], &series.returns[j]) * scale;
            covariance[i][j] = c;
            covariance[j][i] = c;
        }
    }

    ReturnModel::new(series.assets.clone(), expected_returns, covariance)
}
