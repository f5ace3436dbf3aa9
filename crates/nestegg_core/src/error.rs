//! Error taxonomy for the portfolio engine.

/// Errors reported by the estimation, optimization and simulation components.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// An asset has fewer than two usable observations
    #[error("insufficient data for {asset}: {observations} observation(s), at least 2 required")]
    InsufficientData { asset: String, observations: usize },

    /// Series or matrices that must share a shape do not
    #[error("inconsistent series: {reason}")]
    InconsistentSeries { reason: String },

    /// No allocation satisfies the requested bounds and constraints
    #[error("infeasible constraints: {reason}")]
    InfeasibleConstraints { reason: String },

    /// Contribution schedule cannot be simulated
    #[error("invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Simulation was cancelled or ran past its deadline
    #[error("simulation cancelled")]
    Cancelled,

    #[error("invalid distribution parameters (mean={mean}, std_dev={std_dev}): {reason}")]
    InvalidDistributionParameters {
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },

    /// Allocation references an asset the return model does not know
    #[error("asset {0:?} is not part of the return model")]
    UnknownAsset(String),

    /// An external market-data collaborator failed
    #[error("market data unavailable for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        EngineError::InconsistentSeries {
            reason: reason.into(),
        }
    }

    pub(crate) fn infeasible(reason: impl Into<String>) -> Self {
        EngineError::InfeasibleConstraints {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_schedule(reason: impl Into<String>) -> Self {
        EngineError::InvalidSchedule {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
