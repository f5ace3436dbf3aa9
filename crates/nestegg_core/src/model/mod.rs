mod allocation;
mod recommendation;
mod results;
mod returns;
mod scenario;

pub use allocation::{Allocation, WeightBounds};
pub use recommendation::{
    AllocationStrategy, AssetMetadata, BasketEntry, InvestmentOption, RecommendationPayload,
    RiskTier,
};
pub use results::{
    CONTRIBUTION_PERCENTILES, GROWTH_PERCENTILES, GrowthSimulation, PercentilePath,
    SimulationResult,
};
pub use returns::{AssetReturnSeries, PortfolioStats, ReturnModel};
pub use scenario::{
    ComparisonResult, Insight, InsightKind, InsightPriority, PathPairing, Scenario,
    ScenarioComparison, ScenarioOutcome,
};
