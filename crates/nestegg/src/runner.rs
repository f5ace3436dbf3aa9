//! Executes one request against the core engine

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use nestegg_core::market_data::{DefaultBasketCatalog, MarketDataProvider, SyntheticMarketData};
use nestegg_core::optimization::{FrontierPoint, best_sample};
use nestegg_core::simulation::ContributionSchedule;
use nestegg_core::{
    EngineConfig, MonteCarloSimulator, PortfolioOptimizer, RecommendationAssembler,
    ScenarioComparator,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::request::{Request, RequestError, growth_params, recommendation_request};

/// Frontier samples plus the highest-Sharpe one
#[derive(Debug, Serialize)]
struct FrontierReport<'a> {
    points: &'a [FrontierPoint],
    best: Option<&'a FrontierPoint>,
}

/// Run `request` and return its result as JSON
pub fn run(request: &Request, config: &EngineConfig) -> Result<Value> {
    config.validate().wrap_err("Invalid engine configuration")?;
    info!(kind = request.kind(), seed = ?config.seed, "Running request");

    let value = match request {
        Request::Estimate { history } => {
            let model = history.to_model(config.periods_per_year)?;
            serde_json::to_value(&model)?
        }
        Request::Optimize {
            history,
            constraints,
        } => {
            let model = history.to_model(config.periods_per_year)?;
            let result = PortfolioOptimizer::new(config)
                .optimize(&model, constraints)
                .map_err(RequestError::from)?;
            serde_json::to_value(&result)?
        }
        Request::Frontier { history, samples } => {
            let model = history.to_model(config.periods_per_year)?;
            let points = PortfolioOptimizer::new(config).efficient_frontier(&model, *samples);
            serde_json::to_value(FrontierReport {
                points: &points,
                best: best_sample(&points),
            })?
        }
        Request::SimulateGrowth {
            profile,
            years,
            initial_value,
            yearly_paths,
        } => {
            let params = growth_params(
                profile,
                *years,
                *initial_value,
                *yearly_paths,
                config.periods_per_year,
            )?;
            let growth = MonteCarloSimulator::new(config.clone())
                .simulate_growth(&params)
                .map_err(RequestError::from)?;
            serde_json::to_value(&growth)?
        }
        Request::SimulateContributions {
            profile,
            years,
            initial_investment,
            monthly_contribution,
        } => {
            let (expected_return, volatility) = profile.resolve(config.periods_per_year)?;
            let schedule =
                ContributionSchedule::new(*initial_investment, *monthly_contribution, *years);
            let result = MonteCarloSimulator::new(config.clone())
                .simulate_contributions(expected_return, volatility, &schedule)
                .map_err(RequestError::from)?;
            serde_json::to_value(&result)?
        }
        Request::Compare {
            base,
            alternatives,
            years,
            simulations,
            pairing,
        } => {
            let comparison = ScenarioComparator::new(config.clone())
                .with_pairing(*pairing)
                .compare(
                    base,
                    alternatives,
                    *years,
                    simulations.unwrap_or(config.simulations),
                )
                .map_err(RequestError::from)?;
            serde_json::to_value(&comparison)?
        }
        Request::Recommend {
            monthly_investment,
            risk_tolerance,
            time_horizon,
            goal,
            strategy,
            market_data,
            synthetic_market_data,
        } => {
            let synthetic;
            let provider: &dyn MarketDataProvider = match (market_data, synthetic_market_data) {
                (Some(_), Some(_)) => return Err(RequestError::ConflictingMarketData.into()),
                (Some(data), None) => data,
                (None, Some(seed)) => {
                    synthetic = SyntheticMarketData::new(*seed);
                    &synthetic
                }
                (None, None) => return Err(RequestError::MissingField("market_data").into()),
            };
            let request = recommendation_request(
                *monthly_investment,
                risk_tolerance,
                time_horizon,
                goal,
                *strategy,
            );
            let payload =
                RecommendationAssembler::new(provider, &DefaultBasketCatalog, config.clone())
                    .recommend(&request)
                    .map_err(RequestError::from)?;
            serde_json::to_value(&payload)?
        }
    };
    Ok(value)
}

/// Run `request` and write pretty JSON to `output`, or stdout when `None`
pub fn run_to(request: &Request, config: &EngineConfig, output: Option<&Path>) -> Result<()> {
    let value = run(request, config)?;
    let json = serde_json::to_string_pretty(&value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .wrap_err_with(|| format!("Failed to write result to {}", path.display()))?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::request::{InlineHistory, ReturnProfile};
    use nestegg_core::model::{AllocationStrategy, PathPairing, Scenario};

    fn config() -> EngineConfig {
        EngineConfig::default().with_seed(42).with_simulations(200)
    }

    fn history() -> InlineHistory {
        let a: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.012 } else { -0.006 }).collect();
        let b: Vec<f64> = (0..60).map(|i| if i % 3 == 0 { 0.004 } else { 0.001 }).collect();
        InlineHistory {
            series: BTreeMap::from([("A".to_string(), a), ("B".to_string(), b)]),
            dates: None,
        }
    }

    #[test]
    fn test_optimize_request() {
        let request = Request::Optimize {
            history: history(),
            constraints: Default::default(),
        };
        let value = run(&request, &config()).unwrap();
        let total: f64 = value["allocation"]
            .as_object()
            .unwrap()
            .values()
            .map(|w| w.as_f64().unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(value["stats"]["sharpe_ratio"].is_number());
    }

    #[test]
    fn test_frontier_request() {
        let request = Request::Frontier {
            history: history(),
            samples: 25,
        };
        let value = run(&request, &config()).unwrap();
        assert_eq!(value["points"].as_array().unwrap().len(), 25);
        assert!(value["best"].is_object());
    }

    #[test]
    fn test_contribution_request_is_seeded() {
        let request = Request::SimulateContributions {
            profile: ReturnProfile {
                expected_return: Some(0.07),
                volatility: Some(0.15),
                ..Default::default()
            },
            years: 10.0,
            initial_investment: 1000.0,
            monthly_contribution: 100.0,
        };
        let first = run(&request, &config()).unwrap();
        let second = run(&request, &config()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["total_contributions"].as_f64(), Some(13_000.0));
    }

    #[test]
    fn test_compare_request() {
        let request = Request::Compare {
            base: Scenario::new("now"),
            alternatives: vec![Scenario::new("more").with_monthly_contribution(500.0)],
            years: 5.0,
            simulations: Some(50),
            pairing: PathPairing::CommonRandomNumbers,
        };
        let value = run(&request, &config()).unwrap();
        assert_eq!(value["deltas"][0]["better_outcome_probability"].as_f64(), Some(100.0));
        assert_eq!(value["base"]["result"]["final_values"].as_array().unwrap().len(), 50);
    }

    #[test]
    fn test_recommend_requires_explicit_market_data() {
        let recommend = |synthetic: Option<u64>| Request::Recommend {
            monthly_investment: 100.0,
            risk_tolerance: "Conservative (Low Risk)".to_string(),
            time_horizon: "3-5 years".to_string(),
            goal: String::new(),
            strategy: AllocationStrategy::Template,
            market_data: None,
            synthetic_market_data: synthetic,
        };
        assert!(run(&recommend(None), &config()).is_err());

        let value = run(&recommend(Some(3)), &config()).unwrap();
        assert_eq!(value["risk_level"], "conservative");
        assert_eq!(value["time_horizon_years"].as_f64(), Some(4.0));
    }

    #[test]
    fn test_run_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let request = Request::Estimate { history: history() };
        run_to(&request, &config(), Some(&path)).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["assets"], serde_json::json!(["A", "B"]));
    }
}
