//! Integration tests for the nestegg engine
//!
//! Tests are organized by topic:
//! - `estimation` - Return models estimated from histories
//! - `optimization` - Max-Sharpe search, constraints and the frontier
//! - `simulation` - Growth and contribution Monte Carlo
//! - `scenarios` - Scenario comparison and insights
//! - `recommendation` - Recommendation assembly over market-data providers
//! - `end_to_end` - Full workflows with fixed seeds

mod estimation;
mod simulation;
