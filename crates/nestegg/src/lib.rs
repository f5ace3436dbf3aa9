//! Headless batch runner for the nestegg engine
//!
//! Reads one YAML or JSON request, runs the matching core operation and writes
//! the result as JSON. Settings files carry the engine configuration and
//! logging options; command-line flags override them.

pub mod logging;
pub mod request;
pub mod runner;
pub mod settings;

pub use logging::init_logging;
pub use request::{Request, RequestError};
pub use runner::{run, run_to};
pub use settings::{Overrides, Settings};
