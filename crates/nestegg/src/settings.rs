//! Runner settings file
//!
//! A YAML (or, by `.json` extension, JSON) document holding the engine
//! configuration plus runner options:
//!
//! ```yaml
//! log_level: debug
//! log_dir: /var/log/nestegg
//! engine:
//!   seed: 42
//!   simulations: 5000
//!   optimizer:
//!     multi_start: false
//! ```

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use nestegg_core::EngineConfig;
use serde::{Deserialize, Serialize};

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Where results go when `--output` is not given; stdout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for daily-rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
    pub simulations: Option<usize>,
}

impl Settings {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).wrap_err("Failed to parse YAML settings")
    }

    /// Load from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse JSON settings")
    }

    /// Load a settings file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = if is_json(path) {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        settings
            .engine
            .validate()
            .wrap_err_with(|| format!("Invalid engine settings in {}", path.display()))?;
        Ok(settings)
    }

    /// `load` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(dir) = overrides.log_dir {
            self.log_dir = Some(dir);
        }
        if let Some(output) = overrides.output {
            self.output = Some(output);
        }
        if let Some(seed) = overrides.seed {
            self.engine.seed = Some(seed);
        }
        if let Some(simulations) = overrides.simulations {
            self.engine.simulations = simulations;
        }
        self
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_settings_with_defaults() {
        let yaml = r#"
log_level: debug
engine:
  seed: 42
  optimizer:
    multi_start: false
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.engine.seed, Some(42));
        assert_eq!(settings.engine.simulations, 1000);
        assert!(!settings.engine.optimizer.multi_start);
        assert!(settings.log_dir.is_none());
    }

    #[test]
    fn test_load_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"engine": {{"simulations": 250}}, "output": "out.json"}}"#).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.engine.simulations, 250);
        assert_eq!(settings.output, Some(PathBuf::from("out.json")));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_rejects_invalid_engine() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "engine:\n  simulations: 0").unwrap();
        assert!(Settings::load(file.path()).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::default().with_overrides(Overrides {
            log_level: Some("warn".to_string()),
            seed: Some(9),
            simulations: Some(10),
            ..Default::default()
        });
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.engine.seed, Some(9));
        assert_eq!(settings.engine.simulations, 10);
        assert!(settings.output.is_none());
    }
}
