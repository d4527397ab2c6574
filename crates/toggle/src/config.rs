//! Session Configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `TOGGLE_*` environment variables (`__` separates nested keys, e.g.
//! `TOGGLE_PROPS__DEFAULT_LEVEL=3`). Command-line flags are applied last by
//! the binary.
//!
//! ```toml
//! format = "text"
//! steps = ["click", "set active true", "click"]
//!
//! [props]
//! name = "demo"
//! default_level = 3
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::ToggleProps;
use crate::session::{OutputFormat, Step, StepParseError};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TOGGLE_";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid step {index}: {source}")]
    Step {
        index: usize,
        #[source]
        source: StepParseError,
    },
}

/// Everything a session needs to run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    /// Props the component is mounted with
    pub props: ToggleProps,
    /// Script steps, one command per entry
    pub steps: Vec<String>,
    /// How state is printed after each step
    pub format: OutputFormat,
}

impl ToggleConfig {
    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ToggleConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config: ToggleConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse the configured steps
    pub fn parsed_steps(&self) -> Result<Vec<Step>, ConfigError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, line)| {
                line.parse::<Step>()
                    .map_err(|source| ConfigError::Step { index, source })
            })
            .collect()
    }
}
