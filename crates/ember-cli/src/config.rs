//! Run configuration read from `ember.toml`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "ember.toml";

/// Settings for `ember simulate`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per update step
    pub dt: f32,
    /// Total simulated seconds
    pub seconds: f32,
    /// Fixed seed for a reproducible run
    pub seed: Option<u64>,
    /// Print a status line every N steps; 0 disables periodic reports
    pub report_every: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            seconds: 5.0,
            seed: None,
            report_every: 30,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        if !(config.dt.is_finite() && config.dt > 0.0) {
            anyhow::bail!("dt must be positive, got {}", config.dt);
        }
        Ok(config)
    }

    /// Load `path` if given, else `ember.toml` when present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::debug!("run configuration from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Command-line values win over file values
    pub fn apply_overrides(
        &mut self,
        dt: Option<f32>,
        seconds: Option<f32>,
        seed: Option<u64>,
        report_every: Option<usize>,
    ) {
        if let Some(dt) = dt {
            self.dt = dt;
        }
        if let Some(seconds) = seconds {
            self.seconds = seconds;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        if let Some(report_every) = report_every {
            self.report_every = report_every;
        }
    }

    pub fn steps(&self) -> usize {
        (self.seconds.max(0.0) / self.dt).ceil() as usize
    }
}
