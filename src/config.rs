use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Constants shared by the transition-time estimate and the downlink scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Satellite slew rate, radians per second
    pub mean_rotation_speed: f64,
    /// Downlink rate, bits per second
    pub downlink_rate: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mean_rotation_speed: default_mean_rotation_speed(),
            downlink_rate: default_downlink_rate(),
        }
    }
}

fn default_mean_rotation_speed() -> f64 {
    // 2 degrees per second
    (2.0 * std::f64::consts::PI) / 180.0
}

fn default_downlink_rate() -> f64 {
    1e6
}

impl PlannerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("mean_rotation_speed", self.mean_rotation_speed),
            ("downlink_rate", self.downlink_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}
