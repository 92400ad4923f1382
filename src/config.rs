use crate::error::{BufferError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_max_trajectories() -> usize {
    10000
}

fn default_discount_factor() -> f64 {
    0.99
}

/// Construction parameters for a `TrajectoryBuffer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    pub trajectory_length: usize,
    pub state_dim: usize,
    pub action_dim: usize,
    #[serde(default = "default_max_trajectories")]
    pub max_trajectories: usize,
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    #[serde(default)]
    pub immutable: bool,
    /// Snapshot to restore on construction.
    #[serde(default)]
    pub load_from: Option<PathBuf>,
}

impl BufferConfig {
    pub fn new(trajectory_length: usize, state_dim: usize, action_dim: usize) -> Self {
        BufferConfig {
            trajectory_length,
            state_dim,
            action_dim,
            max_trajectories: default_max_trajectories(),
            discount_factor: default_discount_factor(),
            immutable: false,
            load_from: None,
        }
    }

    pub fn with_max_trajectories(mut self, max_trajectories: usize) -> Self {
        self.max_trajectories = max_trajectories;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn with_load_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_from = Some(path.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BufferConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Width of one packed record for these dimensions.
    pub fn record_width(&self) -> usize {
        3 * self.state_dim + self.action_dim + 5
    }

    pub fn validate(&self) -> Result<()> {
        if self.trajectory_length == 0 {
            return Err(BufferError::InvalidConfig(
                "trajectory_length must be positive".to_string(),
            ));
        }
        if self.max_trajectories == 0 {
            return Err(BufferError::InvalidConfig(
                "max_trajectories must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(BufferError::InvalidConfig(format!(
                "discount_factor must be in [0, 1], got {}",
                self.discount_factor
            )));
        }
        Ok(())
    }
}
