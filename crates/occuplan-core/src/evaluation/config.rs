use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::evaluation::error::EvaluationError;

/// Monte Carlo evaluation settings.
///
/// `num_seeds × episodes_per_seed` episodes are run. Each episode's reset seed and
/// policy stream are derived from `(base_seed, seed index, episode index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub horizon: usize,
    pub num_seeds: u64,
    pub episodes_per_seed: usize,
    pub base_seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            horizon: 20,
            num_seeds: 1,
            episodes_per_seed: 1,
            base_seed: 0,
        }
    }
}

impl EvaluationConfig {
    pub fn new(horizon: usize, num_seeds: u64, episodes_per_seed: usize) -> Self {
        EvaluationConfig {
            horizon,
            num_seeds,
            episodes_per_seed,
            ..EvaluationConfig::default()
        }
    }

    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    /// Parse an evaluation config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EvaluationError> {
        let config: EvaluationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, EvaluationError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), EvaluationError> {
        if self.num_seeds == 0 {
            return Err(EvaluationError::InvalidConfig(
                "num_seeds must be greater than 0".to_string(),
            ));
        }
        if self.episodes_per_seed == 0 {
            return Err(EvaluationError::InvalidConfig(
                "episodes_per_seed must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of episodes.
    pub fn episode_count(&self) -> usize {
        (self.num_seeds as usize).saturating_mul(self.episodes_per_seed)
    }
}
