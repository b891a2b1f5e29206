use std::{fmt, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

const DEFAULT_PLANNER_CONFIG_YAML: &str = include_str!("../../config/planner.default.yaml");

/// Planner configuration: horizon, optional cost bound, and numerical settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of decision steps `H`. Zero plans nothing.
    pub horizon: usize,
    /// Bound on expected cumulative cost. `None` means unconstrained planning.
    pub cost_bound: Option<f64>,
    /// Tolerance `ε` used for clamping solver output and for unreachable states.
    pub tolerance: f64,
    /// Optional wall-clock limit for the LP solve.
    pub solve_timeout_ms: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            horizon: 20,
            cost_bound: None,
            tolerance: 1e-6,
            solve_timeout_ms: None,
        }
    }
}

impl PlannerConfig {
    /// Default configuration with the given horizon and cost bound.
    pub fn new(horizon: usize, cost_bound: Option<f64>) -> Self {
        PlannerConfig {
            horizon,
            cost_bound,
            ..PlannerConfig::default()
        }
    }

    /// Parse a planner config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PlannerConfigError> {
        let config: PlannerConfig =
            serde_yaml::from_str(yaml).map_err(PlannerConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a planner config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, PlannerConfigError> {
        let yaml = fs::read_to_string(path).map_err(PlannerConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_PLANNER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, PlannerConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Check numeric fields.
    pub fn validate(&self) -> Result<(), PlannerConfigError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PlannerConfigError::Invalid(
                "tolerance must be finite and > 0".to_string(),
            ));
        }
        if let Some(bound) = self.cost_bound {
            if !bound.is_finite() {
                return Err(PlannerConfigError::Invalid(
                    "cost_bound must be finite when given".to_string(),
                ));
            }
        }
        if self.solve_timeout_ms == Some(0) {
            return Err(PlannerConfigError::Invalid(
                "solve_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_ms.map(Duration::from_millis)
    }
}

/// Error type for loading and validating `PlannerConfig`.
#[derive(Debug)]
pub enum PlannerConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for PlannerConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            PlannerConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            PlannerConfigError::Invalid(err) => write!(f, "invalid planner config: {err}"),
        }
    }
}

impl std::error::Error for PlannerConfigError {}
