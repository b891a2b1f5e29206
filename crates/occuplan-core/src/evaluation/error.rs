use thiserror::Error;

use crate::planner::error::PlannerError;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("invalid evaluation config: {0}")]
    InvalidConfig(String),

    #[error("evaluation horizon {requested} exceeds the planned horizon {planned}")]
    HorizonExceedsPlan { requested: usize, planned: usize },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
