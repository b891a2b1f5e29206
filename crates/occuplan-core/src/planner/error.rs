use occuplan_mdp::MdpError;
use thiserror::Error;

use crate::planner::{config::PlannerConfigError, solver::SolverError};

/// Error type for planner construction, solving, and policy queries.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The environment could not supply an enumerable MDP description.
    #[error("failed to extract MDP model: {0}")]
    ModelExtraction(#[from] MdpError),

    #[error(transparent)]
    InvalidConfig(#[from] PlannerConfigError),

    /// No occupancy measure satisfies the flow constraints and the cost bound.
    #[error("no feasible policy satisfies cost bound {}", fmt_bound(.cost_bound))]
    InfeasibleConstraint { cost_bound: Option<f64> },

    /// Occupancy measures are bounded, so this indicates a broken solver or model.
    #[error("occupancy program reported unbounded")]
    Unbounded,

    #[error("planner has not been solved yet")]
    NotSolved,

    #[error("LP solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error("solver returned {value} for variable {index}, beyond the clamping tolerance")]
    NumericalInstability { index: usize, value: f64 },

    #[error("state {state} is outside the model's {state_count} states")]
    UnknownState { state: usize, state_count: usize },

    #[error("step {step} is outside the planning horizon {horizon}")]
    StepBeyondHorizon { step: usize, horizon: usize },

    #[error("state {state} has no actions")]
    NoActions { state: usize },

    #[error("distribution has {got} entries but the model has {expected} states")]
    DistributionLength { expected: usize, got: usize },
}

fn fmt_bound(bound: &Option<f64>) -> String {
    match bound {
        Some(bound) => bound.to_string(),
        None => "(unconstrained)".to_string(),
    }
}
