mod evaluation;
mod planner;

pub use evaluation::config::EvaluationConfig;
pub use evaluation::error::EvaluationError;
pub use evaluation::monte_carlo::{
    EpisodeMetrics, EvaluationReport, MonteCarloEvaluator, evaluate,
};
pub use planner::config::{PlannerConfig, PlannerConfigError};
pub use planner::error::PlannerError;
pub use planner::lp_planner::{PlanSummary, Planner};
pub use planner::policy::{PolicyExtractor, TimePolicy, ValueTables};
pub use planner::program::{OccupancyProgram, VarLayout};
pub use planner::snapshot::{PolicySnapshot, StateSnapshot, StepSnapshot};
pub use planner::solver::{
    Constraint, Direction, LinearProgram, LpSolution, LpSolver, SimplexSolver, SolveStatus,
    SolverError,
};

pub use occuplan_mdp::{
    ActionId, EnumerableModel, MdpModel, StateKey, StepOutcome, Steppable, Transition,
};
