use occuplan_mdp::{ActionId, EnumerableModel, MdpModel, StateKey};
use rand::RngCore;
use tracing::{info, warn};

use crate::planner::{
    config::PlannerConfig,
    error::PlannerError,
    policy::{PolicyExtractor, TimePolicy, ValueTables},
    program::OccupancyProgram,
    snapshot::{PolicySnapshot, StateSnapshot, StepSnapshot},
    solver::{LpSolver, SimplexSolver, SolveStatus, SolverError},
};

/// Outcome of a successful `Planner::solve`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub status: SolveStatus,
    /// LP objective, `Σ x[t,s,a] · R(s,a)`.
    pub objective: f64,
    /// `Σ_s isd(s) · V_0(s)` under the extracted policy.
    pub expected_value: f64,
    /// `Σ_s isd(s) · K_0(s)` under the extracted policy.
    pub expected_cost: f64,
    pub variables: usize,
    pub equality_rows: usize,
    pub inequality_rows: usize,
}

#[derive(Debug, Clone)]
struct SolvedPlan {
    summary: PlanSummary,
    policy: TimePolicy,
    tables: ValueTables,
}

/// Finite-horizon planner over occupancy measures.
///
/// Construction only extracts the model. `solve` builds and solves the LP once and
/// caches the extracted policy and value tables; every query reads that cache.
#[derive(Debug, Clone)]
pub struct Planner<S = SimplexSolver> {
    model: MdpModel,
    config: PlannerConfig,
    solver: S,
    solved: Option<SolvedPlan>,
}

impl Planner<SimplexSolver> {
    /// Extract the model of `env` and configure a planner; does not solve yet.
    pub fn from_discrete_env<E>(
        env: &E,
        cost_bound: Option<f64>,
        horizon: usize,
    ) -> Result<Self, PlannerError>
    where
        E: EnumerableModel + ?Sized,
    {
        let model = MdpModel::from_env(env)?;
        Self::from_model(model, PlannerConfig::new(horizon, cost_bound))
    }

    /// Configure a planner over an already extracted model.
    pub fn from_model(model: MdpModel, config: PlannerConfig) -> Result<Self, PlannerError> {
        let solver = SimplexSolver::with_timeout(config.solve_timeout());
        Self::with_solver(model, config, solver)
    }
}

impl<S: LpSolver> Planner<S> {
    /// Configure a planner with a custom LP solver.
    pub fn with_solver(
        model: MdpModel,
        config: PlannerConfig,
        solver: S,
    ) -> Result<Self, PlannerError> {
        config.validate()?;
        Ok(Planner {
            model,
            config,
            solver,
            solved: None,
        })
    }

    /// Build and solve the occupancy program, then extract policy and value tables.
    /// Repeated calls return the cached result.
    pub fn solve(&mut self) -> Result<&PlanSummary, PlannerError> {
        if self.solved.is_none() {
            let plan = self.solve_plan()?;
            self.solved = Some(plan);
        }
        let plan = self.plan()?;
        Ok(&plan.summary)
    }

    fn solve_plan(&self) -> Result<SolvedPlan, PlannerError> {
        let horizon = self.config.horizon;
        let cost_bound = self.config.cost_bound;
        let extractor = PolicyExtractor::new(self.config.tolerance);

        // Costs are nonnegative, so no occupancy measure meets a negative bound.
        if cost_bound.is_some_and(|bound| bound < 0.0) {
            return Err(PlannerError::InfeasibleConstraint { cost_bound });
        }

        let program = OccupancyProgram::build(&self.model, horizon, cost_bound);
        let lp = program.linear_program();
        info!(
            horizon,
            variables = lp.num_vars(),
            equality_rows = lp.equalities.len(),
            inequality_rows = lp.inequalities.len(),
            cost_bound = ?cost_bound,
            "solving occupancy program"
        );

        let (policy, objective) = if program.is_empty() {
            (TimePolicy::empty(program.layout().clone()), 0.0)
        } else {
            let solution = self.solver.solve(lp)?;
            match solution.status {
                SolveStatus::Optimal => {}
                SolveStatus::Infeasible => {
                    return Err(PlannerError::InfeasibleConstraint { cost_bound });
                }
                SolveStatus::Unbounded => return Err(PlannerError::Unbounded),
            }

            let mut occupancy = solution.values;
            if occupancy.len() != lp.num_vars() {
                return Err(SolverError::Internal(format!(
                    "solver returned {} values for {} variables",
                    occupancy.len(),
                    lp.num_vars()
                ))
                .into());
            }
            extractor.clamp(&mut occupancy)?;
            (extractor.extract(&program, &occupancy), solution.objective)
        };

        let tables = ValueTables::backward(&self.model, &policy);
        let initial = self.model.initial_distribution();
        let expected_value = dot(initial, tables.root_values());
        let expected_cost = dot(initial, tables.root_costs());

        if let Some(bound) = cost_bound {
            if expected_cost > bound + self.config.tolerance {
                warn!(
                    expected_cost,
                    bound, "extracted policy exceeds the cost bound beyond tolerance"
                );
            }
        }
        info!(objective, expected_value, expected_cost, "occupancy program solved");

        Ok(SolvedPlan {
            summary: PlanSummary {
                status: SolveStatus::Optimal,
                objective,
                expected_value,
                expected_cost,
                variables: lp.num_vars(),
                equality_rows: lp.equalities.len(),
                inequality_rows: lp.inequalities.len(),
            },
            policy,
            tables,
        })
    }

    fn plan(&self) -> Result<&SolvedPlan, PlannerError> {
        self.solved.as_ref().ok_or(PlannerError::NotSolved)
    }

    /// Expected return of the solved policy from `distribution`: `Σ_s d(s) · V_0(s)`.
    ///
    /// The policy is the one optimised for the construction-time initial
    /// distribution; it is evaluated, not re-planned, from `distribution`.
    pub fn expected_value(&self, distribution: &[f64]) -> Result<f64, PlannerError> {
        let plan = self.plan()?;
        let roots = plan.tables.root_values();
        if distribution.len() != roots.len() {
            return Err(PlannerError::DistributionLength {
                expected: roots.len(),
                got: distribution.len(),
            });
        }
        Ok(dot(distribution, roots))
    }

    /// Expected cumulative cost of the solved policy from the initial distribution.
    pub fn expected_cost(&self) -> Result<f64, PlannerError> {
        Ok(self.plan()?.summary.expected_cost)
    }

    /// Sample `a ~ π(t, state, ·)` from the caller's random stream.
    pub fn act<R>(&self, t: usize, state: StateKey, rng: &mut R) -> Result<ActionId, PlannerError>
    where
        R: RngCore + ?Sized,
    {
        let plan = self.plan()?;
        let state_count = self.model.state_count();
        if state.index() >= state_count {
            return Err(PlannerError::UnknownState {
                state: state.index(),
                state_count,
            });
        }
        if t >= plan.policy.horizon() {
            return Err(PlannerError::StepBeyondHorizon {
                step: t,
                horizon: plan.policy.horizon(),
            });
        }
        plan.policy
            .sample(t, state, rng)
            .ok_or(PlannerError::NoActions {
                state: state.index(),
            })
    }

    /// Serializable view of the solved policy and value tables.
    pub fn snapshot(&self) -> Result<PolicySnapshot, PlannerError> {
        let plan = self.plan()?;
        let state_count = self.model.state_count();
        let steps = (0..plan.policy.horizon())
            .map(|t| StepSnapshot {
                t,
                states: (0..state_count)
                    .map(|state| {
                        let key = StateKey::from(state);
                        StateSnapshot {
                            state,
                            state_id: self.model.state_id(key).map(str::to_owned),
                            value_to_go: plan.tables.value(t, key).unwrap_or(0.0),
                            cost_to_go: plan.tables.cost(t, key).unwrap_or(0.0),
                            action_probs: plan
                                .policy
                                .probabilities(t, key)
                                .map(<[f64]>::to_vec)
                                .unwrap_or_default(),
                        }
                    })
                    .collect(),
            })
            .collect();

        Ok(PolicySnapshot {
            schema_version: 1,
            horizon: self.config.horizon,
            cost_bound: self.config.cost_bound,
            objective: plan.summary.objective,
            expected_value: plan.summary.expected_value,
            expected_cost: plan.summary.expected_cost,
            steps,
        })
    }

    /// Return the configured horizon `H`.
    pub fn horizon(&self) -> usize {
        self.config.horizon
    }

    pub fn cost_bound(&self) -> Option<f64> {
        self.config.cost_bound
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn model(&self) -> &MdpModel {
        &self.model
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn is_solved(&self) -> bool {
        self.solved.is_some()
    }

    pub fn summary(&self) -> Option<&PlanSummary> {
        self.solved.as_ref().map(|plan| &plan.summary)
    }

    pub fn policy(&self) -> Result<&TimePolicy, PlannerError> {
        Ok(&self.plan()?.policy)
    }

    pub fn value_tables(&self) -> Result<&ValueTables, PlannerError> {
        Ok(&self.plan()?.tables)
    }

    /// Number of actions the model enumerates for `state`.
    pub fn num_actions(&self, state: StateKey) -> usize {
        self.model.action_count(state)
    }
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}
