use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use thiserror::Error;

/// Objective sense of a linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// One sparse constraint row: `Σ coeff · x[index]` compared against `rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub terms: Vec<(usize, f64)>,
    pub rhs: f64,
}

/// Linear program in standard form: optimise `cᵗx` subject to `Ax = b`, `Gx ≤ h`, `x ≥ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    pub direction: Direction,
    pub objective: Vec<f64>,
    pub equalities: Vec<Constraint>,
    pub inequalities: Vec<Constraint>,
}

impl LinearProgram {
    /// Number of decision variables.
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }
}

/// Terminal status reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

/// Solver output. `values` and `objective` are only meaningful when `status` is `Optimal`.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: SolveStatus,
    pub values: Vec<f64>,
    pub objective: f64,
}

impl LpSolution {
    fn without_point(status: SolveStatus) -> Self {
        LpSolution {
            status,
            values: Vec::new(),
            objective: f64::NAN,
        }
    }
}

/// Failures of the solver itself, as opposed to properties of the program.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("LP solve exceeded {timeout_ms} ms")]
    TimedOut { timeout_ms: u128 },

    #[error("internal solver error: {0}")]
    Internal(String),
}

/// Black-box solver for `LinearProgram`s.
pub trait LpSolver {
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, SolverError>;
}

/// Revised-simplex solver backed by `microlp`.
///
/// With a timeout the solve runs on a worker thread; on expiry the worker is
/// detached and `SolverError::TimedOut` is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexSolver {
    timeout: Option<Duration>,
}

impl SimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        SimplexSolver { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl LpSolver for SimplexSolver {
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, SolverError> {
        let Some(timeout) = self.timeout else {
            return solve_simplex(program);
        };

        let (tx, rx) = mpsc::channel();
        let owned = program.clone();
        thread::Builder::new()
            .name("occuplan-lp".to_string())
            .spawn(move || {
                // The receiver may have given up already.
                let _ = tx.send(solve_simplex(&owned));
            })
            .map_err(|err| SolverError::Internal(err.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SolverError::TimedOut {
                timeout_ms: timeout.as_millis(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(SolverError::Internal(
                "solver thread exited without a result".to_string(),
            )),
        }
    }
}

fn solve_simplex(program: &LinearProgram) -> Result<LpSolution, SolverError> {
    let direction = match program.direction {
        Direction::Maximize => OptimizationDirection::Maximize,
        Direction::Minimize => OptimizationDirection::Minimize,
    };
    let mut problem = Problem::new(direction);
    let vars: Vec<Variable> = program
        .objective
        .iter()
        .map(|coeff| problem.add_var(*coeff, (0.0, f64::INFINITY)))
        .collect();

    let rows = program
        .equalities
        .iter()
        .map(|row| (row, ComparisonOp::Eq))
        .chain(program.inequalities.iter().map(|row| (row, ComparisonOp::Le)));
    for (row, op) in rows {
        let mut expr = Vec::with_capacity(row.terms.len());
        for (index, coeff) in &row.terms {
            let var = vars.get(*index).copied().ok_or_else(|| {
                SolverError::Internal(format!(
                    "constraint references variable {index} of {}",
                    vars.len()
                ))
            })?;
            expr.push((var, *coeff));
        }
        problem.add_constraint(expr.as_slice(), op, row.rhs);
    }

    match problem.solve() {
        Ok(solution) => Ok(LpSolution {
            status: SolveStatus::Optimal,
            values: vars.iter().map(|var| solution[*var]).collect(),
            objective: solution.objective(),
        }),
        Err(microlp::Error::Infeasible) => Ok(LpSolution::without_point(SolveStatus::Infeasible)),
        Err(microlp::Error::Unbounded) => Ok(LpSolution::without_point(SolveStatus::Unbounded)),
        #[allow(unreachable_patterns)]
        Err(other) => Err(SolverError::Internal(other.to_string())),
    }
}
