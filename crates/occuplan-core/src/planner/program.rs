//! Occupancy-measure linear program for finite-horizon MDPs.
//!
//! One variable `x[t][s][a] ≥ 0` per step `t ∈ [0, H)` and enumerated action
//! `a ∈ A(s)`. Rows:
//! - `Σ_a x[0][s][a] = isd(s)` for every state with actions,
//! - `Σ_a x[t][s'][a] = Σ_{s,a} P(s,a,s') · x[t-1][s][a]` for `t ∈ [1, H)`,
//! - `Σ C(s,a) · x[t][s][a] ≤ B` when a cost bound is given.
//!
//! States with no actions own no variables and no rows: mass that enters them
//! leaves the process.

use occuplan_mdp::{MdpModel, StateKey};

use crate::planner::solver::{Constraint, Direction, LinearProgram};

/// Maps `(t, s, a)` to a flat variable index.
///
/// Each step owns a contiguous block of `Σ_s |A(s)|` entries; within a block
/// states are laid out in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarLayout {
    offsets: Vec<usize>,
    counts: Vec<usize>,
    block: usize,
    horizon: usize,
}

impl VarLayout {
    pub fn new(model: &MdpModel, horizon: usize) -> Self {
        let mut offsets = Vec::with_capacity(model.state_count());
        let mut counts = Vec::with_capacity(model.state_count());
        let mut block = 0;
        for state in 0..model.state_count() {
            let count = model.action_count(StateKey::from(state));
            offsets.push(block);
            counts.push(count);
            block += count;
        }
        VarLayout {
            offsets,
            counts,
            block,
            horizon,
        }
    }

    /// Width of one step block, `Σ_s |A(s)|`.
    pub fn block(&self) -> usize {
        self.block
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn state_count(&self) -> usize {
        self.offsets.len()
    }

    /// Number of actions of `state`, zero for unknown states.
    pub fn action_count(&self, state: usize) -> usize {
        self.counts.get(state).copied().unwrap_or(0)
    }

    /// Total number of variables, `H · Σ_s |A(s)|`.
    pub fn len(&self) -> usize {
        self.horizon * self.block
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first action of `state` at step `t`.
    pub fn start(&self, t: usize, state: usize) -> usize {
        t * self.block + self.offsets[state]
    }

    /// Flat index range of all actions of `state` at step `t`.
    pub fn range(&self, t: usize, state: usize) -> std::ops::Range<usize> {
        let start = self.start(t, state);
        start..start + self.counts[state]
    }

    pub fn var(&self, t: usize, state: usize, action: usize) -> usize {
        self.start(t, state) + action
    }
}

/// The LP of one `(model, horizon, cost bound)` triple.
#[derive(Debug, Clone)]
pub struct OccupancyProgram {
    layout: VarLayout,
    cost_bound: Option<f64>,
    program: LinearProgram,
}

impl OccupancyProgram {
    pub fn build(model: &MdpModel, horizon: usize, cost_bound: Option<f64>) -> Self {
        let layout = VarLayout::new(model, horizon);
        let state_count = model.state_count();

        let mut objective = vec![0.0; layout.len()];
        let mut cost_terms = Vec::new();
        for t in 0..horizon {
            for state in 0..state_count {
                for (a, action) in model.actions(StateKey::from(state)).iter().enumerate() {
                    let var = layout.var(t, state, a);
                    objective[var] = action.reward();
                    if action.cost() != 0.0 {
                        cost_terms.push((var, action.cost()));
                    }
                }
            }
        }

        let mut equalities = Vec::with_capacity(horizon * state_count);
        if horizon > 0 {
            let initial = model.initial_distribution();
            for state in 0..state_count {
                if layout.action_count(state) == 0 {
                    continue;
                }
                equalities.push(Constraint {
                    terms: layout.range(0, state).map(|var| (var, 1.0)).collect(),
                    rhs: initial[state],
                });
            }
        }

        for t in 1..horizon {
            // Outgoing mass at step t, then inflow from step t - 1 subtracted.
            let mut rows: Vec<Vec<(usize, f64)>> = (0..state_count)
                .map(|state| layout.range(t, state).map(|var| (var, 1.0)).collect())
                .collect();

            for state in 0..state_count {
                for (a, action) in model.actions(StateKey::from(state)).iter().enumerate() {
                    let var = layout.var(t - 1, state, a);
                    for (next, prob) in action.successors() {
                        if *prob == 0.0 || layout.action_count(next.index()) == 0 {
                            continue;
                        }
                        rows[next.index()].push((var, -prob));
                    }
                }
            }

            for (state, terms) in rows.into_iter().enumerate() {
                if layout.action_count(state) == 0 {
                    continue;
                }
                equalities.push(Constraint { terms, rhs: 0.0 });
            }
        }

        let mut inequalities = Vec::new();
        if let Some(bound) = cost_bound {
            if !cost_terms.is_empty() {
                inequalities.push(Constraint {
                    terms: cost_terms,
                    rhs: bound,
                });
            }
        }

        OccupancyProgram {
            layout,
            cost_bound,
            program: LinearProgram {
                direction: Direction::Maximize,
                objective,
                equalities,
                inequalities,
            },
        }
    }

    pub fn layout(&self) -> &VarLayout {
        &self.layout
    }

    pub fn horizon(&self) -> usize {
        self.layout.horizon()
    }

    pub fn cost_bound(&self) -> Option<f64> {
        self.cost_bound
    }

    /// True when there is nothing to optimise: `H = 0` or no state has actions.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn linear_program(&self) -> &LinearProgram {
        &self.program
    }
}
