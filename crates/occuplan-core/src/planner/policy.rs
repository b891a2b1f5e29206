use occuplan_mdp::{ActionId, MdpModel, StateKey, unit_sample};
use rand::RngCore;
use tracing::{debug, warn};

use crate::planner::{
    error::PlannerError,
    program::{OccupancyProgram, VarLayout},
};

/// Turns a solved occupancy vector into a time-indexed stochastic policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyExtractor {
    tolerance: f64,
}

impl PolicyExtractor {
    pub fn new(tolerance: f64) -> Self {
        PolicyExtractor { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Absorb solver noise in place: negative entries within `ε` of zero become zero.
    /// Returns how many entries were raised.
    pub fn clamp(&self, values: &mut [f64]) -> Result<usize, PlannerError> {
        let mut clamped = 0;
        for (index, value) in values.iter_mut().enumerate() {
            if *value < -self.tolerance || !value.is_finite() {
                return Err(PlannerError::NumericalInstability {
                    index,
                    value: *value,
                });
            }
            if *value < 0.0 {
                *value = 0.0;
                clamped += 1;
            }
        }
        if clamped > 0 {
            debug!(clamped, "raised negative occupancy noise to zero");
        }
        Ok(clamped)
    }

    /// Normalise `x[t][s][·]` per `(t, s)`.
    ///
    /// Pairs with total mass `≤ ε` are unreachable under the plan but may still be
    /// visited live, so they fall back to a uniform distribution over `A(s)`.
    pub fn extract(&self, program: &OccupancyProgram, occupancy: &[f64]) -> TimePolicy {
        let layout = program.layout().clone();
        let mut probs = vec![0.0; layout.len()];
        let mut fallbacks = 0_usize;

        for t in 0..layout.horizon() {
            for state in 0..layout.state_count() {
                let count = layout.action_count(state);
                if count == 0 {
                    continue;
                }
                let range = layout.range(t, state);
                let mass: f64 = occupancy[range.clone()].iter().sum();
                if mass > self.tolerance {
                    for var in range {
                        probs[var] = occupancy[var] / mass;
                    }
                } else {
                    fallbacks += 1;
                    let uniform = 1.0 / count as f64;
                    for var in range {
                        probs[var] = uniform;
                    }
                }
            }
        }

        debug!(
            pairs = layout.horizon() * layout.state_count(),
            fallbacks, "extracted time-indexed policy"
        );
        TimePolicy { layout, probs }
    }
}

/// Stochastic policy `π(t, s, ·)` over the same layout as the occupancy variables.
#[derive(Debug, Clone)]
pub struct TimePolicy {
    layout: VarLayout,
    probs: Vec<f64>,
}

impl TimePolicy {
    /// Policy for a program without variables.
    pub(crate) fn empty(layout: VarLayout) -> Self {
        let probs = vec![0.0; layout.len()];
        TimePolicy { layout, probs }
    }

    pub fn horizon(&self) -> usize {
        self.layout.horizon()
    }

    pub fn layout(&self) -> &VarLayout {
        &self.layout
    }

    /// Action distribution at step `t` in `state`; `None` outside the horizon or model.
    pub fn probabilities(&self, t: usize, state: StateKey) -> Option<&[f64]> {
        if t >= self.layout.horizon() || state.index() >= self.layout.state_count() {
            return None;
        }
        Some(&self.probs[self.layout.range(t, state.index())])
    }

    /// Sample `a ~ π(t, s, ·)`. Returns `None` where no distribution is defined.
    pub fn sample<R>(&self, t: usize, state: StateKey, rng: &mut R) -> Option<ActionId>
    where
        R: RngCore + ?Sized,
    {
        let probs = self.probabilities(t, state)?;
        if probs.is_empty() {
            return None;
        }

        let sample = unit_sample(rng);
        let mut cumulative = 0.0_f64;
        for (action, prob) in probs.iter().enumerate() {
            cumulative += prob;
            if sample < cumulative {
                return Some(ActionId::from(action));
            }
        }
        // Rounding left the cumulative sum just below 1.
        probs.iter().rposition(|p| *p > 0.0).map(ActionId::from)
    }
}

/// Value-to-go `V_t(s)` and cost-to-go `K_t(s)` for `t ∈ [0, H]`.
#[derive(Debug, Clone)]
pub struct ValueTables {
    values: Vec<f64>,
    costs: Vec<f64>,
    state_count: usize,
    horizon: usize,
}

impl ValueTables {
    /// Backward recursion from `V_H = K_H = 0` down to step 0.
    pub fn backward(model: &MdpModel, policy: &TimePolicy) -> Self {
        let state_count = model.state_count();
        let horizon = policy.horizon();
        let mut values = vec![0.0; (horizon + 1) * state_count];
        let mut costs = vec![0.0; (horizon + 1) * state_count];

        for t in (0..horizon).rev() {
            let next_row = (t + 1) * state_count;
            for state in 0..state_count {
                let key = StateKey::from(state);
                let Some(probs) = policy.probabilities(t, key) else {
                    continue;
                };

                let mut value = 0.0;
                let mut cost = 0.0;
                for (action, prob) in model.actions(key).iter().zip(probs) {
                    if *prob == 0.0 {
                        continue;
                    }
                    let mut future_value = action.reward();
                    let mut future_cost = action.cost();
                    for (next, p) in action.successors() {
                        future_value += p * values[next_row + next.index()];
                        future_cost += p * costs[next_row + next.index()];
                    }
                    value += prob * future_value;
                    cost += prob * future_cost;
                }
                values[t * state_count + state] = value;
                costs[t * state_count + state] = cost;
            }
        }

        if values.iter().chain(&costs).any(|v| !v.is_finite()) {
            warn!("value tables contain non-finite entries");
        }

        ValueTables {
            values,
            costs,
            state_count,
            horizon,
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn value(&self, t: usize, state: StateKey) -> Option<f64> {
        self.index(t, state).map(|i| self.values[i])
    }

    pub fn cost(&self, t: usize, state: StateKey) -> Option<f64> {
        self.index(t, state).map(|i| self.costs[i])
    }

    /// `V_0(s)` for every state.
    pub fn root_values(&self) -> &[f64] {
        &self.values[..self.state_count]
    }

    /// `K_0(s)` for every state.
    pub fn root_costs(&self) -> &[f64] {
        &self.costs[..self.state_count]
    }

    fn index(&self, t: usize, state: StateKey) -> Option<usize> {
        (t <= self.horizon && state.index() < self.state_count)
            .then(|| t * self.state_count + state.index())
    }
}
