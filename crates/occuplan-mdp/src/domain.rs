use crate::{ActionId, StateKey};

/// One enumerated outcome of taking an action in a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: StateKey,
    pub prob: f64,
    pub reward: f64,
    pub cost: f64,
}

/// Environments whose complete dynamics can be listed up front.
///
/// This is the only capability the planner needs. Environments that can only be
/// sampled report `None` from the enumeration methods.
pub trait EnumerableModel {
    /// Return the number of states, or `None` if the state space is not finite.
    fn state_count(&self) -> Option<usize>;

    /// Return the number of actions available in `state`.
    /// Zero marks a state the process leaves through.
    fn num_actions(&self, state: StateKey) -> usize;

    /// Return every outcome of `(state, action)`, or `None` if the dynamics can only be sampled.
    fn transitions(&self, state: StateKey, action: ActionId) -> Option<Vec<Transition>>;

    /// Return the initial state distribution indexed by state.
    fn initial_distribution(&self) -> Option<Vec<f64>>;
}

/// Result of one live environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub next_state: StateKey,
    pub reward: f64,
    pub cost: f64,
    pub terminated: bool,
    pub truncated: bool,
    /// Domain specific failure signal, e.g. entering an absorbing failure state.
    pub failed: bool,
}

/// Environments that can be reset and stepped one action at a time.
pub trait Steppable {
    /// Reset deterministically from `seed` and return the start state.
    fn reset(&mut self, seed: u64) -> StateKey;

    /// Apply `action` in the current state.
    fn step(&mut self, action: ActionId) -> StepOutcome;
}
