use std::{collections::HashMap, path::Path};

use crate::{
    ActionId, EnumerableModel, MdpError, MdpSpec, StateKey, Transition,
    spec::{check_distribution_sum, check_outcome, check_outcome_sum},
};

/// Floating point tolerance used when validating probability sums.
pub(crate) const PROB_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
/// Immutable enumerated MDP: states, per-state actions, transition probabilities,
/// expected rewards and costs, and the initial state distribution.
pub struct MdpModel {
    states: Vec<StateRec>,
    initial: Vec<f64>,
    initial_cdf: Vec<f64>,
    state_ids: Vec<String>,
    state_id_to_key: HashMap<String, StateKey>,
    total_actions: usize,
}

#[derive(Debug, Clone)]
struct StateRec {
    terminal: bool,
    failure: bool,
    actions: Vec<ActionModel>,
}

#[derive(Debug, Clone)]
/// Dynamics of one `(state, action)` pair.
pub struct ActionModel {
    successors: Vec<(StateKey, f64)>,
    reward: f64,
    cost: f64,
    outcomes: Vec<OutcomeRec>,
    cdf: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct OutcomeRec {
    next: StateKey,
    prob: f64,
    reward: f64,
    cost: f64,
}

impl ActionModel {
    fn from_outcomes(outcomes: Vec<OutcomeRec>) -> Self {
        let mut successors: Vec<(StateKey, f64)> = Vec::with_capacity(outcomes.len());
        let mut cdf = Vec::with_capacity(outcomes.len());
        let mut cumulative = 0.0_f64;
        let mut reward = 0.0_f64;
        let mut cost = 0.0_f64;

        for outcome in &outcomes {
            cumulative += outcome.prob;
            cdf.push(cumulative);
            reward += outcome.prob * outcome.reward;
            cost += outcome.prob * outcome.cost;

            // Outcomes reaching the same state are merged for P(s, a, s').
            match successors.iter_mut().find(|(next, _)| *next == outcome.next) {
                Some((_, prob)) => *prob += outcome.prob,
                None => successors.push((outcome.next, outcome.prob)),
            }
        }

        Self {
            successors,
            reward,
            cost,
            outcomes,
            cdf,
        }
    }

    /// Next states with their merged probabilities `P(s, a, s')`.
    pub fn successors(&self) -> &[(StateKey, f64)] {
        &self.successors
    }

    /// Expected immediate reward `R(s, a)`.
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Expected immediate cost `C(s, a)`.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    fn sample(&self, sample: f64) -> Option<OutcomeRec> {
        if self.outcomes.is_empty() {
            return None;
        }
        let chosen = self
            .cdf
            .partition_point(|p| *p <= sample)
            .min(self.outcomes.len() - 1);
        Some(self.outcomes[chosen])
    }
}

impl MdpModel {
    /// Extract a model from an environment that can enumerate its dynamics.
    ///
    /// States without actions are treated as terminal. Fails when the state space,
    /// any `(s, a)` pair, or the initial distribution cannot be enumerated, or when
    /// the enumerated tables are not a valid MDP.
    pub fn from_env<E>(env: &E) -> Result<Self, MdpError>
    where
        E: EnumerableModel + ?Sized,
    {
        let state_count = env.state_count().ok_or(MdpError::StateSpaceNotEnumerable)?;
        let initial = env
            .initial_distribution()
            .ok_or(MdpError::InitialDistributionUnavailable)?;

        if initial.len() != state_count {
            return Err(MdpError::InitialDistributionLength {
                expected: state_count,
                got: initial.len(),
            });
        }
        for (state, prob) in initial.iter().enumerate() {
            if !prob.is_finite() || !(0.0..=1.0).contains(prob) {
                return Err(MdpError::InvalidInitialProbability {
                    state: state.to_string(),
                    value: *prob,
                });
            }
        }
        check_distribution_sum(initial.iter().sum(), PROB_TOLERANCE)?;

        let mut states = Vec::with_capacity(state_count);
        for state in 0..state_count {
            let key = StateKey::from(state);
            let action_count = env.num_actions(key);
            let mut actions = Vec::with_capacity(action_count);

            for action in 0..action_count {
                let transitions = env
                    .transitions(key, ActionId::from(action))
                    .ok_or(MdpError::DynamicsNotEnumerable { state, action })?;
                let outcomes = checked_outcomes(state, action, &transitions, state_count)?;
                actions.push(ActionModel::from_outcomes(outcomes));
            }

            states.push(StateRec {
                terminal: actions.is_empty(),
                failure: false,
                actions,
            });
        }

        let state_ids: Vec<String> = (0..state_count).map(|s| s.to_string()).collect();
        Ok(Self::assemble(states, initial, state_ids))
    }

    /// Compile and validate a YAML schema into an enumerated model.
    pub fn from_spec(spec: &MdpSpec) -> Result<Self, MdpError> {
        spec.validate_with_tolerance(PROB_TOLERANCE)?;

        let mut state_id_to_key = HashMap::with_capacity(spec.states.len());
        for (idx, state) in spec.states.iter().enumerate() {
            state_id_to_key.insert(state.id.as_str(), StateKey::from(idx));
        }

        let mut initial = vec![0.0; spec.states.len()];
        if let Some(start) = &spec.start {
            let key = state_id_to_key
                .get(start.as_str())
                .copied()
                .ok_or_else(|| MdpError::UnknownStartState {
                    start: start.clone(),
                })?;
            initial[key.index()] = 1.0;
        }
        for entry in spec.initial.as_deref().unwrap_or(&[]) {
            let key = state_id_to_key
                .get(entry.state.as_str())
                .copied()
                .ok_or_else(|| MdpError::UnknownInitialState {
                    state: entry.state.clone(),
                })?;
            initial[key.index()] += entry.prob;
        }

        let mut states = Vec::with_capacity(spec.states.len());
        for state in &spec.states {
            let mut actions = Vec::new();

            for action in state.actions.as_deref().unwrap_or(&[]) {
                let mut outcomes = Vec::with_capacity(action.outcomes.len());
                for outcome in &action.outcomes {
                    let next = state_id_to_key
                        .get(outcome.next.as_str())
                        .copied()
                        .ok_or_else(|| MdpError::UnknownNextState {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            next: outcome.next.clone(),
                        })?;
                    outcomes.push(OutcomeRec {
                        next,
                        prob: outcome.prob,
                        reward: outcome.reward,
                        cost: outcome.cost,
                    });
                }
                actions.push(ActionModel::from_outcomes(outcomes));
            }

            states.push(StateRec {
                terminal: state.terminal.unwrap_or(false),
                failure: state.failure.unwrap_or(false),
                actions,
            });
        }

        let state_ids = spec.states.iter().map(|s| s.id.clone()).collect();
        Ok(Self::assemble(states, initial, state_ids))
    }

    /// Load, validate, and compile a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, MdpError> {
        MdpSpec::from_yaml_path(path)?.compile()
    }

    fn assemble(states: Vec<StateRec>, initial: Vec<f64>, state_ids: Vec<String>) -> Self {
        let total_actions = states.iter().map(|s| s.actions.len()).sum();
        let initial_cdf = initial
            .iter()
            .scan(0.0_f64, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let state_id_to_key = state_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), StateKey::from(idx)))
            .collect();

        Self {
            states,
            initial,
            initial_cdf,
            state_ids,
            state_id_to_key,
            total_actions,
        }
    }

    /// Return the number of states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Return `Σ_s |A(s)|`.
    pub fn total_actions(&self) -> usize {
        self.total_actions
    }

    /// Return the actions of a state; empty for unknown or terminal states.
    pub fn actions(&self, key: StateKey) -> &[ActionModel] {
        self.states
            .get(key.index())
            .map(|state| state.actions.as_slice())
            .unwrap_or(&[])
    }

    /// Return the number of actions available from a state.
    pub fn action_count(&self, key: StateKey) -> usize {
        self.actions(key).len()
    }

    /// Return the dynamics of one `(state, action)` pair.
    pub fn action(&self, key: StateKey, action: ActionId) -> Option<&ActionModel> {
        self.actions(key).get(action.index())
    }

    /// Return the initial state distribution indexed by state.
    pub fn initial_distribution(&self) -> &[f64] {
        &self.initial
    }

    /// Check whether a state is terminal.
    pub fn is_terminal(&self, key: StateKey) -> Option<bool> {
        self.states.get(key.index()).map(|state| state.terminal)
    }

    /// Check whether entering a state counts as a failure.
    pub fn is_failure(&self, key: StateKey) -> Option<bool> {
        self.states.get(key.index()).map(|state| state.failure)
    }

    /// Convert a state key back to its string id.
    pub fn state_id(&self, key: StateKey) -> Option<&str> {
        self.state_ids.get(key.index()).map(String::as_str)
    }

    /// Convert a string id into a state key.
    pub fn state_key(&self, id: &str) -> Option<StateKey> {
        self.state_id_to_key.get(id).copied()
    }

    /// Sample a start state using a uniform sample in `[0, 1)`.
    pub(crate) fn sample_initial(&self, sample: f64) -> Option<StateKey> {
        if self.initial_cdf.is_empty() {
            return None;
        }
        let chosen = self
            .initial_cdf
            .partition_point(|p| *p <= sample)
            .min(self.initial_cdf.len() - 1);
        Some(StateKey::from(chosen))
    }

    /// Sample one `(next_state, reward, cost)` outcome using a uniform sample in `[0, 1)`.
    pub(crate) fn sample_transition(
        &self,
        key: StateKey,
        action: ActionId,
        sample: f64,
    ) -> Option<(StateKey, f64, f64)> {
        let outcome = self.action(key, action)?.sample(sample)?;
        Some((outcome.next, outcome.reward, outcome.cost))
    }
}

fn checked_outcomes(
    state: usize,
    action: usize,
    transitions: &[Transition],
    state_count: usize,
) -> Result<Vec<OutcomeRec>, MdpError> {
    let state_label = state.to_string();
    let action_label = action.to_string();

    if transitions.is_empty() {
        return Err(MdpError::EmptyOutcomes {
            state: state_label,
            action: action_label,
        });
    }

    let mut sum = 0.0_f64;
    let mut outcomes = Vec::with_capacity(transitions.len());
    for (i, transition) in transitions.iter().enumerate() {
        check_outcome(
            &state_label,
            &action_label,
            i,
            transition.prob,
            transition.reward,
            transition.cost,
        )?;
        if transition.next.index() >= state_count {
            return Err(MdpError::UnknownNextState {
                state: state_label,
                action: action_label,
                next: transition.next.index().to_string(),
            });
        }
        sum += transition.prob;
        outcomes.push(OutcomeRec {
            next: transition.next,
            prob: transition.prob,
            reward: transition.reward,
            cost: transition.cost,
        });
    }
    check_outcome_sum(&state_label, &action_label, sum, PROB_TOLERANCE)?;

    Ok(outcomes)
}

impl EnumerableModel for MdpModel {
    fn state_count(&self) -> Option<usize> {
        Some(self.states.len())
    }

    fn num_actions(&self, state: StateKey) -> usize {
        self.action_count(state)
    }

    fn transitions(&self, state: StateKey, action: ActionId) -> Option<Vec<Transition>> {
        let action = self.action(state, action)?;
        Some(
            action
                .outcomes
                .iter()
                .map(|outcome| Transition {
                    next: outcome.next,
                    prob: outcome.prob,
                    reward: outcome.reward,
                    cost: outcome.cost,
                })
                .collect(),
        )
    }

    fn initial_distribution(&self) -> Option<Vec<f64>> {
        Some(self.initial.clone())
    }
}
