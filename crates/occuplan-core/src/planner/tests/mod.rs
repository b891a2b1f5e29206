
use occuplan_mdp::{ActionId, EnumerableModel, MdpModel, StateKey, Transition};

/// Enumerable environment backed by explicit tables: `actions[s][a]` lists transitions.
pub(super) struct TableEnv {
    pub initial: Vec<f64>,
    pub actions: Vec<Vec<Vec<Transition>>>,
}

impl EnumerableModel for TableEnv {
    fn state_count(&self) -> Option<usize> {
        Some(self.actions.len())
    }

    fn num_actions(&self, state: StateKey) -> usize {
        self.actions.get(state.index()).map_or(0, Vec::len)
    }

    fn transitions(&self, state: StateKey, action: ActionId) -> Option<Vec<Transition>> {
        self.actions.get(state.index())?.get(action.index()).cloned()
    }

    fn initial_distribution(&self) -> Option<Vec<f64>> {
        Some(self.initial.clone())
    }
}

pub(super) fn tr(next: usize, prob: f64, reward: f64, cost: f64) -> Transition {
    Transition {
        next: StateKey::from(next),
        prob,
        reward,
        cost,
    }
}

/// Two states. From `s0`, `a0` moves to the absorbing `s1` for reward 1 at no cost;
/// `a1` earns 2 at cost 1 and stays in `s0` half of the time.
///
/// For `H = 2`: unconstrained value 3 at cost 1.5; with bound 0.5 value 1.75.
pub(super) fn two_state_env() -> TableEnv {
    TableEnv {
        initial: vec![1.0, 0.0],
        actions: vec![
            vec![
                vec![tr(1, 1.0, 1.0, 0.0)],
                vec![tr(0, 0.5, 2.0, 1.0), tr(1, 0.5, 2.0, 1.0)],
            ],
            vec![vec![tr(1, 1.0, 0.0, 0.0)]],
        ],
    }
}

pub(super) fn two_state_model() -> MdpModel {
    MdpModel::from_env(&two_state_env()).expect("fixture should extract")
}

pub(super) fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
