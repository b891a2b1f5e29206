#![allow(dead_code)]

use occuplan_core::{ActionId, EnumerableModel, StateKey, StepOutcome, Steppable, Transition};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn tr(next: usize, prob: f64, reward: f64, cost: f64) -> Transition {
    Transition {
        next: StateKey::from(next),
        prob,
        reward,
        cost,
    }
}

/// Five-state chain. States `0..=3` choose between `walk` (free) and `run` (cost 1);
/// state 4 is an absorbing goal. Running from state 0 skips ahead to state 2 with
/// probability 1/4.
///
/// Optimal values from state 0: `H=1 → 4`, `H=2 → 8.25`, `H=3 → 10` (cost 2);
/// with a zero cost bound and `H=3` the value is 1.
#[derive(Debug, Clone)]
pub struct ChainEnv {
    state: usize,
    rng: ChaCha8Rng,
}

pub const CHAIN_GOAL: usize = 4;
pub const WALK: usize = 0;
pub const RUN: usize = 1;

const WALK_REWARD: [f64; 4] = [-1.0, 0.0, 2.0, -1.0];
const RUN_REWARD: [f64; 4] = [4.0, 5.0, 1.0, 1.0];

impl Default for ChainEnv {
    fn default() -> Self {
        ChainEnv {
            state: 0,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }
}

impl ChainEnv {
    fn dynamics(state: usize, action: ActionId) -> Vec<Transition> {
        if state == CHAIN_GOAL {
            return vec![tr(CHAIN_GOAL, 1.0, 0.0, 0.0)];
        }
        if action.index() == WALK {
            return vec![tr(state + 1, 1.0, WALK_REWARD[state], 0.0)];
        }
        if state == 0 {
            vec![tr(2, 0.25, RUN_REWARD[0], 1.0), tr(1, 0.75, RUN_REWARD[0], 1.0)]
        } else {
            vec![tr(state + 1, 1.0, RUN_REWARD[state], 1.0)]
        }
    }
}

impl EnumerableModel for ChainEnv {
    fn state_count(&self) -> Option<usize> {
        Some(CHAIN_GOAL + 1)
    }

    fn num_actions(&self, _state: StateKey) -> usize {
        2
    }

    fn transitions(&self, state: StateKey, action: ActionId) -> Option<Vec<Transition>> {
        (state.index() <= CHAIN_GOAL && action.index() < 2)
            .then(|| Self::dynamics(state.index(), action))
    }

    fn initial_distribution(&self) -> Option<Vec<f64>> {
        Some(vec![1.0, 0.0, 0.0, 0.0, 0.0])
    }
}

impl Steppable for ChainEnv {
    fn reset(&mut self, seed: u64) -> StateKey {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.state = 0;
        StateKey::from(0)
    }

    fn step(&mut self, action: ActionId) -> StepOutcome {
        let outcomes = Self::dynamics(self.state, action);
        let sample: f64 = self.rng.gen_range(0.0..1.0);
        let mut cumulative = 0.0;
        let mut chosen = outcomes[outcomes.len() - 1];
        for outcome in &outcomes {
            cumulative += outcome.prob;
            if sample < cumulative {
                chosen = *outcome;
                break;
            }
        }

        let was_goal = self.state == CHAIN_GOAL;
        self.state = chosen.next.index();
        StepOutcome {
            next_state: chosen.next,
            reward: chosen.reward,
            cost: chosen.cost,
            terminated: !was_goal && self.state == CHAIN_GOAL,
            truncated: false,
            failed: false,
        }
    }
}

/// Cliff walking on a `rows × cols` grid. Start bottom-left, goal bottom-right, and
/// the cells between them are a cliff (reward -100, episode fails). Every other move
/// earns reward -1. Entering an interior column above the cliff row charges the row
/// index as cost, so routes far from the cliff are cheap but long.
///
/// Actions: 0 up, 1 right, 2 down, 3 left. Moves into walls stay in place.
#[derive(Debug, Clone)]
pub struct CliffWalk {
    rows: usize,
    cols: usize,
    state: usize,
}

impl Default for CliffWalk {
    /// The classic 4 × 12 layout.
    fn default() -> Self {
        CliffWalk::new(4, 12)
    }
}

impl CliffWalk {
    pub fn new(rows: usize, cols: usize) -> Self {
        CliffWalk {
            rows,
            cols,
            state: (rows - 1) * cols,
        }
    }

    pub fn start(&self) -> StateKey {
        StateKey::from((self.rows - 1) * self.cols)
    }

    fn is_cliff(&self, row: usize, col: usize) -> bool {
        row == self.rows - 1 && col >= 1 && col + 1 < self.cols
    }

    fn is_goal(&self, row: usize, col: usize) -> bool {
        row == self.rows - 1 && col == self.cols - 1
    }

    fn absorbing(&self, state: usize) -> bool {
        let (row, col) = (state / self.cols, state % self.cols);
        self.is_cliff(row, col) || self.is_goal(row, col)
    }

    /// `(next, reward, cost, terminated, failed)` for a move from a live cell.
    fn move_from(&self, state: usize, action: ActionId) -> (usize, f64, f64, bool, bool) {
        let (row, col) = (state / self.cols, state % self.cols);
        let (row, col) = match action.index() {
            0 => (row.saturating_sub(1), col),
            1 => (row, (col + 1).min(self.cols - 1)),
            2 => ((row + 1).min(self.rows - 1), col),
            _ => (row, col.saturating_sub(1)),
        };
        let next = row * self.cols + col;

        if self.is_cliff(row, col) {
            return (next, -100.0, 0.0, true, true);
        }
        let cost = if col >= 1 && col + 1 < self.cols && row + 1 < self.rows {
            row as f64
        } else {
            0.0
        };
        (next, -1.0, cost, self.is_goal(row, col), false)
    }
}

impl EnumerableModel for CliffWalk {
    fn state_count(&self) -> Option<usize> {
        Some(self.rows * self.cols)
    }

    fn num_actions(&self, _state: StateKey) -> usize {
        4
    }

    fn transitions(&self, state: StateKey, action: ActionId) -> Option<Vec<Transition>> {
        let state = state.index();
        if state >= self.rows * self.cols || action.index() >= 4 {
            return None;
        }
        if self.absorbing(state) {
            return Some(vec![tr(state, 1.0, 0.0, 0.0)]);
        }
        let (next, reward, cost, _, _) = self.move_from(state, action);
        Some(vec![tr(next, 1.0, reward, cost)])
    }

    fn initial_distribution(&self) -> Option<Vec<f64>> {
        let mut initial = vec![0.0; self.rows * self.cols];
        initial[self.start().index()] = 1.0;
        Some(initial)
    }
}

impl Steppable for CliffWalk {
    fn reset(&mut self, _seed: u64) -> StateKey {
        self.state = self.start().index();
        self.start()
    }

    fn step(&mut self, action: ActionId) -> StepOutcome {
        if self.absorbing(self.state) {
            return StepOutcome {
                next_state: StateKey::from(self.state),
                reward: 0.0,
                cost: 0.0,
                terminated: true,
                truncated: false,
                failed: false,
            };
        }
        let (next, reward, cost, terminated, failed) = self.move_from(self.state, action);
        self.state = next;
        StepOutcome {
            next_state: StateKey::from(next),
            reward,
            cost,
            terminated,
            truncated: false,
            failed,
        }
    }
}
