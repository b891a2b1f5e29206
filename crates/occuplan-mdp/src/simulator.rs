use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{ActionId, MdpModel, StateKey, StepOutcome, Steppable};

/// Draw a uniform sample in `[0, 1)` from any RNG.
pub fn unit_sample<R>(rng: &mut R) -> f64
where
    R: RngCore + ?Sized,
{
    (rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0)
}

#[derive(Debug, Clone)]
/// Seeded live simulator over an enumerated model.
pub struct MdpSimulator {
    mdp: MdpModel,
    rng: ChaCha8Rng,
    state: StateKey,
    done: bool,
}

impl MdpSimulator {
    /// Create a simulator and reset it with `seed`.
    pub fn new(mdp: MdpModel, seed: u64) -> Self {
        let mut simulator = Self {
            mdp,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: StateKey::from(0),
            done: false,
        };
        simulator.reset(seed);
        simulator
    }

    /// Borrow the underlying model.
    pub fn mdp(&self) -> &MdpModel {
        &self.mdp
    }

    /// Return the current state.
    pub fn state(&self) -> StateKey {
        self.state
    }

    /// Return how many actions are available for a state.
    pub fn num_actions(&self, state_key: StateKey) -> usize {
        self.mdp.action_count(state_key)
    }

    /// Sample one transition from an arbitrary state without moving the simulator.
    /// Invalid state/action inputs and terminal states yield a no-op terminal transition.
    pub fn step_from(&mut self, state_key: StateKey, action: ActionId) -> StepOutcome {
        let noop = StepOutcome {
            next_state: state_key,
            reward: 0.0,
            cost: 0.0,
            terminated: true,
            truncated: false,
            failed: false,
        };
        if self.mdp.is_terminal(state_key).unwrap_or(true) {
            return noop;
        }

        let sample = unit_sample(&mut self.rng);
        match self.mdp.sample_transition(state_key, action, sample) {
            Some((next_state, reward, cost)) => StepOutcome {
                next_state,
                reward,
                cost,
                terminated: self.mdp.is_terminal(next_state).unwrap_or(true),
                truncated: false,
                failed: self.mdp.is_failure(next_state).unwrap_or(false),
            },
            None => noop,
        }
    }
}

impl Steppable for MdpSimulator {
    fn reset(&mut self, seed: u64) -> StateKey {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        let sample = unit_sample(&mut self.rng);
        self.state = self.mdp.sample_initial(sample).unwrap_or(StateKey::from(0));
        self.done = self.mdp.is_terminal(self.state).unwrap_or(true);
        self.state
    }

    fn step(&mut self, action: ActionId) -> StepOutcome {
        if self.done {
            return StepOutcome {
                next_state: self.state,
                reward: 0.0,
                cost: 0.0,
                terminated: true,
                truncated: false,
                failed: false,
            };
        }
        let outcome = self.step_from(self.state, action);
        self.state = outcome.next_state;
        self.done = outcome.terminated;
        outcome
    }
}
