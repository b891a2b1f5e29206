use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{MdpError, MdpModel, model::PROB_TOLERANCE};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serializable MDP schema used for YAML IO and validation.
pub struct MdpSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Deterministic start state. Mutually exclusive with `initial`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Initial state distribution. Mutually exclusive with `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Vec<InitialSpec>>,
    /// All state declarations in the model.
    pub states: Vec<StateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Probability mass placed on one state at reset.
pub struct InitialSpec {
    pub state: String,
    pub prob: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single state declaration in the MDP schema.
pub struct StateSpec {
    /// Unique state id.
    pub id: String,
    /// Whether this state ends an episode (defaults to `false` if omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<bool>,
    /// Whether entering this state counts as a failed episode (defaults to `false`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<bool>,
    /// Available actions from this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionSpec>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A named action and its stochastic outcomes.
pub struct ActionSpec {
    pub id: String,
    pub outcomes: Vec<OutcomeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One probabilistic transition for an action.
pub struct OutcomeSpec {
    pub next: String,
    pub prob: f64,
    pub reward: f64,
    #[serde(default)]
    pub cost: f64,
}

impl MdpSpec {
    /// Parse a spec from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MdpError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a spec from a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, MdpError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize the schema and write it to `path`.
    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<(), MdpError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate schema invariants using the crate default tolerance.
    pub fn validate(&self) -> Result<(), MdpError> {
        self.validate_with_tolerance(PROB_TOLERANCE)
    }

    /// Validate ids, transitions, costs, and probability constraints.
    pub fn validate_with_tolerance(&self, tolerance: f64) -> Result<(), MdpError> {
        let mut ids = HashSet::with_capacity(self.states.len());
        for state in &self.states {
            if !ids.insert(state.id.as_str()) {
                return Err(MdpError::DuplicateStateId {
                    id: state.id.clone(),
                });
            }
        }

        match (&self.start, &self.initial) {
            (Some(_), Some(_)) => return Err(MdpError::AmbiguousStart),
            (None, None) => return Err(MdpError::MissingStart),
            (Some(start), None) => {
                if start.trim().is_empty() {
                    return Err(MdpError::MissingStart);
                }
                if !ids.contains(start.as_str()) {
                    return Err(MdpError::UnknownStartState {
                        start: start.clone(),
                    });
                }
            }
            (None, Some(initial)) => {
                if initial.is_empty() {
                    return Err(MdpError::MissingStart);
                }
                let mut sum = 0.0_f64;
                for entry in initial {
                    if !ids.contains(entry.state.as_str()) {
                        return Err(MdpError::UnknownInitialState {
                            state: entry.state.clone(),
                        });
                    }
                    if !is_probability(entry.prob) {
                        return Err(MdpError::InvalidInitialProbability {
                            state: entry.state.clone(),
                            value: entry.prob,
                        });
                    }
                    sum += entry.prob;
                }
                check_distribution_sum(sum, tolerance)?;
            }
        }

        let known: HashMap<&str, ()> = self.states.iter().map(|s| (s.id.as_str(), ())).collect();

        for state in &self.states {
            let actions = state.actions.as_deref().unwrap_or(&[]);

            if state.terminal.unwrap_or(false) && !actions.is_empty() {
                return Err(MdpError::TerminalStateHasActions {
                    state: state.id.clone(),
                });
            }

            let mut action_ids = HashSet::with_capacity(actions.len());
            for action in actions {
                if !action_ids.insert(action.id.as_str()) {
                    return Err(MdpError::DuplicateActionId {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }

                if action.outcomes.is_empty() {
                    return Err(MdpError::EmptyOutcomes {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }

                let mut sum = 0.0_f64;
                for (i, outcome) in action.outcomes.iter().enumerate() {
                    check_outcome(
                        &state.id,
                        &action.id,
                        i,
                        outcome.prob,
                        outcome.reward,
                        outcome.cost,
                    )?;

                    if !known.contains_key(outcome.next.as_str()) {
                        return Err(MdpError::UnknownNextState {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            next: outcome.next.clone(),
                        });
                    }

                    sum += outcome.prob;
                }

                check_outcome_sum(&state.id, &action.id, sum, tolerance)?;
            }
        }

        Ok(())
    }

    /// Compile this spec into an enumerated model.
    pub fn compile(&self) -> Result<MdpModel, MdpError> {
        MdpModel::from_spec(self)
    }
}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Check one outcome's probability, reward and cost.
pub(crate) fn check_outcome(
    state: &str,
    action: &str,
    outcome_index: usize,
    prob: f64,
    reward: f64,
    cost: f64,
) -> Result<(), MdpError> {
    if !is_probability(prob) {
        return Err(MdpError::InvalidProbability {
            state: state.to_string(),
            action: action.to_string(),
            outcome_index,
            value: prob,
        });
    }

    if !reward.is_finite() {
        return Err(MdpError::InvalidReward {
            state: state.to_string(),
            action: action.to_string(),
            outcome_index,
            value: reward,
        });
    }

    if !cost.is_finite() || cost < 0.0 {
        return Err(MdpError::InvalidCost {
            state: state.to_string(),
            action: action.to_string(),
            outcome_index,
            value: cost,
        });
    }

    Ok(())
}

/// Outcome probabilities for an action must sum to 1 within tolerance.
pub(crate) fn check_outcome_sum(
    state: &str,
    action: &str,
    sum: f64,
    tolerance: f64,
) -> Result<(), MdpError> {
    if (sum - 1.0).abs() > tolerance {
        return Err(MdpError::ProbabilitySum {
            state: state.to_string(),
            action: action.to_string(),
            sum,
            tolerance,
        });
    }
    Ok(())
}

pub(crate) fn check_distribution_sum(sum: f64, tolerance: f64) -> Result<(), MdpError> {
    if (sum - 1.0).abs() > tolerance {
        return Err(MdpError::InitialDistributionSum { sum, tolerance });
    }
    Ok(())
}
