use crate::{ActionSpec, InitialSpec, MdpError, MdpModel, MdpSpec, OutcomeSpec, StateSpec};

#[derive(Debug, Clone, Default)]
/// Struct to build MDPs
pub struct MdpBuilder {
    start: Option<String>,
    initial: Vec<InitialSpec>,
    states: Vec<StateSpec>,
}

impl MdpBuilder {
    /// Create a new MdpBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every episode in `state`
    pub fn set_start(&mut self, state: impl Into<String>) -> &mut Self {
        self.start = Some(state.into());
        self
    }

    /// Put `prob` initial mass on `state`
    /// Use instead of `set_start` for stochastic resets
    pub fn set_initial(&mut self, state: impl Into<String>, prob: f64) -> &mut Self {
        self.initial.push(InitialSpec {
            state: state.into(),
            prob,
        });
        self
    }

    /// Add a new state
    /// Terminal flag if episodes end on entering this state
    pub fn add_state(&mut self, id: impl Into<String>, terminal: bool) -> &mut Self {
        self.states.push(StateSpec {
            id: id.into(),
            terminal: Some(terminal),
            failure: None,
            actions: Some(Vec::new()),
        });
        self
    }

    /// Flag a state so that entering it marks the episode as failed
    pub fn mark_failure(&mut self, state_id: impl AsRef<str>) -> Result<&mut Self, MdpError> {
        let state = self.state_mut(state_id.as_ref())?;
        state.failure = Some(true);
        Ok(self)
    }

    /// Add an action to a state
    pub fn add_action(
        &mut self,
        state_id: impl AsRef<str>,
        action_id: impl Into<String>,
    ) -> Result<&mut Self, MdpError> {
        let state = self.state_mut(state_id.as_ref())?;
        state.actions.get_or_insert_with(Vec::new).push(ActionSpec {
            id: action_id.into(),
            outcomes: Vec::new(),
        });
        Ok(self)
    }

    /// Add an outcome to an action
    /// Actions can be stochastic, so call this once per possible next state
    pub fn add_outcome(
        &mut self,
        state_id: impl AsRef<str>,
        action_id: impl AsRef<str>,
        next: impl Into<String>,
        prob: f64,
        reward: f64,
        cost: f64,
    ) -> Result<&mut Self, MdpError> {
        let state_id = state_id.as_ref();
        let action_id = action_id.as_ref();

        let state = self.state_mut(state_id)?;
        let action = state
            .actions
            .get_or_insert_with(Vec::new)
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| MdpError::BuilderUnknownAction {
                state: state_id.to_string(),
                action: action_id.to_string(),
            })?;

        action.outcomes.push(OutcomeSpec {
            next: next.into(),
            prob,
            reward,
            cost,
        });

        Ok(self)
    }

    fn state_mut(&mut self, state_id: &str) -> Result<&mut StateSpec, MdpError> {
        self.states
            .iter_mut()
            .find(|s| s.id == state_id)
            .ok_or_else(|| MdpError::BuilderUnknownState {
                state: state_id.to_string(),
            })
    }

    pub fn build_spec(self) -> Result<MdpSpec, MdpError> {
        let initial = (!self.initial.is_empty()).then_some(self.initial);
        let spec = MdpSpec {
            version: Some(1),
            start: self.start,
            initial,
            states: self.states,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn compile(self) -> Result<MdpModel, MdpError> {
        let spec = self.build_spec()?;
        spec.compile()
    }
}
