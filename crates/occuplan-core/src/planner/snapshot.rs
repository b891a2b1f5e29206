use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PolicySnapshot {
    pub schema_version: u32,
    pub horizon: usize,
    pub cost_bound: Option<f64>,
    pub objective: f64,
    pub expected_value: f64,
    pub expected_cost: f64,
    pub steps: Vec<StepSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSnapshot {
    pub t: usize,
    pub states: Vec<StateSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state: usize,
    pub state_id: Option<String>,
    pub value_to_go: f64,
    pub cost_to_go: f64,
    pub action_probs: Vec<f64>,
}

impl PolicySnapshot {
    /// Render the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
