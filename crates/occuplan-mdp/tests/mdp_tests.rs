use occuplan_mdp::{
    ActionId, EnumerableModel, MdpBuilder, MdpError, MdpModel, MdpSimulator, MdpSpec, StateKey,
    Steppable, Transition,
};

const VALID_MDP_YAML: &str = r#"
version: 1
start: s0
states:
  - id: s0
    terminal: false
    actions:
      - id: a0
        outcomes:
          - next: s1
            prob: 0.7
            reward: 1.0
            cost: 2.0
          - next: s0
            prob: 0.3
            reward: 0.0
      - id: a1
        outcomes:
          - next: s2
            prob: 1.0
            reward: -0.2
  - id: s1
    terminal: true
  - id: s2
    terminal: false
    actions: []
"#;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn yaml_parse_and_compile_success() {
    let spec = MdpSpec::from_yaml_str(VALID_MDP_YAML).expect("valid yaml");
    let model = spec.compile().expect("compile should succeed");

    assert_eq!(model.state_count(), 3);
    assert_eq!(model.total_actions(), 2);
    assert_eq!(model.initial_distribution(), &[1.0, 0.0, 0.0]);
    assert_eq!(model.state_id(StateKey::from(0)), Some("s0"));
    assert_eq!(model.state_key("s2"), Some(StateKey::from(2)));

    let a0 = model
        .action(StateKey::from(0), ActionId::from(0))
        .expect("action exists");
    assert!(close(a0.reward(), 0.7));
    assert!(close(a0.cost(), 1.4));
    assert_eq!(a0.successors().len(), 2);

    assert_eq!(model.action_count(StateKey::from(2)), 0);
    assert_eq!(model.is_terminal(StateKey::from(1)), Some(true));
}

#[test]
fn validation_fails_for_probability_sum() {
    let yaml = r#"
start: s0
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: s0
            prob: 0.9
            reward: 1.0
"#;

    let spec = MdpSpec::from_yaml_str(yaml).expect("valid syntax");
    let err = spec.compile().expect_err("compile should fail");

    assert!(matches!(err, MdpError::ProbabilitySum { .. }));
}

#[test]
fn validation_fails_for_unknown_state_reference() {
    let yaml = r#"
start: s0
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: missing
            prob: 1.0
            reward: 1.0
"#;

    let spec = MdpSpec::from_yaml_str(yaml).expect("valid syntax");
    let err = spec.compile().expect_err("compile should fail");

    assert!(matches!(err, MdpError::UnknownNextState { .. }));
}

#[test]
fn validation_rejects_negative_cost() {
    let yaml = r#"
start: s0
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: s0
            prob: 1.0
            reward: 0.0
            cost: -1.0
"#;

    let spec = MdpSpec::from_yaml_str(yaml).expect("valid syntax");
    let err = spec.compile().expect_err("compile should fail");

    assert!(matches!(err, MdpError::InvalidCost { value, .. } if value == -1.0));
}

#[test]
fn validation_requires_exactly_one_start_description() {
    let both = r#"
start: s0
initial:
  - state: s0
    prob: 1.0
states:
  - id: s0
    terminal: true
"#;
    let neither = r#"
states:
  - id: s0
    terminal: true
"#;

    let err = MdpSpec::from_yaml_str(both)
        .expect("valid syntax")
        .compile()
        .expect_err("ambiguous start should fail");
    assert!(matches!(err, MdpError::AmbiguousStart));

    let err = MdpSpec::from_yaml_str(neither)
        .expect("valid syntax")
        .compile()
        .expect_err("missing start should fail");
    assert!(matches!(err, MdpError::MissingStart));
}

#[test]
fn initial_distribution_must_sum_to_one() {
    let yaml = r#"
initial:
  - state: s0
    prob: 0.5
  - state: s1
    prob: 0.4
states:
  - id: s0
    terminal: true
  - id: s1
    terminal: true
"#;

    let err = MdpSpec::from_yaml_str(yaml)
        .expect("valid syntax")
        .compile()
        .expect_err("compile should fail");
    assert!(matches!(err, MdpError::InitialDistributionSum { .. }));
}

#[test]
fn reset_is_deterministic_for_fixed_seed() {
    let yaml = r#"
initial:
  - state: s0
    prob: 0.5
  - state: s1
    prob: 0.5
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: s0
            prob: 0.6
            reward: 0.0
          - next: s1
            prob: 0.4
            reward: 1.0
            cost: 1.0
  - id: s1
    terminal: true
"#;

    let model = MdpSpec::from_yaml_str(yaml)
        .expect("valid syntax")
        .compile()
        .expect("compile should succeed");

    let mut sim_a = MdpSimulator::new(model.clone(), 42);
    let mut sim_b = MdpSimulator::new(model, 42);

    let mut trace_a = Vec::new();
    let mut trace_b = Vec::new();

    for seed in 0..20 {
        trace_a.push(sim_a.reset(seed));
        trace_b.push(sim_b.reset(seed));
        trace_a.push(sim_a.step_from(StateKey::from(0), ActionId::from(0)).next_state);
        trace_b.push(sim_b.step_from(StateKey::from(0), ActionId::from(0)).next_state);
    }

    assert_eq!(trace_a, trace_b);
    assert!(trace_a.contains(&StateKey::from(0)));
    assert!(trace_a.contains(&StateKey::from(1)));
}

#[test]
fn simulator_reports_failure_and_terminal_transitions() {
    let mut builder = MdpBuilder::new();
    builder
        .set_start("edge")
        .add_state("edge", false)
        .add_state("cliff", true)
        .add_state("home", true);
    builder.mark_failure("cliff").expect("state exists");
    builder.add_action("edge", "jump").expect("state exists");
    builder
        .add_outcome("edge", "jump", "cliff", 1.0, -100.0, 5.0)
        .expect("action exists");
    builder.add_action("edge", "walk").expect("state exists");
    builder
        .add_outcome("edge", "walk", "home", 1.0, -1.0, 0.0)
        .expect("action exists");

    let model = builder.compile().expect("compile should succeed");
    let mut sim = MdpSimulator::new(model, 3);

    assert_eq!(sim.reset(3), StateKey::from(0));
    let outcome = sim.step(ActionId::from(0));
    assert_eq!(outcome.next_state, StateKey::from(1));
    assert!(outcome.terminated);
    assert!(outcome.failed);
    assert_eq!(outcome.reward, -100.0);
    assert_eq!(outcome.cost, 5.0);

    // Stepping past termination is a zero-reward no-op.
    let after = sim.step(ActionId::from(1));
    assert!(after.terminated);
    assert_eq!(after.reward, 0.0);

    sim.reset(3);
    let outcome = sim.step(ActionId::from(1));
    assert!(outcome.terminated);
    assert!(!outcome.failed);
}

#[test]
fn builder_rejects_unknown_references() {
    let mut builder = MdpBuilder::new();
    builder.set_start("s0").add_state("s0", false);

    let err = builder.add_action("nope", "a0").expect_err("unknown state");
    assert!(matches!(err, MdpError::BuilderUnknownState { .. }));

    let err = builder
        .add_outcome("s0", "a0", "s0", 1.0, 0.0, 0.0)
        .expect_err("unknown action");
    assert!(matches!(err, MdpError::BuilderUnknownAction { .. }));
}

/// Two-state environment exposing its tables directly.
struct TableEnv {
    sample_only: bool,
    finite: bool,
}

impl EnumerableModel for TableEnv {
    fn state_count(&self) -> Option<usize> {
        self.finite.then_some(2)
    }

    fn num_actions(&self, _state: StateKey) -> usize {
        1
    }

    fn transitions(&self, state: StateKey, _action: ActionId) -> Option<Vec<Transition>> {
        if self.sample_only {
            return None;
        }
        Some(vec![
            Transition {
                next: StateKey::from(1),
                prob: 0.5,
                reward: 2.0,
                cost: 1.0,
            },
            Transition {
                next: StateKey::from(1),
                prob: 0.25,
                reward: 0.0,
                cost: 0.0,
            },
            Transition {
                next: state,
                prob: 0.25,
                reward: 4.0,
                cost: 0.0,
            },
        ])
    }

    fn initial_distribution(&self) -> Option<Vec<f64>> {
        Some(vec![0.75, 0.25])
    }
}

#[test]
fn extraction_from_env_merges_outcomes_into_expectations() {
    let env = TableEnv {
        sample_only: false,
        finite: true,
    };
    let model = MdpModel::from_env(&env).expect("extraction should succeed");

    assert_eq!(model.state_count(), 2);
    assert_eq!(model.initial_distribution(), &[0.75, 0.25]);

    let action = model
        .action(StateKey::from(0), ActionId::from(0))
        .expect("action exists");
    assert!(close(action.reward(), 2.0));
    assert!(close(action.cost(), 0.5));
    assert_eq!(
        action.successors(),
        &[(StateKey::from(1), 0.75), (StateKey::from(0), 0.25)]
    );

    // The compiled model round-trips through its own enumeration interface.
    let again = MdpModel::from_env(&model).expect("model is enumerable");
    assert_eq!(again.total_actions(), model.total_actions());
}

#[test]
fn extraction_fails_for_sample_only_environments() {
    let err = MdpModel::from_env(&TableEnv {
        sample_only: true,
        finite: true,
    })
    .expect_err("sample-only dynamics cannot be extracted");
    assert!(matches!(
        err,
        MdpError::DynamicsNotEnumerable {
            state: 0,
            action: 0
        }
    ));

    let err = MdpModel::from_env(&TableEnv {
        sample_only: false,
        finite: false,
    })
    .expect_err("infinite state space cannot be extracted");
    assert!(matches!(err, MdpError::StateSpaceNotEnumerable));
}

#[test]
fn saved_yaml_loads_back_to_the_same_model() {
    let spec = MdpSpec::from_yaml_str(VALID_MDP_YAML).expect("valid yaml");
    let path = std::env::temp_dir().join(format!("occuplan-mdp-{}.yaml", std::process::id()));

    spec.save_yaml(&path).expect("write yaml");
    let reloaded = MdpModel::from_yaml_path(&path).expect("reload yaml");
    std::fs::remove_file(&path).expect("cleanup");

    let original = spec.compile().expect("compile");
    assert_eq!(reloaded.state_count(), original.state_count());
    assert_eq!(reloaded.total_actions(), original.total_actions());
    assert_eq!(reloaded.initial_distribution(), original.initial_distribution());
    assert_eq!(reloaded.state_id(StateKey::from(2)), Some("s2"));

    let a0 = reloaded
        .action(StateKey::from(0), ActionId::from(0))
        .expect("action exists");
    assert!(close(a0.reward(), 0.7));
    assert!(close(a0.cost(), 1.4));
    assert_eq!(
        a0.successors(),
        &[(StateKey::from(1), 0.7), (StateKey::from(0), 0.3)]
    );
}

#[test]
fn stochastic_initial_distribution_drives_resets() {
    let mut builder = MdpBuilder::new();
    builder
        .add_state("left", true)
        .add_state("middle", true)
        .add_state("right", true)
        .set_initial("left", 0.2)
        .set_initial("right", 0.8);
    let model = builder.compile().expect("valid model");

    assert_eq!(model.initial_distribution(), &[0.2, 0.0, 0.8]);

    let mut simulator = MdpSimulator::new(model, 0);
    let mut counts = [0_usize; 3];
    let resets = 5_000;
    for seed in 0..resets {
        counts[simulator.reset(seed).index()] += 1;
    }

    assert_eq!(counts[1], 0);
    let right_share = counts[2] as f64 / resets as f64;
    assert!((right_share - 0.8).abs() < 0.03, "right share {right_share}");
    assert_eq!(counts[0] + counts[2], resets as usize);
}
