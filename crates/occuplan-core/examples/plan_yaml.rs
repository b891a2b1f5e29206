use std::path::PathBuf;

use occuplan_core::{Planner, PlannerConfig, evaluate};
use occuplan_mdp::{MdpModel, MdpSimulator};

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/occuplan-core/examples/risky_shortcut.mdp.yaml"));
    let cost_bound = args
        .next()
        .map(|raw| raw.parse::<f64>().expect("cost bound must be a number"));

    let model = MdpModel::from_yaml_path(&path).expect("failed to compile MDP YAML");
    let config = PlannerConfig {
        cost_bound,
        ..PlannerConfig::from_default_yaml().expect("default config parses")
    };
    let horizon = config.horizon;

    let mut planner = Planner::from_model(model.clone(), config).expect("invalid planner config");
    let summary = planner.solve().expect("planning failed").clone();
    println!(
        "expected_value={:.6} expected_cost={:.6} variables={}",
        summary.expected_value, summary.expected_cost, summary.variables
    );

    let mut simulator = MdpSimulator::new(model, 12345);
    let report = evaluate(&mut simulator, &planner, horizon, 10, 100).expect("evaluation failed");
    println!(
        "mc_return={:.6} mc_cost={:.6} failure_rate={:.3}",
        report.mean_return, report.mean_cost, report.failure_rate
    );

    let snapshot = planner.snapshot().expect("planner is solved");
    println!("{}", snapshot.to_json().expect("snapshot serializes"));
}
