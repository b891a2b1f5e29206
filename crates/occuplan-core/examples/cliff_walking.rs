use occuplan_core::{EvaluationConfig, MonteCarloEvaluator, Planner, PlannerConfig};
use occuplan_mdp::{MdpBuilder, MdpModel, MdpSimulator};

const ROWS: usize = 4;
const COLS: usize = 6;
const MOVES: [(&str, isize, isize); 4] = [
    ("up", -1, 0),
    ("right", 0, 1),
    ("down", 1, 0),
    ("left", 0, -1),
];

fn cell(row: usize, col: usize) -> String {
    format!("r{row}c{col}")
}

fn is_cliff(row: usize, col: usize) -> bool {
    row == ROWS - 1 && col >= 1 && col + 1 < COLS
}

fn is_goal(row: usize, col: usize) -> bool {
    row == ROWS - 1 && col == COLS - 1
}

/// Cliff walking with a cost for every interior cell above the cliff row, equal
/// to its row index. Safe routes are free but long.
fn build_cliff() -> MdpModel {
    let mut builder = MdpBuilder::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            builder.add_state(cell(row, col), is_cliff(row, col) || is_goal(row, col));
        }
    }
    builder.set_start(cell(ROWS - 1, 0));

    for row in 0..ROWS {
        for col in 0..COLS {
            if is_cliff(row, col) {
                builder.mark_failure(cell(row, col)).expect("cell exists");
                continue;
            }
            if is_goal(row, col) {
                continue;
            }
            for (name, dr, dc) in MOVES {
                let next_row = row.saturating_add_signed(dr).min(ROWS - 1);
                let next_col = col.saturating_add_signed(dc).min(COLS - 1);
                let (reward, cost) = if is_cliff(next_row, next_col) {
                    (-100.0, 0.0)
                } else if next_col >= 1 && next_col + 1 < COLS && next_row + 1 < ROWS {
                    (-1.0, next_row as f64)
                } else {
                    (-1.0, 0.0)
                };
                builder
                    .add_action(cell(row, col), name)
                    .expect("cell exists");
                builder
                    .add_outcome(
                        cell(row, col),
                        name,
                        cell(next_row, next_col),
                        1.0,
                        reward,
                        cost,
                    )
                    .expect("action exists");
            }
        }
    }

    builder.compile().expect("cliff model should compile")
}

fn main() {
    tracing_subscriber::fmt::init();

    let model = build_cliff();
    let horizon = 15;
    let evaluator = MonteCarloEvaluator::new(EvaluationConfig::new(horizon, 4, 25));

    for cost_bound in [None, Some(8.0), Some(4.0), Some(2.0), Some(0.0)] {
        let config = PlannerConfig::new(horizon, cost_bound);
        let mut planner =
            Planner::from_model(model.clone(), config).expect("planner config is valid");
        let summary = planner.solve().expect("cliff walking is feasible for any bound >= 0");
        let (value, cost) = (summary.expected_value, summary.expected_cost);

        let simulator = MdpSimulator::new(model.clone(), 0);
        let report = evaluator
            .run_parallel(&simulator, &planner)
            .expect("evaluation failed");

        println!(
            "bound={:<6} value={value:.3} cost={cost:.3} mc_return={:.3} mc_cost={:.3} mc_length={:.2} failures={:.3}",
            cost_bound.map_or("none".to_string(), |b| b.to_string()),
            report.mean_return,
            report.mean_cost,
            report.mean_length,
            report.failure_rate,
        );
    }
}
