use occuplan_mdp::Steppable;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    evaluation::{config::EvaluationConfig, error::EvaluationError},
    planner::{error::PlannerError, lp_planner::Planner, solver::LpSolver},
};

/// Outcome of one simulated episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeMetrics {
    pub seed_index: u64,
    pub episode: usize,
    pub env_seed: u64,
    pub total_return: f64,
    pub total_cost: f64,
    pub length: usize,
    /// Some step reported `failed`.
    pub failed: bool,
    /// The episode ended through `terminated` rather than truncation or the horizon.
    pub terminated: bool,
}

/// Aggregate of a Monte Carlo evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub mean_return: f64,
    pub mean_cost: f64,
    pub mean_length: f64,
    /// Fraction of episodes with at least one failed step.
    pub failure_rate: f64,
}

impl EvaluationReport {
    fn new() -> Self {
        EvaluationReport {
            episodes: 0,
            mean_return: 0.0,
            mean_cost: 0.0,
            mean_length: 0.0,
            failure_rate: 0.0,
        }
    }

    fn record(&mut self, sums: &mut Sums, metrics: &EpisodeMetrics) {
        self.episodes += 1;
        sums.total_return += metrics.total_return;
        sums.total_cost += metrics.total_cost;
        sums.length += metrics.length;
        sums.failures += usize::from(metrics.failed);

        let n = self.episodes as f64;
        self.mean_return = sums.total_return / n;
        self.mean_cost = sums.total_cost / n;
        self.mean_length = sums.length as f64 / n;
        self.failure_rate = sums.failures as f64 / n;
    }
}

#[derive(Debug, Default)]
struct Sums {
    total_return: f64,
    total_cost: f64,
    length: usize,
    failures: usize,
}

/// Runs a solved planner's policy against a live environment.
#[derive(Debug, Clone)]
pub struct MonteCarloEvaluator {
    config: EvaluationConfig,
}

impl MonteCarloEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        MonteCarloEvaluator { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate sequentially on one environment, resetting it before every episode.
    pub fn run<E, S>(
        &self,
        env: &mut E,
        planner: &Planner<S>,
    ) -> Result<EvaluationReport, EvaluationError>
    where
        E: Steppable + ?Sized,
        S: LpSolver,
    {
        self.run_with_hook(env, planner, |_| {})
    }

    /// Sequential evaluation that invokes a callback after each completed episode.
    pub fn run_with_hook<E, S, FHook>(
        &self,
        env: &mut E,
        planner: &Planner<S>,
        mut on_episode: FHook,
    ) -> Result<EvaluationReport, EvaluationError>
    where
        E: Steppable + ?Sized,
        S: LpSolver,
        FHook: FnMut(&EpisodeMetrics),
    {
        self.check(planner)?;

        let mut report = EvaluationReport::new();
        let mut sums = Sums::default();
        for seed_index in 0..self.config.num_seeds {
            for episode in 0..self.config.episodes_per_seed {
                let metrics = self.run_episode(env, planner, seed_index, episode)?;
                on_episode(&metrics);
                report.record(&mut sums, &metrics);
            }
        }

        self.log_report(&report);
        Ok(report)
    }

    /// Evaluate episodes across the rayon pool, one environment clone per episode.
    ///
    /// Episodes are aggregated in `(seed, episode)` order, so the report equals the
    /// one `run` produces for the same config.
    pub fn run_parallel<E, S>(
        &self,
        env: &E,
        planner: &Planner<S>,
    ) -> Result<EvaluationReport, EvaluationError>
    where
        E: Steppable + Clone + Send + Sync,
        S: LpSolver + Sync,
    {
        self.check(planner)?;

        let jobs: Vec<(u64, usize)> = (0..self.config.num_seeds)
            .flat_map(|seed_index| {
                (0..self.config.episodes_per_seed).map(move |episode| (seed_index, episode))
            })
            .collect();

        let episodes = jobs
            .into_par_iter()
            .map(|(seed_index, episode)| {
                let mut local = env.clone();
                self.run_episode(&mut local, planner, seed_index, episode)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = EvaluationReport::new();
        let mut sums = Sums::default();
        for metrics in &episodes {
            report.record(&mut sums, metrics);
        }

        self.log_report(&report);
        Ok(report)
    }

    fn check<S: LpSolver>(&self, planner: &Planner<S>) -> Result<(), EvaluationError> {
        self.config.validate()?;
        if !planner.is_solved() {
            return Err(PlannerError::NotSolved.into());
        }
        if self.config.horizon > planner.horizon() {
            return Err(EvaluationError::HorizonExceedsPlan {
                requested: self.config.horizon,
                planned: planner.horizon(),
            });
        }
        Ok(())
    }

    fn run_episode<E, S>(
        &self,
        env: &mut E,
        planner: &Planner<S>,
        seed_index: u64,
        episode: usize,
    ) -> Result<EpisodeMetrics, PlannerError>
    where
        E: Steppable + ?Sized,
        S: LpSolver,
    {
        let env_seed = self.env_seed(seed_index, episode);
        let mut rng = self.policy_rng(seed_index, episode);
        let mut state = env.reset(env_seed);

        let mut metrics = EpisodeMetrics {
            seed_index,
            episode,
            env_seed,
            total_return: 0.0,
            total_cost: 0.0,
            length: 0,
            failed: false,
            terminated: false,
        };

        for t in 0..self.config.horizon {
            if planner.num_actions(state) == 0 {
                break;
            }
            let action = planner.act(t, state, &mut rng)?;
            let outcome = env.step(action);

            metrics.total_return += outcome.reward;
            metrics.total_cost += outcome.cost;
            metrics.length += 1;
            metrics.failed |= outcome.failed;
            state = outcome.next_state;

            if outcome.terminated || outcome.truncated {
                metrics.terminated = outcome.terminated;
                break;
            }
        }

        debug!(
            seed_index,
            episode,
            total_return = metrics.total_return,
            total_cost = metrics.total_cost,
            length = metrics.length,
            failed = metrics.failed,
            "episode finished"
        );
        Ok(metrics)
    }

    /// Reset seed of one episode. Episode 0 of seed index `i` resets with
    /// `base_seed + i`; later episodes step by `num_seeds`, so every seed is distinct.
    fn env_seed(&self, seed_index: u64, episode: usize) -> u64 {
        self.config
            .base_seed
            .wrapping_add(seed_index)
            .wrapping_add((episode as u64).wrapping_mul(self.config.num_seeds))
    }

    /// Policy stream of one episode: one ChaCha key per seed, one stream per episode.
    fn policy_rng(&self, seed_index: u64, episode: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.base_seed ^ seed_index.rotate_left(32));
        rng.set_stream(episode as u64);
        rng
    }

    fn log_report(&self, report: &EvaluationReport) {
        info!(
            episodes = report.episodes,
            mean_return = report.mean_return,
            mean_cost = report.mean_cost,
            mean_length = report.mean_length,
            failure_rate = report.failure_rate,
            "monte carlo evaluation finished"
        );
    }
}

/// Evaluate a solved planner for `num_seeds × episodes_per_seed` episodes of at most
/// `horizon` steps, with base seed 0.
///
/// The first episode of seed index `i` resets the environment with seed `i`; episode
/// `e` resets with `i + e * num_seeds`.
pub fn evaluate<E, S>(
    env: &mut E,
    planner: &Planner<S>,
    horizon: usize,
    num_seeds: u64,
    episodes_per_seed: usize,
) -> Result<EvaluationReport, EvaluationError>
where
    E: Steppable + ?Sized,
    S: LpSolver,
{
    MonteCarloEvaluator::new(EvaluationConfig::new(horizon, num_seeds, episodes_per_seed))
        .run(env, planner)
}
