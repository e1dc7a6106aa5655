//! Trial harness.
//!
//! A [`Tester`] borrows one [`Environment`] and runs batches of episodes
//! under a rollout policy or a learned policy, or a full train-then-evaluate
//! cycle. Every batch either completes or fails as a whole; no partial mean
//! is ever reported.

pub mod report;
pub mod rollout;
pub mod selector;

use tracing::{debug, info, warn};

pub use report::{EpisodeSummary, LearningReport, SimulationReport};
pub use rollout::{BIASED_FOLLOW_PROBABILITY, RolloutPolicy};
pub use selector::{ActionSelector, DecisionPoint};

use crate::{
    Error, Result,
    environment::Environment,
    learning::{
        LearningAlgorithm, ProgressObserver, TracingObserver, TrainingConfig, TrainingPipeline,
    },
    types::ActionId,
};

/// Default reward added for an uncharged infeasible attempt.
pub const DEFAULT_INFEASIBLE_PENALTY: f64 = -1.0;

/// Harness settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TesterSettings {
    /// Reward added per infeasible attempt when the penalty is not forgiven
    pub infeasible_penalty: f64,
    /// Forgiveness used when evaluating learned policies
    pub forgive_penalty: bool,
    /// Log every episode
    pub debug: bool,
    /// Show a progress bar during training
    pub show_progress: bool,
}

impl Default for TesterSettings {
    fn default() -> Self {
        Self {
            infeasible_penalty: DEFAULT_INFEASIBLE_PENALTY,
            forgive_penalty: true,
            debug: false,
            show_progress: false,
        }
    }
}

/// Runs simulations and learning trials on one environment.
pub struct Tester<'env> {
    env: &'env mut Environment,
    settings: TesterSettings,
}

impl<'env> Tester<'env> {
    pub fn new(env: &'env mut Environment) -> Self {
        let settings = TesterSettings {
            debug: env.debug(),
            ..TesterSettings::default()
        };
        Self { env, settings }
    }

    pub fn with_settings(mut self, settings: TesterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &TesterSettings {
        &self.settings
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.settings.debug = debug;
    }

    pub fn environment(&mut self) -> &mut Environment {
        self.env
    }

    /// Average episodic reward of `iterations` rollouts under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `iterations` is zero and
    /// propagates any engine error.
    pub fn simulate(
        &mut self,
        iterations: usize,
        policy: &RolloutPolicy,
        forgive_penalty: bool,
    ) -> Result<SimulationReport> {
        let mut selector = policy.clone();
        self.evaluate(iterations, &mut selector, forgive_penalty)
    }

    /// Average episodic reward of `iterations` episodes chosen by `selector`.
    pub fn evaluate(
        &mut self,
        iterations: usize,
        selector: &mut dyn ActionSelector,
        forgive_penalty: bool,
    ) -> Result<SimulationReport> {
        if iterations == 0 {
            return Err(Error::invalid_config(
                "simulation needs at least one iteration",
            ));
        }
        let label = selector.label();
        debug!(policy = %label, iterations, forgive_penalty, "simulation started");

        let mut episodes = Vec::with_capacity(iterations);
        for episode in 0..iterations {
            let summary = match self.run_episode(selector, forgive_penalty) {
                Ok(summary) => summary,
                Err(err) => {
                    self.abandon_episode();
                    return Err(err);
                }
            };
            if self.settings.debug {
                debug!(
                    episode,
                    reward = summary.reward,
                    steps = summary.steps,
                    infeasible = summary.infeasible_attempts,
                    truncated = summary.truncated,
                    dead_end = summary.dead_end,
                    "episode finished"
                );
            }
            episodes.push(summary);
        }

        let report = SimulationReport::from_episodes(&episodes);
        info!(policy = %label, mean = report.mean_reward, std_dev = report.std_dev, "simulation finished");
        Ok(report)
    }

    /// Leave the environment outside a running episode after a failed batch,
    /// so the next `reset` is valid.
    fn abandon_episode(&mut self) {
        if self.env.is_closed() {
            return;
        }
        if let Err(e) = self.env.end_episode() {
            warn!(error = %e, "failed to end episode after aborted batch");
        }
    }

    fn run_episode(
        &mut self,
        selector: &mut dyn ActionSelector,
        forgive_penalty: bool,
    ) -> Result<EpisodeSummary> {
        let start = self.env.reset()?;
        let mut summary = EpisodeSummary::default();
        if start.terminal {
            return Ok(summary);
        }

        let mut observation = start.observation;
        let mut legal = start.legal_actions;
        let mut excluded: Vec<ActionId> = Vec::new();
        let mut decision_index = 0;

        loop {
            let candidates: Vec<ActionId> = legal
                .iter()
                .copied()
                .filter(|a| !excluded.contains(a))
                .collect();
            if candidates.is_empty() {
                self.env.end_episode()?;
                summary.dead_end = true;
                break;
            }

            let point = DecisionPoint {
                index: decision_index,
                observation: &observation,
                legal: &legal,
                candidates: &candidates,
            };
            let action = selector.select(&point, self.env.rng())?;
            if !candidates.contains(&action) {
                return Err(Error::usage(format!(
                    "{} chose action {action}, which is not a remaining candidate",
                    selector.label()
                )));
            }

            let step = self.env.step(action)?;
            summary.steps = step.info.steps;
            if step.is_infeasible() {
                summary.infeasible_attempts += 1;
                excluded.push(action);
                if !forgive_penalty {
                    summary.reward += self.settings.infeasible_penalty;
                    summary.penalties_charged += 1;
                }
            } else {
                summary.reward += step.reward;
                if legal.len() > 1 {
                    decision_index += 1;
                }
                excluded.clear();
            }

            if step.done {
                summary.truncated = step.info.truncated;
                break;
            }
            observation = step.observation;
            legal = step.info.legal_actions;
        }
        Ok(summary)
    }

    /// Train a policy with `algorithm`, then evaluate it greedily.
    ///
    /// `training_iterations` counts interaction steps; `logging_interval`
    /// is the number of steps between progress events (0 disables them).
    ///
    /// # Errors
    ///
    /// Any failure during training is reported as [`Error::Training`] and no
    /// evaluation is run.
    pub fn test_learning(
        &mut self,
        training_iterations: usize,
        testing_iterations: usize,
        logging_interval: usize,
        algorithm: LearningAlgorithm,
    ) -> Result<LearningReport> {
        if training_iterations == 0 || testing_iterations == 0 {
            return Err(Error::invalid_config(
                "training and testing iterations must be positive",
            ));
        }

        let mut optimizer = algorithm.build();
        if let Some(seed) = self.env.seed() {
            optimizer.set_rng_seed(seed.wrapping_add(1))?;
        }

        let config = TrainingConfig {
            steps: training_iterations,
            logging_interval,
            infeasible_penalty: self.settings.infeasible_penalty,
        };
        let mut pipeline = TrainingPipeline::new(config)
            .with_observer(Box::new(TracingObserver::new(optimizer.name())));
        if self.settings.show_progress {
            pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
        }

        info!(%algorithm, training_iterations, "training started");
        let training = pipeline.run(self.env, optimizer.as_mut())?;

        let mut policy = optimizer.export_policy(self.env.action_names());
        policy.record_training(&training);

        let forgive = self.settings.forgive_penalty;
        let evaluation = self.evaluate(testing_iterations, &mut policy, forgive)?;
        Ok(LearningReport {
            mean_reward: evaluation.mean_reward,
            evaluation,
            training,
            policy,
        })
    }
}
