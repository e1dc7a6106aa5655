//! Training pipeline driving an optimizer against an environment

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use super::observers::{MetricsObserver, MetricsSummary, ProgressPoint};
use crate::{
    Error, Result,
    environment::Environment,
    harness::DEFAULT_INFEASIBLE_PENALTY,
    ports::{PolicyOptimizer, TrainingObserver, Transition},
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Interaction steps to train for
    pub steps: usize,
    /// Steps between progress events, 0 disables them
    pub logging_interval: usize,
    /// Learning signal for an infeasible attempt
    pub infeasible_penalty: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            logging_interval: 0,
            infeasible_penalty: DEFAULT_INFEASIBLE_PENALTY,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Interaction steps taken
    pub steps: usize,
    /// Episodes that ended by termination or truncation
    pub episodes: usize,
    /// Mean reward of those episodes, with penalties as charged to the learner
    pub mean_episode_reward: Option<f64>,
    pub infeasible_attempts: usize,
    pub truncated_episodes: usize,
    /// Per-episode statistics over finished episodes
    #[serde(default)]
    pub metrics: MetricsSummary,
    /// Progress events, one per logging interval
    #[serde(default)]
    pub learning_curve: Vec<ProgressPoint>,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Training pipeline for a single optimizer on one environment
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn TrainingObserver>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `optimizer` for the configured number of steps.
    ///
    /// The environment is left outside a running episode, also on failure.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`Error::Training`], with the underlying
    /// error as its source.
    pub fn run(
        &mut self,
        env: &mut Environment,
        optimizer: &mut dyn PolicyOptimizer,
    ) -> Result<TrainingResult> {
        match self.train(env, optimizer) {
            Ok(result) => Ok(result),
            Err(err) => {
                if !env.is_closed() {
                    env.end_episode()?;
                }
                match err {
                    Error::Training { .. } => Err(err),
                    other if other.is_engine_failure() => Err(Error::training(
                        format!("engine failed during {} training", optimizer.name()),
                        other,
                    )),
                    other => Err(Error::training(
                        format!("{} training failed", optimizer.name()),
                        other,
                    )),
                }
            }
        }
    }

    fn train(
        &mut self,
        env: &mut Environment,
        optimizer: &mut dyn PolicyOptimizer,
    ) -> Result<TrainingResult> {
        let config = self.config.clone();
        for observer in &mut self.observers {
            observer.on_training_start(config.steps)?;
        }

        let mut steps = 0;
        let mut episode_rewards: Vec<f64> = Vec::new();
        let mut interval_rewards: Vec<f64> = Vec::new();
        let mut infeasible_attempts = 0;
        let mut truncated_episodes = 0;
        let mut metrics = MetricsObserver::new();

        while steps < config.steps {
            let start = env.reset()?;
            if start.terminal {
                return Err(Error::Training {
                    message: "start configuration is terminal, nothing to learn".to_string(),
                    source: None,
                });
            }

            let mut observation = start.observation;
            let mut legal = start.legal_actions;
            let mut episode_reward = 0.0;
            let mut episode_steps = 0;
            let mut finished = false;

            while steps < config.steps {
                let action = optimizer.select_action(&observation, &legal)?;
                let step = env.step(action)?;
                steps += 1;
                episode_steps += 1;

                let reward = if step.is_infeasible() {
                    infeasible_attempts += 1;
                    config.infeasible_penalty
                } else {
                    step.reward
                };
                episode_reward += reward;

                optimizer.update(&Transition {
                    observation: &observation,
                    action,
                    reward,
                    next_observation: &step.observation,
                    next_legal: &step.info.legal_actions,
                    terminated: step.info.terminated,
                })?;
                if !optimizer.is_finite() {
                    return Err(Error::Training {
                        message: format!("{} diverged after {steps} steps", optimizer.name()),
                        source: None,
                    });
                }

                if config.logging_interval > 0 && steps % config.logging_interval == 0 {
                    let recent_mean = if interval_rewards.is_empty() {
                        None
                    } else {
                        Some(interval_rewards.iter().mean())
                    };
                    metrics.on_progress(steps, episode_rewards.len(), recent_mean)?;
                    for observer in &mut self.observers {
                        observer.on_progress(steps, episode_rewards.len(), recent_mean)?;
                    }
                    interval_rewards.clear();
                }

                if step.done {
                    finished = true;
                    if step.info.truncated {
                        truncated_episodes += 1;
                    }
                    break;
                }
                observation = step.observation;
                legal = step.info.legal_actions;
            }

            if !finished {
                // Step limit reached mid-episode.
                env.end_episode()?;
            }
            optimizer.end_episode()?;

            if finished {
                let episode = episode_rewards.len();
                episode_rewards.push(episode_reward);
                interval_rewards.push(episode_reward);
                metrics.on_episode_end(episode, episode_reward, episode_steps)?;
                for observer in &mut self.observers {
                    observer.on_episode_end(episode, episode_reward, episode_steps)?;
                }
            }
        }

        let result = TrainingResult {
            steps,
            episodes: episode_rewards.len(),
            mean_episode_reward: if episode_rewards.is_empty() {
                None
            } else {
                Some(episode_rewards.iter().mean())
            },
            infeasible_attempts,
            truncated_episodes,
            metrics: metrics.summary(),
            learning_curve: metrics.into_progress(),
        };
        debug!(?result, "training finished");

        for observer in &mut self.observers {
            observer.on_training_end(&result)?;
        }
        Ok(result)
    }
}
