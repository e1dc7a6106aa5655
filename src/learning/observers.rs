//! Training observers
//!
//! Observers collect data during training without coupling the training loop
//! to a particular output.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::TrainingResult;
use crate::{Error, Result, ports::TrainingObserver};

/// Logs progress events through `tracing`
pub struct TracingObserver {
    algorithm: String,
}

impl TracingObserver {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
        }
    }
}

impl TrainingObserver for TracingObserver {
    fn on_progress(&mut self, step: usize, episodes: usize, recent_mean: Option<f64>) -> Result<()> {
        match recent_mean {
            Some(mean) => info!(
                algorithm = %self.algorithm,
                step,
                episodes,
                recent_mean = mean,
                "training progress"
            ),
            None => info!(algorithm = %self.algorithm, step, episodes, "training progress"),
        }
        Ok(())
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        info!(
            algorithm = %self.algorithm,
            steps = result.steps,
            episodes = result.episodes,
            mean_reward = ?result.mean_episode_reward,
            infeasible = result.infeasible_attempts,
            "training complete"
        );
        Ok(())
    }
}

/// Progress bar observer - shows training progress in steps
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    steps: usize,
    episodes: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            steps: 0,
            episodes: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_training_start(&mut self, total_steps: usize) -> Result<()> {
        let pb = ProgressBar::new(total_steps as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, _episode: usize, _reward: f64, steps: usize) -> Result<()> {
        self.steps += steps;
        self.episodes += 1;
        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.steps as u64);
            pb.set_message(format!("{} episodes", self.episodes));
        }
        Ok(())
    }

    fn on_progress(&mut self, step: usize, episodes: usize, recent_mean: Option<f64>) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(step as u64);
            match recent_mean {
                Some(mean) => pb.set_message(format!("{episodes} episodes, mean {mean:.3}")),
                None => pb.set_message(format!("{episodes} episodes")),
            }
        }
        Ok(())
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(result.steps as u64);
            pb.finish_with_message(format!("{} episodes", result.episodes));
        }
        Ok(())
    }
}

/// Metrics observer - tracks episode rewards in memory
#[derive(Debug, Default)]
pub struct MetricsObserver {
    episode_rewards: Vec<f64>,
    episode_lengths: Vec<usize>,
    progress: Vec<ProgressPoint>,
}

/// One progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    pub step: usize,
    pub episodes: usize,
    pub recent_mean: Option<f64>,
}

/// Summary of training metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub mean_reward: f64,
    pub best_reward: Option<f64>,
    pub avg_episode_length: f64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> &[ProgressPoint] {
        &self.progress
    }

    pub fn into_progress(self) -> Vec<ProgressPoint> {
        self.progress
    }

    pub fn summary(&self) -> MetricsSummary {
        let episodes = self.episode_rewards.len();
        let mean_reward = if episodes == 0 {
            0.0
        } else {
            self.episode_rewards.iter().sum::<f64>() / episodes as f64
        };
        let avg_episode_length = if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
        };
        MetricsSummary {
            episodes,
            mean_reward,
            best_reward: self.episode_rewards.iter().copied().reduce(f64::max),
            avg_episode_length,
        }
    }
}

impl TrainingObserver for MetricsObserver {
    fn on_episode_end(&mut self, _episode: usize, reward: f64, steps: usize) -> Result<()> {
        self.episode_rewards.push(reward);
        self.episode_lengths.push(steps);
        Ok(())
    }

    fn on_progress(&mut self, step: usize, episodes: usize, recent_mean: Option<f64>) -> Result<()> {
        self.progress.push(ProgressPoint {
            step,
            episodes,
            recent_mean,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_observer_summarizes_episodes() {
        let mut observer = MetricsObserver::new();
        observer.on_episode_end(0, 1.0, 3).unwrap();
        observer.on_episode_end(1, 0.0, 1).unwrap();
        observer.on_progress(4, 2, Some(0.5)).unwrap();

        let summary = observer.summary();
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.mean_reward, 0.5);
        assert_eq!(summary.best_reward, Some(1.0));
        assert_eq!(summary.avg_episode_length, 2.0);
        assert_eq!(observer.progress().len(), 1);
    }

    #[test]
    fn empty_metrics_are_zero() {
        let summary = MetricsObserver::new().summary();
        assert_eq!(summary.episodes, 0);
        assert_eq!(summary.best_reward, None);
    }
}
