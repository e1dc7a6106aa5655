//! Results of harness batches.

use std::path::Path;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Result,
    learning::{LearnedPolicy, TrainingResult},
};

/// Outcome of one harness episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Accumulated reward, including charged penalties
    pub reward: f64,
    pub steps: usize,
    pub infeasible_attempts: usize,
    pub penalties_charged: usize,
    /// The horizon ended the episode
    pub truncated: bool,
    /// Every candidate at some decision point proved infeasible
    pub dead_end: bool,
}

/// Aggregate of a simulation or evaluation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub mean_reward: f64,
    /// Sample standard deviation of episode rewards (0 for one episode)
    pub std_dev: f64,
    pub episodes: usize,
    pub episode_rewards: Vec<f64>,
    pub truncated: usize,
    pub dead_ends: usize,
    pub infeasible_attempts: usize,
    pub penalties_charged: usize,
}

impl SimulationReport {
    pub fn from_episodes(episodes: &[EpisodeSummary]) -> Self {
        let episode_rewards: Vec<f64> = episodes.iter().map(|e| e.reward).collect();
        let mean_reward = if episode_rewards.is_empty() {
            0.0
        } else {
            episode_rewards.iter().mean()
        };
        let std_dev = if episode_rewards.len() < 2 {
            0.0
        } else {
            episode_rewards.iter().std_dev()
        };

        Self {
            mean_reward,
            std_dev,
            episodes: episodes.len(),
            episode_rewards,
            truncated: episodes.iter().filter(|e| e.truncated).count(),
            dead_ends: episodes.iter().filter(|e| e.dead_end).count(),
            infeasible_attempts: episodes.iter().map(|e| e.infeasible_attempts).sum(),
            penalties_charged: episodes.iter().map(|e| e.penalties_charged).sum(),
        }
    }

    /// Write one `episode,reward` row per episode.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["episode", "reward"])?;
        for (episode, reward) in self.episode_rewards.iter().enumerate() {
            writer.write_record([episode.to_string(), reward.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Result of a train-then-evaluate cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningReport {
    /// Mean reward of the greedy learned policy
    pub mean_reward: f64,
    pub evaluation: SimulationReport,
    pub training: TrainingResult,
    pub policy: LearnedPolicy,
}
