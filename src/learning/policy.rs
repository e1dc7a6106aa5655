//! Frozen greedy policies produced by training.

use std::{collections::BTreeMap, fmt};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{LearningAlgorithm, TrainingResult};
use crate::{
    Error, Result,
    harness::{ActionSelector, DecisionPoint},
    types::{ActionId, Observation},
};

/// Printable summary of what was learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedParameters {
    pub algorithm: LearningAlgorithm,
    pub hyperparameters: BTreeMap<String, f64>,
    pub training_steps: usize,
    pub training_episodes: usize,
    pub mean_training_reward: Option<f64>,
    pub states_visited: usize,
    pub table_entries: usize,
    /// Final exploration rate, for epsilon-greedy learners
    pub exploration: Option<f64>,
    /// Greedy action name per visited state key
    pub greedy_actions: BTreeMap<String, String>,
}

impl fmt::Display for LearnedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "algorithm: {}", self.algorithm)?;
        let hyper: Vec<String> = self
            .hyperparameters
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        writeln!(f, "hyperparameters: {}", hyper.join(", "))?;
        writeln!(
            f,
            "training: {} steps, {} episodes",
            self.training_steps, self.training_episodes
        )?;
        if let Some(mean) = self.mean_training_reward {
            writeln!(f, "mean training reward: {mean:.4}")?;
        }
        if let Some(epsilon) = self.exploration {
            writeln!(f, "final exploration: {epsilon:.4}")?;
        }
        write!(
            f,
            "table: {} states, {} entries",
            self.states_visited, self.table_entries
        )?;
        for (state, action) in &self.greedy_actions {
            write!(f, "\n  [{state}] -> {action}")?;
        }
        Ok(())
    }
}

/// Greedy policy over a learned score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPolicy {
    pub algorithm: LearningAlgorithm,
    pub action_names: Vec<String>,
    /// state key -> action index -> score (Q-value or actor preference)
    pub scores: BTreeMap<String, BTreeMap<usize, f64>>,
    pub parameters: LearnedParameters,
}

impl LearnedPolicy {
    pub fn new(
        algorithm: LearningAlgorithm,
        action_names: &[String],
        scores: BTreeMap<String, BTreeMap<usize, f64>>,
        hyperparameters: BTreeMap<String, f64>,
        exploration: Option<f64>,
    ) -> Self {
        let greedy_actions = scores
            .iter()
            .filter_map(|(state, actions)| {
                let candidates: Vec<ActionId> = actions.keys().copied().map(ActionId::new).collect();
                best_of(actions, &candidates).map(|action| {
                    let name = action_names
                        .get(action.index())
                        .cloned()
                        .unwrap_or_else(|| action.to_string());
                    (state.clone(), name)
                })
            })
            .collect();
        let table_entries = scores.values().map(BTreeMap::len).sum();

        let parameters = LearnedParameters {
            algorithm,
            hyperparameters,
            training_steps: 0,
            training_episodes: 0,
            mean_training_reward: None,
            states_visited: scores.len(),
            table_entries,
            exploration,
            greedy_actions,
        };
        Self {
            algorithm,
            action_names: action_names.to_vec(),
            scores,
            parameters,
        }
    }

    /// Copy training statistics into the parameters record.
    pub fn record_training(&mut self, result: &TrainingResult) {
        self.parameters.training_steps = result.steps;
        self.parameters.training_episodes = result.episodes;
        self.parameters.mean_training_reward = result.mean_episode_reward;
    }

    /// Highest-scoring action among `candidates`.
    ///
    /// Unscored actions count as 0. Ties, and states never visited in
    /// training, go to the first candidate.
    pub fn greedy(&self, observation: &Observation, candidates: &[ActionId]) -> Option<ActionId> {
        match self.scores.get(observation.key().as_str()) {
            Some(actions) => best_of(actions, candidates),
            None => candidates.first().copied(),
        }
    }

    pub fn action_name(&self, action: ActionId) -> Option<&str> {
        self.action_names.get(action.index()).map(String::as_str)
    }
}

fn best_of(actions: &BTreeMap<usize, f64>, candidates: &[ActionId]) -> Option<ActionId> {
    let mut best: Option<(ActionId, f64)> = None;
    for &action in candidates {
        let score = actions.get(&action.index()).copied().unwrap_or(0.0);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((action, score)),
        }
    }
    best.map(|(action, _)| action)
}

impl ActionSelector for LearnedPolicy {
    fn select(&mut self, point: &DecisionPoint<'_>, _rng: &mut StdRng) -> Result<ActionId> {
        self.greedy(point.observation, point.candidates)
            .ok_or_else(|| Error::NoActionsAvailable {
                observation: point.observation.values().to_vec(),
            })
    }

    fn label(&self) -> String {
        format!("learned {}", self.algorithm)
    }
}
