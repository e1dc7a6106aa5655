//! Q-learning and SARSA optimizers
//!
//! Both learn a [`QTable`] with ε-greedy exploration; ε decays once per
//! episode. Q-learning bootstraps from the best next action, SARSA from the
//! next action it actually chooses, so its update for a transition is held
//! back until that choice is made.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::{LearnedPolicy, LearningAlgorithm, QTable};
use crate::{
    Error, Result,
    ports::{PolicyOptimizer, Transition},
    types::{ActionId, Observation, StateKey},
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Hyperparameters shared by the TD optimizers
#[derive(Debug, Clone, PartialEq)]
pub struct TdHyperparameters {
    /// α
    pub learning_rate: f64,
    /// γ
    pub discount_factor: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    /// Multiplicative decay per episode
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    /// Initial Q-value for unseen state-action pairs
    pub q_init: f64,
}

impl Default for TdHyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.99,
            epsilon: 1.0,
            epsilon_decay: 0.99,
            min_epsilon: 0.05,
            q_init: 0.0,
        }
    }
}

impl TdHyperparameters {
    fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("learning_rate".to_string(), self.learning_rate),
            ("discount_factor".to_string(), self.discount_factor),
            ("epsilon".to_string(), self.epsilon),
            ("epsilon_decay".to_string(), self.epsilon_decay),
            ("min_epsilon".to_string(), self.min_epsilon),
            ("q_init".to_string(), self.q_init),
        ])
    }
}

#[derive(Debug, Clone)]
struct EpsilonGreedy {
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    fn new(params: &TdHyperparameters) -> Self {
        Self {
            epsilon: params.epsilon,
            epsilon_decay: params.epsilon_decay,
            min_epsilon: params.min_epsilon,
            rng: build_rng(None),
        }
    }

    fn choose(
        &mut self,
        q_table: &QTable,
        state: &StateKey,
        observation: &Observation,
        legal: &[ActionId],
    ) -> Result<ActionId> {
        let chosen = if self.rng.random::<f64>() < self.epsilon {
            legal.choose(&mut self.rng).copied()
        } else {
            q_table.greedy_action(state, legal)
        };
        chosen.ok_or_else(|| Error::NoActionsAvailable {
            observation: observation.values().to_vec(),
        })
    }

    fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
    }
}

fn scores_of(q_table: &QTable) -> BTreeMap<String, BTreeMap<usize, f64>> {
    let mut scores: BTreeMap<String, BTreeMap<usize, f64>> = BTreeMap::new();
    for (state, action, q) in q_table.entries() {
        scores
            .entry(state.to_string())
            .or_default()
            .insert(action.index(), q);
    }
    scores
}

/// Q-learning optimizer (off-policy TD control)
#[derive(Debug, Clone)]
pub struct QLearningOptimizer {
    params: TdHyperparameters,
    q_table: QTable,
    exploration: EpsilonGreedy,
}

impl QLearningOptimizer {
    pub fn new(params: TdHyperparameters) -> Self {
        Self {
            q_table: QTable::new(params.learning_rate, params.discount_factor, params.q_init),
            exploration: EpsilonGreedy::new(&params),
            params,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon
    }
}

impl Default for QLearningOptimizer {
    fn default() -> Self {
        Self::new(TdHyperparameters::default())
    }
}

impl PolicyOptimizer for QLearningOptimizer {
    fn select_action(&mut self, observation: &Observation, legal: &[ActionId]) -> Result<ActionId> {
        self.exploration
            .choose(&self.q_table, &observation.key(), observation, legal)
    }

    fn update(&mut self, transition: &Transition<'_>) -> Result<()> {
        self.q_table.q_learning_update(
            &transition.observation.key(),
            transition.action,
            transition.reward,
            &transition.next_observation.key(),
            transition.next_legal,
            transition.terminated,
        );
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        self.exploration.decay();
        Ok(())
    }

    fn name(&self) -> &str {
        LearningAlgorithm::QLearning.as_str()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.exploration.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    fn is_finite(&self) -> bool {
        self.q_table.is_finite()
    }

    fn table_size(&self) -> usize {
        self.q_table.size()
    }

    fn export_policy(&self, action_names: &[String]) -> LearnedPolicy {
        LearnedPolicy::new(
            LearningAlgorithm::QLearning,
            action_names,
            scores_of(&self.q_table),
            self.params.to_map(),
            Some(self.exploration.epsilon),
        )
    }
}

/// Transition whose SARSA update waits for the next chosen action
#[derive(Debug, Clone)]
struct PendingUpdate {
    state: StateKey,
    action: ActionId,
    reward: f64,
    next_state: StateKey,
    next_legal: Vec<ActionId>,
}

/// SARSA optimizer (on-policy TD control)
#[derive(Debug, Clone)]
pub struct SarsaOptimizer {
    params: TdHyperparameters,
    q_table: QTable,
    exploration: EpsilonGreedy,
    pending: Option<PendingUpdate>,
}

impl SarsaOptimizer {
    pub fn new(params: TdHyperparameters) -> Self {
        Self {
            q_table: QTable::new(params.learning_rate, params.discount_factor, params.q_init),
            exploration: EpsilonGreedy::new(&params),
            params,
            pending: None,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon
    }
}

impl Default for SarsaOptimizer {
    fn default() -> Self {
        Self::new(TdHyperparameters::default())
    }
}

impl PolicyOptimizer for SarsaOptimizer {
    fn select_action(&mut self, observation: &Observation, legal: &[ActionId]) -> Result<ActionId> {
        let state = observation.key();
        let action = self
            .exploration
            .choose(&self.q_table, &state, observation, legal)?;
        if let Some(pending) = self.pending.take() {
            self.q_table.sarsa_update(
                &pending.state,
                pending.action,
                pending.reward,
                Some((&state, action)),
            );
        }
        Ok(action)
    }

    fn update(&mut self, transition: &Transition<'_>) -> Result<()> {
        let state = transition.observation.key();
        if transition.terminated {
            self.q_table
                .sarsa_update(&state, transition.action, transition.reward, None);
            self.pending = None;
        } else {
            self.pending = Some(PendingUpdate {
                state,
                action: transition.action,
                reward: transition.reward,
                next_state: transition.next_observation.key(),
                next_legal: transition.next_legal.to_vec(),
            });
        }
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        // A truncated episode never chooses its next action; bootstrap from
        // the greedy one.
        if let Some(pending) = self.pending.take() {
            let next = self
                .q_table
                .greedy_action(&pending.next_state, &pending.next_legal)
                .map(|action| (&pending.next_state, action));
            self.q_table
                .sarsa_update(&pending.state, pending.action, pending.reward, next);
        }
        self.exploration.decay();
        Ok(())
    }

    fn name(&self) -> &str {
        LearningAlgorithm::Sarsa.as_str()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.exploration.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    fn is_finite(&self) -> bool {
        self.q_table.is_finite()
    }

    fn table_size(&self) -> usize {
        self.q_table.size()
    }

    fn export_policy(&self, action_names: &[String]) -> LearnedPolicy {
        LearnedPolicy::new(
            LearningAlgorithm::Sarsa,
            action_names,
            scores_of(&self.q_table),
            self.params.to_map(),
            Some(self.exploration.epsilon),
        )
    }
}
