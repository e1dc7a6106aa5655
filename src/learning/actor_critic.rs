//! Tabular advantage actor-critic.
//!
//! The actor keeps one preference per (state, action) and acts with a
//! softmax over the legal actions. The critic keeps a state value and turns
//! each transition into a one-step TD advantage.

use std::collections::{BTreeMap, HashMap};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{LearnedPolicy, LearningAlgorithm};
use crate::{
    Error, Result,
    ports::{PolicyOptimizer, Transition},
    types::{ActionId, Observation, StateKey},
};

#[derive(Debug, Clone, PartialEq)]
pub struct A2cHyperparameters {
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    pub discount_factor: f64,
}

impl Default for A2cHyperparameters {
    fn default() -> Self {
        Self {
            actor_learning_rate: 0.1,
            critic_learning_rate: 0.2,
            discount_factor: 0.99,
        }
    }
}

/// Tabular A2C optimizer.
#[derive(Debug, Clone)]
pub struct A2cOptimizer {
    params: A2cHyperparameters,
    preferences: HashMap<StateKey, HashMap<ActionId, f64>>,
    values: HashMap<StateKey, f64>,
    /// Legal set of the last state an action was chosen in.
    last_choice: Option<(StateKey, Vec<ActionId>)>,
    rng: StdRng,
}

impl A2cOptimizer {
    pub fn new(params: A2cHyperparameters) -> Self {
        Self {
            params,
            preferences: HashMap::new(),
            values: HashMap::new(),
            last_choice: None,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    fn preference(&self, state: &StateKey, action: ActionId) -> f64 {
        self.preferences
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn value(&self, state: &StateKey) -> f64 {
        self.values.get(state).copied().unwrap_or(0.0)
    }

    /// Softmax action probabilities over `legal`.
    pub fn probabilities(&self, state: &StateKey, legal: &[ActionId]) -> Vec<f64> {
        let prefs: Vec<f64> = legal.iter().map(|&a| self.preference(state, a)).collect();
        let max = prefs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = prefs.iter().map(|p| (p - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl Default for A2cOptimizer {
    fn default() -> Self {
        Self::new(A2cHyperparameters::default())
    }
}

impl PolicyOptimizer for A2cOptimizer {
    fn select_action(&mut self, observation: &Observation, legal: &[ActionId]) -> Result<ActionId> {
        let Some(&last) = legal.last() else {
            return Err(Error::NoActionsAvailable {
                observation: observation.values().to_vec(),
            });
        };
        let state = observation.key();
        let probabilities = self.probabilities(&state, legal);

        let ticket = self.rng.random::<f64>();
        let mut cumulative = 0.0;
        let mut chosen = last;
        for (&action, p) in legal.iter().zip(&probabilities) {
            cumulative += p;
            if ticket < cumulative {
                chosen = action;
                break;
            }
        }

        self.last_choice = Some((state, legal.to_vec()));
        Ok(chosen)
    }

    fn update(&mut self, transition: &Transition<'_>) -> Result<()> {
        let state = transition.observation.key();
        let next_value = if transition.terminated {
            0.0
        } else {
            self.value(&transition.next_observation.key())
        };
        let advantage =
            transition.reward + self.params.discount_factor * next_value - self.value(&state);

        *self.values.entry(state.clone()).or_insert(0.0) +=
            self.params.critic_learning_rate * advantage;

        let legal = match &self.last_choice {
            Some((key, legal)) if *key == state => legal.clone(),
            _ => vec![transition.action],
        };
        let probabilities = self.probabilities(&state, &legal);
        let step = self.params.actor_learning_rate * advantage;
        let row = self.preferences.entry(state).or_default();
        for (&action, p) in legal.iter().zip(&probabilities) {
            let indicator = if action == transition.action { 1.0 } else { 0.0 };
            *row.entry(action).or_insert(0.0) += step * (indicator - p);
        }
        Ok(())
    }

    fn end_episode(&mut self) -> Result<()> {
        self.last_choice = None;
        Ok(())
    }

    fn name(&self) -> &str {
        LearningAlgorithm::A2c.as_str()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    fn is_finite(&self) -> bool {
        self.preferences
            .values()
            .flat_map(HashMap::values)
            .all(|p| p.is_finite())
            && self.values.values().all(|v| v.is_finite())
    }

    fn table_size(&self) -> usize {
        self.preferences.values().map(HashMap::len).sum()
    }

    fn export_policy(&self, action_names: &[String]) -> LearnedPolicy {
        let mut scores: BTreeMap<String, BTreeMap<usize, f64>> = BTreeMap::new();
        for (state, row) in &self.preferences {
            let entry = scores.entry(state.to_string()).or_default();
            for (action, &preference) in row {
                entry.insert(action.index(), preference);
            }
        }
        let hyperparameters = BTreeMap::from([
            ("actor_learning_rate".to_string(), self.params.actor_learning_rate),
            ("critic_learning_rate".to_string(), self.params.critic_learning_rate),
            ("discount_factor".to_string(), self.params.discount_factor),
        ]);
        LearnedPolicy::new(
            LearningAlgorithm::A2c,
            action_names,
            scores,
            hyperparameters,
            None,
        )
    }
}
