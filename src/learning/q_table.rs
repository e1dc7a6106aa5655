//! Q-table for temporal difference learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, StateKey};

/// Q-table mapping (state, action) pairs to Q-values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    /// Q-values: state -> action -> Q-value
    q_values: HashMap<StateKey, HashMap<ActionId, f64>>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
    /// Initial Q-value for unseen state-action pairs
    q_init: f64,
}

impl QTable {
    pub fn new(learning_rate: f64, discount_factor: f64, q_init: f64) -> Self {
        Self {
            q_values: HashMap::new(),
            learning_rate,
            discount_factor,
            q_init,
        }
    }

    pub fn get(&self, state: &StateKey, action: ActionId) -> f64 {
        self.q_values
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(self.q_init)
    }

    pub fn set(&mut self, state: &StateKey, action: ActionId, value: f64) {
        match self.q_values.get_mut(state) {
            Some(row) => {
                row.insert(action, value);
            }
            None => {
                self.q_values
                    .insert(state.clone(), HashMap::from([(action, value)]));
            }
        }
    }

    pub fn max_q(&self, state: &StateKey, legal: &[ActionId]) -> f64 {
        legal
            .iter()
            .map(|&action| self.get(state, action))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Greedy action from `legal`; ties go to the earliest action in `legal`
    pub fn greedy_action(&self, state: &StateKey, legal: &[ActionId]) -> Option<ActionId> {
        let mut best: Option<(ActionId, f64)> = None;
        for &action in legal {
            let q = self.get(state, action);
            match best {
                Some((_, best_q)) if q <= best_q => {}
                _ => best = Some((action, q)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    pub fn q_learning_update(
        &mut self,
        state: &StateKey,
        action: ActionId,
        reward: f64,
        next_state: &StateKey,
        next_legal: &[ActionId],
        done: bool,
    ) {
        let max_next_q = if done {
            0.0
        } else {
            self.max_q(next_state, next_legal)
        };
        self.td_update(state, action, reward + self.discount_factor * max_next_q);
    }

    /// SARSA update: on-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
    pub fn sarsa_update(
        &mut self,
        state: &StateKey,
        action: ActionId,
        reward: f64,
        next: Option<(&StateKey, ActionId)>,
    ) {
        let next_q = next.map_or(0.0, |(next_state, next_action)| {
            self.get(next_state, next_action)
        });
        self.td_update(state, action, reward + self.discount_factor * next_q);
    }

    fn td_update(&mut self, state: &StateKey, action: ActionId, td_target: f64) {
        let current_q = self.get(state, action);
        let new_q = current_q + self.learning_rate * (td_target - current_q);
        self.set(state, action, new_q);
    }

    pub fn size(&self) -> usize {
        self.q_values.values().map(HashMap::len).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.q_values
            .values()
            .flat_map(HashMap::values)
            .all(|q| q.is_finite())
    }

    /// All entries, for export
    pub fn entries(&self) -> impl Iterator<Item = (&StateKey, ActionId, f64)> {
        self.q_values.iter().flat_map(|(state, row)| {
            row.iter().map(move |(&action, &q)| (state, action, q))
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}
