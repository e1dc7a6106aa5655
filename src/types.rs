//! Newtype wrappers for improved type safety and domain modeling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of an action in the program's action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(usize);

impl ActionId {
    pub const fn new(index: usize) -> Self {
        ActionId(index)
    }

    /// Get the inner value.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionId {
    fn from(index: usize) -> Self {
        ActionId(index)
    }
}

impl From<ActionId> for usize {
    fn from(action: ActionId) -> Self {
        action.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-length numeric encoding of an engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(Vec<f64>);

impl Observation {
    pub fn new(values: Vec<f64>) -> Self {
        Observation(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key used by tabular learners. Two observations share a key exactly
    /// when their components print identically.
    pub fn key(&self) -> StateKey {
        let parts: Vec<String> = self.0.iter().map(|v| format!("{v}")).collect();
        StateKey(parts.join(","))
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for Observation {
    fn from(values: Vec<f64>) -> Self {
        Observation(values)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.key())
    }
}

/// Table key derived from an [`Observation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&Observation> for StateKey {
    fn from(observation: &Observation) -> Self {
        observation.key()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_key_is_stable() {
        let obs = Observation::new(vec![1.0, 0.0, 2.5]);
        assert_eq!(obs.key().as_str(), "1,0,2.5");
        assert_eq!(obs.key(), Observation::new(vec![1.0, 0.0, 2.5]).key());
    }

    #[test]
    fn action_id_round_trips_through_usize() {
        let action = ActionId::from(3);
        assert_eq!(usize::from(action), 3);
        assert_eq!(action.to_string(), "3");
    }
}
