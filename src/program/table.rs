//! Finite tabular decision programs.
//!
//! A tabular program lists every configuration explicitly: its feature
//! vector, whether it is terminal, and for each legal action the outcome
//! distribution with successor and reward. It is the format served by
//! [`crate::adapters::TableEngine`].

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One outcome of an action in a tabular program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSpec {
    pub outcome: String,
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub reward: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub infeasible: bool,
}

/// One configuration of a tabular program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub features: Vec<f64>,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<OutcomeSpec>>,
}

/// A complete tabular decision program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProgram {
    pub name: String,
    pub start: String,
    pub actions: Vec<String>,
    pub states: BTreeMap<String, StateSpec>,
}

impl TableProgram {
    /// Read and validate a program file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineLoad`] if the file is missing, is not valid
    /// JSON, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |reason: String| Error::EngineLoad {
            program: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let program: TableProgram =
            serde_json::from_str(&text).map_err(|e| load_error(format!("parse error: {e}")))?;
        program.validate().map_err(load_error)?;
        Ok(program)
    }

    /// Check the structural invariants of the program.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.actions.is_empty() {
            return Err("program declares no actions".to_string());
        }
        if !self.states.contains_key(&self.start) {
            return Err(format!("start state '{}' is not defined", self.start));
        }

        let feature_len = self
            .states
            .get(&self.start)
            .map(|s| s.features.len())
            .unwrap_or_default();

        for (name, state) in &self.states {
            if state.features.len() != feature_len {
                return Err(format!(
                    "state '{name}' has {} features, expected {feature_len}",
                    state.features.len()
                ));
            }
            if state.terminal && !state.actions.is_empty() {
                return Err(format!("terminal state '{name}' declares actions"));
            }
            if !state.terminal && state.actions.is_empty() {
                return Err(format!("non-terminal state '{name}' has no actions"));
            }
            for (action, outcomes) in &state.actions {
                self.validate_action(name, action, outcomes)?;
            }
        }
        Ok(())
    }

    fn validate_action(
        &self,
        state: &str,
        action: &str,
        outcomes: &[OutcomeSpec],
    ) -> std::result::Result<(), String> {
        if self.action_index(action).is_none() {
            return Err(format!(
                "state '{state}' uses undeclared action '{action}'"
            ));
        }
        if outcomes.is_empty() {
            return Err(format!("action '{action}' in '{state}' has no outcomes"));
        }

        let mut total = 0.0;
        for outcome in outcomes {
            if !(outcome.probability >= 0.0 && outcome.probability.is_finite()) {
                return Err(format!(
                    "outcome '{}' of '{action}' in '{state}' has invalid probability {}",
                    outcome.outcome, outcome.probability
                ));
            }
            total += outcome.probability;
            if outcome.infeasible {
                continue;
            }
            match &outcome.next {
                Some(next) if self.states.contains_key(next) => {}
                Some(next) => {
                    return Err(format!(
                        "outcome '{}' of '{action}' in '{state}' leads to unknown state '{next}'",
                        outcome.outcome
                    ));
                }
                None => {
                    return Err(format!(
                        "feasible outcome '{}' of '{action}' in '{state}' has no successor",
                        outcome.outcome
                    ));
                }
            }
        }

        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(format!(
                "outcome probabilities of '{action}' in '{state}' sum to {total}"
            ));
        }
        Ok(())
    }

    /// Index of `action` in the vocabulary.
    pub fn action_index(&self, action: &str) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    pub fn state(&self, name: &str) -> Option<&StateSpec> {
        self.states.get(name)
    }

    pub fn observation_len(&self) -> usize {
        self.states
            .get(&self.start)
            .map(|s| s.features.len())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_program() -> TableProgram {
        serde_json::from_value(serde_json::json!({
            "name": "coin",
            "start": "s0",
            "actions": ["flip"],
            "states": {
                "s0": {
                    "features": [0.0],
                    "actions": {
                        "flip": [
                            { "outcome": "heads", "probability": 0.5, "next": "end", "reward": 1.0 },
                            { "outcome": "tails", "probability": 0.5, "next": "end" }
                        ]
                    }
                },
                "end": { "features": [1.0], "terminal": true }
            }
        }))
        .unwrap()
    }

    #[test]
    fn valid_program_passes() {
        assert!(coin_program().validate().is_ok());
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        let mut program = coin_program();
        program.states.get_mut("s0").unwrap().actions.get_mut("flip").unwrap()[0].probability =
            0.7;
        let err = program.validate().unwrap_err();
        assert!(err.contains("sum to"), "{err}");
    }

    #[test]
    fn unknown_successor_is_rejected() {
        let mut program = coin_program();
        program.states.get_mut("s0").unwrap().actions.get_mut("flip").unwrap()[1].next =
            Some("nowhere".to_string());
        assert!(program.validate().unwrap_err().contains("unknown state"));
    }

    #[test]
    fn feature_lengths_must_match() {
        let mut program = coin_program();
        program.states.get_mut("end").unwrap().features = vec![1.0, 2.0];
        assert!(program.validate().unwrap_err().contains("features"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = TableProgram::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::EngineLoad { .. }));
    }
}
