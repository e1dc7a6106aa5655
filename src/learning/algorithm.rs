//! Names of the supported policy-optimization algorithms.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{A2cOptimizer, QLearningOptimizer, SarsaOptimizer};
use crate::{Error, ports::PolicyOptimizer};

/// Algorithm selected by `learningAlgorithm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningAlgorithm {
    #[serde(rename = "A2C", alias = "a2c")]
    A2c,
    #[serde(rename = "QLEARNING", alias = "qlearning", alias = "Q-LEARNING")]
    QLearning,
    #[serde(rename = "SARSA", alias = "sarsa")]
    Sarsa,
}

impl LearningAlgorithm {
    pub const ALL: [LearningAlgorithm; 3] = [
        LearningAlgorithm::A2c,
        LearningAlgorithm::QLearning,
        LearningAlgorithm::Sarsa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningAlgorithm::A2c => "A2C",
            LearningAlgorithm::QLearning => "QLEARNING",
            LearningAlgorithm::Sarsa => "SARSA",
        }
    }

    /// Fresh optimizer with default hyperparameters.
    pub fn build(&self) -> Box<dyn PolicyOptimizer> {
        match self {
            LearningAlgorithm::A2c => Box::new(A2cOptimizer::default()),
            LearningAlgorithm::QLearning => Box::new(QLearningOptimizer::default()),
            LearningAlgorithm::Sarsa => Box::new(SarsaOptimizer::default()),
        }
    }
}

impl fmt::Display for LearningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "A2C" => Ok(LearningAlgorithm::A2c),
            "QLEARNING" => Ok(LearningAlgorithm::QLearning),
            "SARSA" => Ok(LearningAlgorithm::Sarsa),
            _ => Err(Error::ParseAlgorithm {
                input: s.to_string(),
                expected: LearningAlgorithm::ALL
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("a2c".parse::<LearningAlgorithm>().unwrap(), LearningAlgorithm::A2c);
        assert_eq!(
            "Q-Learning".parse::<LearningAlgorithm>().unwrap(),
            LearningAlgorithm::QLearning
        );
        assert_eq!("SARSA".parse::<LearningAlgorithm>().unwrap(), LearningAlgorithm::Sarsa);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "PPO".parse::<LearningAlgorithm>().unwrap_err();
        assert!(err.to_string().contains("A2C, QLEARNING, SARSA"));
    }

    #[test]
    fn serde_uses_config_spelling() {
        let json = serde_json::to_string(&LearningAlgorithm::QLearning).unwrap();
        assert_eq!(json, "\"QLEARNING\"");
        let parsed: LearningAlgorithm = serde_json::from_str("\"A2C\"").unwrap();
        assert_eq!(parsed, LearningAlgorithm::A2c);
    }

    #[test]
    fn builds_named_optimizers() {
        for algorithm in LearningAlgorithm::ALL {
            assert_eq!(algorithm.build().name(), algorithm.as_str());
        }
    }
}
