//! Values returned by [`super::Environment::reset`] and [`super::Environment::step`].

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, Observation};

/// Lifecycle phase of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Constructed, no episode started yet.
    Ready,
    /// An episode is in progress; `step` is valid.
    Running,
    /// The last episode terminated or was truncated.
    Done,
    /// The engine session has been released.
    Closed,
}

/// Start of an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetOutcome {
    pub observation: Observation,
    /// Empty exactly when the start configuration is terminal.
    pub legal_actions: Vec<ActionId>,
    pub terminal: bool,
}

/// How the engine handled the sampled outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// The configuration advanced.
    Transition { outcome: String },
    /// The sampled outcome is infeasible; the configuration did not change.
    Infeasible { outcome: String },
}

/// Side information of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub status: StepStatus,
    /// The program's terminal predicate holds.
    pub terminated: bool,
    /// The horizon was reached before termination.
    pub truncated: bool,
    /// Steps taken in this episode, including this one.
    pub steps: usize,
    /// Legal actions of the configuration after the step.
    pub legal_actions: Vec<ActionId>,
}

/// Result of one `step` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

impl Step {
    pub fn is_infeasible(&self) -> bool {
        matches!(self.info.status, StepStatus::Infeasible { .. })
    }

    pub fn outcome(&self) -> &str {
        match &self.info.status {
            StepStatus::Transition { outcome } | StepStatus::Infeasible { outcome } => outcome,
        }
    }
}
