//! Engine port - the boundary to a running decision engine.
//!
//! An [`EngineSession`] is one engine instance loaded with one program. The
//! session holds the program's current configuration; every call is a
//! blocking round-trip and the session is never shared between callers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{ActionId, Observation},
};

/// Static description of a loaded program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramInfo {
    /// Action vocabulary, indexed by [`ActionId`].
    pub actions: Vec<String>,
    /// Length of every observation the session will report.
    pub observation_len: usize,
}

/// Result of querying the current configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub observation: Observation,
    pub legal_actions: Vec<ActionId>,
    pub terminal: bool,
}

/// One possible outcome of a stochastic action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeOption {
    pub id: String,
    pub probability: f64,
}

/// What happened when an outcome was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    /// The configuration advanced and the transition earned `reward`.
    Transition { reward: f64 },
    /// The sampled outcome is infeasible; the configuration is unchanged.
    Infeasible,
}

/// A running engine loaded with a single program.
///
/// Implementations must keep the configuration between calls and must not
/// be reentrant. Ownership of the session is the only synchronisation.
pub trait EngineSession: Send {
    /// Describe the loaded program. Called once after loading.
    fn describe(&mut self) -> Result<ProgramInfo>;

    /// Return to the program's start configuration.
    fn reset(&mut self) -> Result<()>;

    /// Observation, legal actions and terminal flag of the current configuration.
    fn snapshot(&mut self) -> Result<Snapshot>;

    /// Legal actions at the current configuration, in vocabulary order.
    fn legal_actions(&mut self) -> Result<Vec<ActionId>>;

    /// Outcome distribution of `action` at the current configuration.
    fn outcomes(&mut self, action: ActionId) -> Result<Vec<OutcomeOption>>;

    /// Apply `action` with the chosen `outcome`.
    fn apply(&mut self, action: ActionId, outcome: &str) -> Result<Applied>;

    /// Release the engine. Must be idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Factory that starts sessions for program files.
pub trait EngineLoader: Send + Sync {
    /// Start a session for `program`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EngineLoad`] if the file is missing,
    /// unparsable, or the engine cannot start.
    fn load(&self, program: &Path) -> Result<Box<dyn EngineSession>>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
