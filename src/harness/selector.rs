//! Action selection at decision points.

use rand::rngs::StdRng;

use crate::{
    Result,
    types::{ActionId, Observation},
};

/// What a selector sees when the harness asks for an action.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPoint<'a> {
    /// Position among the episode's decision points (configurations with
    /// more than one legal action). Forced steps share the index of the
    /// next decision point.
    pub index: usize,
    pub observation: &'a Observation,
    /// Full legal set of the configuration, in vocabulary order.
    pub legal: &'a [ActionId],
    /// Legal actions not yet found infeasible at this configuration.
    /// Never empty.
    pub candidates: &'a [ActionId],
}

impl DecisionPoint<'_> {
    /// A point with a single remaining candidate needs no choice.
    pub fn is_forced(&self) -> bool {
        self.candidates.len() == 1
    }

    pub fn is_candidate(&self, action: ActionId) -> bool {
        self.candidates.contains(&action)
    }
}

/// Chooses actions during harness episodes.
///
/// Implemented by the rollout policies and by learned policies. The returned
/// action must be one of `point.candidates`.
pub trait ActionSelector {
    /// Pick an action. Randomized selectors draw from `rng`, which is the
    /// environment's seeded stream.
    fn select(&mut self, point: &DecisionPoint<'_>, rng: &mut StdRng) -> Result<ActionId>;

    /// Short label used in logs.
    fn label(&self) -> String;
}
