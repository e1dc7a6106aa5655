//! Optimizer port - abstraction over policy-optimization algorithms
//!
//! The training pipeline drives an environment and hands every transition to
//! a [`PolicyOptimizer`]. Algorithms are adapters behind this port, so the
//! pipeline never depends on a particular learning rule.

use crate::{
    Result,
    learning::LearnedPolicy,
    types::{ActionId, Observation},
};

/// One environment transition as seen by a learner.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub observation: &'a Observation,
    pub action: ActionId,
    pub reward: f64,
    pub next_observation: &'a Observation,
    /// Legal actions at `next_observation` (empty when terminated).
    pub next_legal: &'a [ActionId],
    /// The program's terminal predicate holds after the transition.
    pub terminated: bool,
}

/// Policy optimizer trait - unified interface for all learning algorithms
///
/// # Examples
///
/// ```no_run
/// use gmenv::ports::PolicyOptimizer;
///
/// fn describe(optimizer: &dyn PolicyOptimizer) -> String {
///     format!("{} ({} entries)", optimizer.name(), optimizer.table_size())
/// }
/// ```
pub trait PolicyOptimizer: Send {
    /// Choose an action for training (may explore).
    ///
    /// # Errors
    ///
    /// Returns an error if `legal` is empty.
    fn select_action(&mut self, observation: &Observation, legal: &[ActionId])
    -> Result<ActionId>;

    /// Learn from one transition.
    fn update(&mut self, transition: &Transition<'_>) -> Result<()>;

    /// Called when an episode ends, by termination or truncation.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn end_episode(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get the optimizer's name.
    fn name(&self) -> &str;

    /// Seed the optimizer's internal random number generator.
    ///
    /// # Default Implementation
    ///
    /// Does nothing and returns `Ok(())`.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    /// True while every learned value is finite.
    fn is_finite(&self) -> bool;

    /// Number of learned table entries.
    fn table_size(&self) -> usize;

    /// Freeze the current parameters into a greedy policy.
    fn export_policy(&self, action_names: &[String]) -> LearnedPolicy;
}
