//! Observer port - abstraction for training observation
//!
//! Observers receive training events without coupling the training loop to
//! a particular output (progress bars, logs, in-memory metrics).

use crate::{Result, learning::TrainingResult};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_steps)` - once
/// 2. `on_episode_end(...)` - after every completed episode
/// 3. `on_progress(...)` - every logging interval
/// 4. `on_training_end(result)` - once
///
/// # Examples
///
/// ```no_run
/// use gmenv::ports::TrainingObserver;
///
/// struct EpisodeCounter {
///     episodes: usize,
/// }
///
/// impl TrainingObserver for EpisodeCounter {
///     fn on_episode_end(&mut self, _episode: usize, _reward: f64, _steps: usize) -> gmenv::Result<()> {
///         self.episodes += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait TrainingObserver: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_steps: usize) -> Result<()> {
        Ok(())
    }

    /// Called after an episode ends.
    ///
    /// * `episode` - index of the episode (0-based)
    /// * `reward` - accumulated training reward of the episode
    /// * `steps` - number of environment steps it took
    fn on_episode_end(&mut self, _episode: usize, _reward: f64, _steps: usize) -> Result<()> {
        Ok(())
    }

    /// Called every logging interval.
    ///
    /// * `step` - interaction steps completed so far
    /// * `episodes` - completed episodes so far
    /// * `recent_mean` - mean reward of episodes finished since the last call,
    ///   `None` if no episode finished in the interval
    fn on_progress(
        &mut self,
        _step: usize,
        _episodes: usize,
        _recent_mean: Option<f64>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        Ok(())
    }
}
