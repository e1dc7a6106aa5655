//! Construction-time settings for an environment.

/// Default horizon: episodes longer than this are truncated.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Settings applied when an [`super::Environment`] is opened.
///
/// # Examples
///
/// ```
/// use gmenv::environment::EnvironmentSettings;
///
/// let settings = EnvironmentSettings::new()
///     .with_seed(42)
///     .with_debug(true)
///     .with_max_steps(50);
/// assert_eq!(settings.seed, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSettings {
    /// Seed for outcome sampling and randomized rollout policies
    pub seed: Option<u64>,
    /// Trace every engine query and response
    pub debug: bool,
    /// Horizon safety bound
    pub max_steps: usize,
}

impl EnvironmentSettings {
    pub fn new() -> Self {
        Self {
            seed: None,
            debug: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self::new()
    }
}
