//! Dependency injection container.
//!
//! The container owns the infrastructure dependencies (engine loader, policy
//! repository) and provides factory methods for the domain objects built on
//! them.

use std::{path::Path, sync::Arc};

use super::config::ExperimentConfig;
use crate::{
    Result,
    adapters::{MsgPackRepository, TableEngineLoader},
    environment::{Environment, EnvironmentSettings},
    learning::LearnedPolicy,
    ports::{EngineLoader, PolicyRepository},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use gmenv::app::{App, ExperimentConfig};
/// use gmenv::environment::EnvironmentSettings;
/// use std::path::Path;
///
/// let config = ExperimentConfig::load(Path::new("config.json"))?;
/// let app = App::from_config(&config);
/// let env = app.open_environment(Path::new("build.json"), config.environment_settings())?;
/// # Ok::<(), gmenv::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use gmenv::app::App;
/// use gmenv::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Starts engine sessions for program files
    loader: Arc<dyn EngineLoader>,
    /// Repository for learned-policy persistence
    policy_repository: Arc<dyn PolicyRepository + Send + Sync>,
    /// Seed for environments whose settings carry none
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Uses:
    /// - `TableEngineLoader` for program files
    /// - `MsgPackRepository` for policy persistence
    /// - No default seed (non-deterministic RNG)
    pub fn new() -> Self {
        Self {
            loader: Arc::new(TableEngineLoader),
            policy_repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// App wired from an experiment configuration.
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            loader: config.engine.loader(),
            policy_repository: Arc::new(MsgPackRepository::new()),
            default_seed: config.seed,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn loader(&self) -> Arc<dyn EngineLoader> {
        Arc::clone(&self.loader)
    }

    pub fn policy_repository(&self) -> Arc<dyn PolicyRepository + Send + Sync> {
        Arc::clone(&self.policy_repository)
    }

    /// Open an environment for `program`.
    ///
    /// The container's default seed applies when `settings` has none.
    pub fn open_environment(
        &self,
        program: &Path,
        settings: EnvironmentSettings,
    ) -> Result<Environment> {
        let settings = match (settings.seed, self.default_seed) {
            (None, Some(seed)) => settings.with_seed(seed),
            _ => settings,
        };
        Environment::open(self.loader.as_ref(), program, settings)
    }

    pub fn save_policy(&self, policy: &LearnedPolicy, path: &Path) -> Result<()> {
        self.policy_repository.save(policy, path)
    }

    pub fn load_policy(&self, path: &Path) -> Result<LearnedPolicy> {
        self.policy_repository.load(path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
pub struct AppBuilder {
    loader: Option<Arc<dyn EngineLoader>>,
    policy_repository: Option<Arc<dyn PolicyRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            loader: None,
            policy_repository: None,
            default_seed: None,
        }
    }

    /// Set a custom engine loader.
    pub fn with_loader<L: EngineLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Set a custom policy repository.
    pub fn with_repository<R: PolicyRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.policy_repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for every environment opened by this app.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Unset dependencies fall back to the production ones.
    pub fn build(self) -> App {
        App {
            loader: self.loader.unwrap_or_else(|| Arc::new(TableEngineLoader)),
            policy_repository: self
                .policy_repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
