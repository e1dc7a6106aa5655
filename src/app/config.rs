//! Experiment configuration.

use std::{path::Path, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    adapters::{DEFAULT_ROUND_TRIP_TIMEOUT, ProcessEngineLoader, TableEngineLoader},
    environment::{DEFAULT_MAX_STEPS, EnvironmentSettings},
    harness::{DEFAULT_INFEASIBLE_PENALTY, TesterSettings},
    learning::LearningAlgorithm,
    ports::EngineLoader,
};

fn default_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_ROUND_TRIP_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

/// Which engine runs the program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineSpec {
    /// In-process tabular engine.
    #[default]
    Table,
    /// External engine process speaking the bridge protocol.
    Process {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(rename = "timeoutMs", default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl EngineSpec {
    pub fn loader(&self) -> Arc<dyn EngineLoader> {
        match self {
            EngineSpec::Table => Arc::new(TableEngineLoader),
            EngineSpec::Process {
                command,
                args,
                timeout_ms,
            } => Arc::new(
                ProcessEngineLoader::new(command.clone())
                    .with_args(args.clone())
                    .with_timeout(Duration::from_millis(*timeout_ms)),
            ),
        }
    }
}

/// Experiment configuration file.
///
/// Every key is optional.
///
/// # Examples
///
/// ```
/// use gmenv::app::ExperimentConfig;
///
/// let config: ExperimentConfig = serde_json::from_str(
///     r#"{ "seed": 7, "simOptimalIter": 100, "optimalSimParams": [0, 2] }"#,
/// )?;
/// assert_eq!(config.seed, Some(7));
/// assert!(config.forgive_penalty);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentConfig {
    /// Trace engine traffic and every harness episode
    pub debug: bool,
    pub seed: Option<u64>,
    /// Episodes for each random simulation (forgiven and charged)
    pub sim_random_iter: usize,
    /// Episodes for the custom biased simulation
    pub sim_custom_iter: usize,
    /// Episodes for the optimal simulation
    pub sim_optimal_iter: usize,
    /// Preferred indexes for the optimal simulation; falls back to the
    /// program descriptor
    pub optimal_sim_params: Option<Vec<usize>>,
    /// Preferred indexes for the custom biased simulation
    pub multi_run_sim_params: Vec<usize>,
    /// Forgiveness when evaluating a learned policy
    pub forgive_penalty: bool,
    #[serde(rename = "inFeasiblePenalty")]
    pub infeasible_penalty: f64,
    pub training_iter: usize,
    pub testing_iter: usize,
    pub learning_algorithm: LearningAlgorithm,
    pub learning_logging_interval: usize,
    pub max_steps: usize,
    pub engine: EngineSpec,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            debug: false,
            seed: None,
            sim_random_iter: 0,
            sim_custom_iter: 0,
            sim_optimal_iter: 0,
            optimal_sim_params: None,
            multi_run_sim_params: vec![1],
            forgive_penalty: true,
            infeasible_penalty: DEFAULT_INFEASIBLE_PENALTY,
            training_iter: 1000,
            testing_iter: 1000,
            learning_algorithm: LearningAlgorithm::A2c,
            learning_logging_interval: 0,
            max_steps: DEFAULT_MAX_STEPS,
            engine: EngineSpec::Table,
        }
    }
}

impl ExperimentConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config file {}", path.display()),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::invalid_config(format!("{}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::invalid_config("maxSteps must be positive"));
        }
        if !self.infeasible_penalty.is_finite() {
            return Err(Error::invalid_config("inFeasiblePenalty must be finite"));
        }
        if let EngineSpec::Process {
            command,
            timeout_ms,
            ..
        } = &self.engine
        {
            if command.trim().is_empty() {
                return Err(Error::invalid_config("engine command must not be empty"));
            }
            if *timeout_ms == 0 {
                return Err(Error::invalid_config("engine timeoutMs must be positive"));
            }
        }
        Ok(())
    }

    pub fn environment_settings(&self) -> EnvironmentSettings {
        let settings = EnvironmentSettings::new()
            .with_debug(self.debug)
            .with_max_steps(self.max_steps);
        match self.seed {
            Some(seed) => settings.with_seed(seed),
            None => settings,
        }
    }

    pub fn tester_settings(&self) -> TesterSettings {
        TesterSettings {
            infeasible_penalty: self.infeasible_penalty,
            forgive_penalty: self.forgive_penalty,
            debug: self.debug,
            show_progress: false,
        }
    }
}
