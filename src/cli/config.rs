//! Argument and file configuration shared by the experiment commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::{
    app::{App, ExperimentConfig},
    environment::Environment,
    program::ProgramDescriptor,
};

/// Arguments naming a program and its configuration
#[derive(Args, Debug, Clone)]
pub struct ExperimentArgs {
    /// Path to the decision program
    pub program: PathBuf,

    /// Experiment configuration file (JSON)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Program descriptor (defaults to `<program stem>.descriptor.json`)
    #[arg(long)]
    pub descriptor: Option<PathBuf>,

    /// Random seed, overrides the configuration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Trace engine traffic and every episode
    #[arg(long)]
    pub debug: bool,
}

/// Everything an experiment command needs before opening the environment
#[derive(Debug, Clone)]
pub struct Experiment {
    pub program: PathBuf,
    pub config: ExperimentConfig,
    pub descriptor: ProgramDescriptor,
}

impl ExperimentArgs {
    pub fn load(&self) -> Result<Experiment> {
        if !self.program.is_file() {
            bail!("Program file not found: {}", self.program.display());
        }

        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.debug |= self.debug;

        let descriptor = ProgramDescriptor::resolve(&self.program, self.descriptor.as_deref())
            .context("Failed to load program descriptor")?;

        Ok(Experiment {
            program: self.program.clone(),
            config,
            descriptor,
        })
    }
}

impl Experiment {
    /// Build the app and open one environment for the program.
    pub fn open(&self) -> Result<(App, Environment)> {
        let app = App::from_config(&self.config);
        let env = app
            .open_environment(&self.program, self.config.environment_settings())
            .with_context(|| format!("Failed to open {}", self.program.display()))?;
        Ok((app, env))
    }

    /// Optimal parameters from the configuration, else from the descriptor.
    pub fn optimal_params(&self) -> Result<Vec<usize>> {
        let params = self
            .config
            .optimal_sim_params
            .clone()
            .unwrap_or_else(|| self.descriptor.optimal_params.clone());
        if params.is_empty() {
            bail!(
                "No optimal parameters for '{}': set optimalSimParams or the descriptor's optimalParams",
                self.descriptor.name
            );
        }
        self.descriptor.check_params(&params)?;
        Ok(params)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Parse a parameter vector written as a JSON array, e.g. `[0,2]`.
pub fn parse_sim_params(raw: &str) -> Result<Vec<usize>> {
    serde_json::from_str(raw.trim())
        .with_context(|| format!("Invalid simulation parameters '{raw}' (expected e.g. [0,2])"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_lists() {
        assert_eq!(parse_sim_params("[0,2]").unwrap(), vec![0, 2]);
        assert_eq!(parse_sim_params(" [1] ").unwrap(), vec![1]);
        assert!(parse_sim_params("0,2").is_err());
        assert!(parse_sim_params("[-1]").is_err());
    }
}
