//! Per-program descriptors.
//!
//! A descriptor travels alongside a program file and states which trials
//! apply to it, the shape of its rollout-policy parameters and, when known,
//! its analytic optimum.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Trials the driver can run against a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialKind {
    /// Rollout with the optimal parameter vector.
    Optimal,
    /// Uniform-random rollout, with and without penalty forgiveness.
    Random,
    /// Semi-random rollout biased by a custom parameter vector.
    Custom,
    /// Train-then-evaluate cycle.
    Learning,
}

impl TrialKind {
    pub const ALL: [TrialKind; 4] = [
        TrialKind::Optimal,
        TrialKind::Random,
        TrialKind::Custom,
        TrialKind::Learning,
    ];
}

fn default_tolerance() -> f64 {
    0.5
}

fn default_trials() -> Vec<TrialKind> {
    TrialKind::ALL.to_vec()
}

/// Descriptor of one program file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDescriptor {
    #[serde(default)]
    pub name: String,
    /// Expected length of rollout-policy parameter vectors.
    #[serde(default)]
    pub decision_points: Option<usize>,
    #[serde(default)]
    pub optimal_params: Vec<usize>,
    #[serde(default)]
    pub expected_reward: Option<f64>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_trials")]
    pub trials: Vec<TrialKind>,
}

impl Default for ProgramDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            decision_points: None,
            optimal_params: Vec::new(),
            expected_reward: None,
            tolerance: default_tolerance(),
            trials: default_trials(),
        }
    }
}

/// Outcome of comparing a measured reward with the analytic optimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    pub expected: f64,
    pub measured: f64,
    pub tolerance: f64,
}

impl Acceptance {
    pub fn passed(&self) -> bool {
        (self.measured - self.expected).abs() < self.tolerance
    }
}

impl ProgramDescriptor {
    /// Conventional descriptor location next to `program`.
    pub fn sibling_path(program: &Path) -> PathBuf {
        let stem = program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        program.with_file_name(format!("{stem}.descriptor.json"))
    }

    /// Load a descriptor from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read descriptor {}", path.display()),
            source,
        })?;
        let mut descriptor: ProgramDescriptor = serde_json::from_str(&text)?;
        if descriptor.name.is_empty() {
            descriptor.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().trim_end_matches(".descriptor").to_string())
                .unwrap_or_default();
        }
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Resolve the descriptor for `program`: the explicit path if given, the
    /// sibling file if present, defaults otherwise.
    pub fn resolve(program: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let sibling = Self::sibling_path(program);
        if sibling.is_file() {
            return Self::load(&sibling);
        }
        Ok(Self {
            name: program
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Self::default()
        })
    }

    fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(Error::invalid_config(format!(
                "descriptor '{}' has non-positive tolerance {}",
                self.name, self.tolerance
            )));
        }
        if !self.optimal_params.is_empty() {
            self.check_params(&self.optimal_params)?;
        }
        Ok(())
    }

    pub fn runs(&self, trial: TrialKind) -> bool {
        self.trials.contains(&trial)
    }

    /// Reject parameter vectors whose length differs from `decision_points`.
    pub fn check_params(&self, params: &[usize]) -> Result<()> {
        match self.decision_points {
            Some(expected) if params.len() != expected => Err(Error::invalid_config(format!(
                "program '{}' expects {expected} policy parameters, got {params:?}",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    pub fn acceptance(&self, measured: f64) -> Option<Acceptance> {
        self.expected_reward.map(|expected| Acceptance {
            expected,
            measured,
            tolerance: self.tolerance,
        })
    }
}
