//! gmenv: decision-theoretic logic programs as RL environments
//!
//! This crate provides:
//! - An MDP environment ([`Environment`]) over an engine session that runs a
//!   program with stochastic action outcomes and rewards
//! - Engine adapters: an in-process tabular engine and an external engine
//!   process speaking a line-delimited JSON protocol
//! - A trial harness ([`Tester`]) for seeded rollout simulation and
//!   train-then-evaluate cycles
//! - Tabular A2C, Q-learning and SARSA behind a policy-optimizer port

pub mod adapters;
pub mod app;
pub mod cli;
pub mod environment;
pub mod error;
pub mod harness;
pub mod learning;
pub mod ports;
pub mod program;
pub mod types;

pub use environment::{Environment, EnvironmentSettings, Phase, ResetOutcome, Step, StepStatus};
pub use error::{Error, Result};
pub use harness::{RolloutPolicy, SimulationReport, Tester};
pub use learning::{LearnedPolicy, LearningAlgorithm};
pub use types::{ActionId, Observation, StateKey};
