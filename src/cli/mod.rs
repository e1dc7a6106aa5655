//! CLI infrastructure for the gmenv experiment driver
//!
//! Loads configuration and descriptors, opens one environment per command,
//! runs the harness, prints results and always closes the environment.

pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
