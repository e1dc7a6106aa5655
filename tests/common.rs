//! Common test utilities for the gmenv test suite.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gmenv::{
    adapters::TableEngineLoader,
    environment::{Environment, EnvironmentSettings},
};

/// Analytic optimum of the bundled three-build program under `[0, 2]`.
pub const OPTIMAL_REWARD: f64 = 0.9235;

pub fn demo_program() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/three_build.json")
}

pub fn open_demo(seed: u64) -> Environment {
    open_table(&demo_program(), EnvironmentSettings::new().with_seed(seed))
}

pub fn open_table(program: &Path, settings: EnvironmentSettings) -> Environment {
    Environment::open(&TableEngineLoader, program, settings).expect("program should load")
}

/// Write a tabular program into `dir` and return its path.
pub fn write_program(dir: &Path, name: &str, program: serde_json::Value) -> PathBuf {
    let path = dir.join(format!("{name}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(&program).unwrap()).unwrap();
    path
}

/// `try` always fails; `safe` ends the episode with reward 1.
pub fn infeasible_first(dir: &Path) -> PathBuf {
    write_program(
        dir,
        "infeasible_first",
        serde_json::json!({
            "name": "infeasible-first",
            "start": "s",
            "actions": ["try", "safe"],
            "states": {
                "s": {
                    "features": [0.0],
                    "actions": {
                        "try": [{ "outcome": "jammed", "probability": 1.0, "infeasible": true }],
                        "safe": [{ "outcome": "ok", "probability": 1.0, "next": "t", "reward": 1.0 }]
                    }
                },
                "t": { "features": [1.0], "terminal": true }
            }
        }),
    )
}

/// Every action at the start always fails.
pub fn dead_end(dir: &Path) -> PathBuf {
    write_program(
        dir,
        "dead_end",
        serde_json::json!({
            "name": "dead-end",
            "start": "s",
            "actions": ["left", "right"],
            "states": {
                "s": {
                    "features": [0.0],
                    "actions": {
                        "left": [{ "outcome": "blocked", "probability": 1.0, "infeasible": true }],
                        "right": [{ "outcome": "blocked", "probability": 1.0, "infeasible": true }]
                    }
                },
                "t": { "features": [1.0], "terminal": true }
            }
        }),
    )
}

/// `wait` loops forever with reward 1; `stop` terminates.
pub fn endless_loop(dir: &Path) -> PathBuf {
    write_program(
        dir,
        "endless",
        serde_json::json!({
            "name": "endless",
            "start": "s",
            "actions": ["wait", "stop"],
            "states": {
                "s": {
                    "features": [0.0],
                    "actions": {
                        "wait": [{ "outcome": "tick", "probability": 1.0, "next": "s", "reward": 1.0 }]
                    }
                },
                "t": { "features": [1.0], "terminal": true }
            }
        }),
    )
}

/// The start configuration is already terminal.
pub fn terminal_start(dir: &Path) -> PathBuf {
    write_program(
        dir,
        "terminal_start",
        serde_json::json!({
            "name": "terminal-start",
            "start": "t",
            "actions": ["noop"],
            "states": {
                "t": { "features": [1.0, 1.0], "terminal": true }
            }
        }),
    )
}
