//! End-to-end runs of the CLI subcommands on the bundled program.

mod common;

use clap::Parser;
use common::demo_program;
use gmenv::cli::commands::{
    evaluate::{self, EvaluateArgs},
    simulate::{self, SimulateArgs},
    train::{self, TrainArgs},
};
use tempfile::tempdir;

fn demo_config() -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos/config.json")
        .display()
        .to_string()
}

fn demo() -> String {
    demo_program().display().to_string()
}

#[test]
fn simulate_writes_one_csv_per_trial() {
    let tmp = tempdir().unwrap();
    let episodes_dir = tmp.path().join("episodes");

    let args = SimulateArgs::parse_from([
        "gmenv-simulate",
        &demo(),
        "--config",
        &demo_config(),
        "--sim-params",
        "[1, 0]",
        "--episodes-dir",
        episodes_dir.to_str().unwrap(),
    ]);
    simulate::execute(args).expect("simulation should succeed");

    for key in ["optimal", "random_forgive", "random", "custom"] {
        let path = episodes_dir.join(format!("{key}.csv"));
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("missing {}: {e}", path.display()));
        assert_eq!(text.lines().count(), 1001, "{key} should hold 1000 episodes");
    }
}

#[test]
fn simulate_rejects_wrong_parameter_count() {
    let args = SimulateArgs::parse_from([
        "gmenv-simulate",
        &demo(),
        "--config",
        &demo_config(),
        "--sim-params",
        "[1, 0, 2]",
    ]);
    assert!(simulate::execute(args).is_err());
}

#[test]
fn train_saves_summary_and_policy_for_evaluate() {
    let tmp = tempdir().unwrap();
    let summary = tmp.path().join("training.json");
    let policy = tmp.path().join("policy.msgpack");

    let args = TrainArgs::parse_from([
        "gmenv-train",
        &demo(),
        "--config",
        &demo_config(),
        "--algorithm",
        "qlearning",
        "--training-iter",
        "500",
        "--testing-iter",
        "50",
        "--summary",
        summary.to_str().unwrap(),
        "--save-policy",
        policy.to_str().unwrap(),
    ]);
    train::execute(args).expect("training should succeed");

    let contents = std::fs::read_to_string(&summary).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["steps"], 500);
    assert!(policy.exists());

    let args = EvaluateArgs::parse_from([
        "gmenv-evaluate",
        &demo(),
        "--config",
        &demo_config(),
        "--policy",
        policy.to_str().unwrap(),
        "--episodes",
        "20",
    ]);
    evaluate::execute(args).expect("evaluation should succeed");
}

#[test]
fn missing_program_is_reported() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("nowhere.json");
    let args = SimulateArgs::parse_from(["gmenv-simulate", missing.to_str().unwrap()]);
    let err = simulate::execute(args).unwrap_err();
    assert!(err.to_string().contains("Program file not found"));
}
