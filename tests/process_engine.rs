//! Environments backed by an engine process speaking the bridge protocol.
//!
//! The `gmenv serve` subcommand is used as the engine, so these tests
//! exercise the whole stdio path without any external tooling.

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{demo_program, open_demo};
use gmenv::{
    ActionId, Error, RolloutPolicy, Tester,
    adapters::ProcessEngineLoader,
    environment::{Environment, EnvironmentSettings},
};
use tempfile::TempDir;

fn serve_loader() -> ProcessEngineLoader {
    ProcessEngineLoader::new(env!("CARGO_BIN_EXE_gmenv"))
        .with_args(vec!["serve".to_string()])
        .with_timeout(Duration::from_secs(10))
}

fn open_served(seed: u64) -> Environment {
    Environment::open(
        &serve_loader(),
        &demo_program(),
        EnvironmentSettings::new().with_seed(seed),
    )
    .expect("served program should load")
}

#[test]
fn served_program_describes_itself() {
    let mut env = open_served(1);
    assert_eq!(env.action_count(), 6);
    assert_eq!(env.action_name(ActionId::new(4)), Some("build_steel"));

    let start = env.reset().unwrap();
    assert_eq!(start.observation.values(), &[0.0, 0.0, 0.0]);
    assert_eq!(start.legal_actions, vec![ActionId::new(0), ActionId::new(1)]);
    env.close().unwrap();
}

#[test]
fn served_and_in_process_engines_agree() {
    let policy = RolloutPolicy::Uniform;

    let mut served = open_served(42);
    let remote = Tester::new(&mut served).simulate(200, &policy, false).unwrap();
    served.close().unwrap();

    let mut local = open_demo(42);
    let in_process = Tester::new(&mut local).simulate(200, &policy, false).unwrap();

    assert_eq!(remote.episodes, in_process.episodes);
    assert_eq!(remote.infeasible_attempts, in_process.infeasible_attempts);
    for (a, b) in remote.episode_rewards.iter().zip(&in_process.episode_rewards) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }
}

#[test]
fn illegal_action_is_caught_before_reaching_the_engine() {
    let mut env = open_served(3);
    env.reset().unwrap();
    let err = env.step(ActionId::new(5)).unwrap_err();
    assert!(matches!(err, Error::IllegalAction { action: 5, .. }), "got {err:?}");
    assert!(env.step(ActionId::new(0)).is_ok());
}

#[test]
fn engine_that_exits_immediately_fails_to_load() {
    let loader = ProcessEngineLoader::new("true");
    let err = Environment::open(&loader, &demo_program(), EnvironmentSettings::new()).unwrap_err();
    assert!(matches!(err, Error::EngineLoad { .. }), "got {err:?}");
}

#[test]
fn silent_engine_times_out() {
    let loader = ProcessEngineLoader::new("sh")
        .with_args(vec!["-c".to_string(), "sleep 5".to_string(), "sh".to_string()])
        .with_timeout(Duration::from_millis(200));
    let err = Environment::open(&loader, &demo_program(), EnvironmentSettings::new()).unwrap_err();
    match err {
        Error::EngineLoad { reason, .. } => {
            assert!(reason.contains("200 ms"), "unexpected reason: {reason}");
        }
        other => panic!("expected EngineLoad, got {other:?}"),
    }
}

#[test]
fn missing_program_is_rejected_before_spawning() {
    let dir = TempDir::new().unwrap();
    let err = Environment::open(
        &serve_loader(),
        &dir.path().join("absent.json"),
        EnvironmentSettings::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::EngineLoad { .. }), "got {err:?}");
}

#[test]
fn closing_twice_is_harmless() {
    let mut env = open_served(5);
    env.reset().unwrap();
    env.close().unwrap();
    env.close().unwrap();
    assert!(matches!(env.reset(), Err(Error::ClosedEnvironment)));
}
