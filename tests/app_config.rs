//! Configuration loading and the application container.

mod common;

use std::path::{Path, PathBuf};

use common::demo_program;
use gmenv::{
    Error, LearningAlgorithm, RolloutPolicy, Tester,
    adapters::InMemoryRepository,
    app::{App, EngineSpec, ExperimentConfig},
    environment::EnvironmentSettings,
    program::{ProgramDescriptor, TrialKind},
};
use tempfile::TempDir;

fn demo_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/config.json")
}

#[test]
fn bundled_config_loads() {
    let config = ExperimentConfig::load(&demo_config()).unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.optimal_sim_params, Some(vec![0, 2]));
    assert_eq!(config.learning_algorithm, LearningAlgorithm::A2c);
    assert_eq!(config.engine, EngineSpec::Table);
    assert!(config.forgive_penalty);
}

#[test]
fn bundled_descriptor_is_found_next_to_the_program() {
    let descriptor = ProgramDescriptor::resolve(&demo_program(), None).unwrap();
    assert_eq!(descriptor.decision_points, Some(2));
    assert_eq!(descriptor.optimal_params, vec![0, 2]);
    assert!(TrialKind::ALL.iter().all(|t| descriptor.runs(*t)));
    assert!(descriptor.check_params(&[1, 1]).is_ok());
    assert!(descriptor.check_params(&[1]).is_err());
}

#[test]
fn malformed_config_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "maxSteps": "many" }"#).unwrap();
    let err = ExperimentConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }), "got {err:?}");

    std::fs::write(&path, r#"{ "maxSteps": 0 }"#).unwrap();
    let err = ExperimentConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }), "got {err:?}");
}

#[test]
fn app_from_config_opens_seeded_environment() {
    let config = ExperimentConfig::load(&demo_config()).unwrap();
    let app = App::from_config(&config);
    let env = app
        .open_environment(&demo_program(), config.environment_settings())
        .unwrap();
    assert_eq!(env.seed(), Some(42));
    assert_eq!(env.max_steps(), 100);
}

#[test]
fn default_seed_fills_in_only_when_settings_have_none() {
    let app = App::for_testing().with_default_seed(9).build();

    let env = app
        .open_environment(&demo_program(), EnvironmentSettings::new())
        .unwrap();
    assert_eq!(env.seed(), Some(9));

    let env = app
        .open_environment(&demo_program(), EnvironmentSettings::new().with_seed(3))
        .unwrap();
    assert_eq!(env.seed(), Some(3));
}

#[test]
fn same_default_seed_gives_same_simulation() {
    let run = || {
        let app = App::for_testing().with_default_seed(42).build();
        let mut env = app
            .open_environment(&demo_program(), EnvironmentSettings::new())
            .unwrap();
        Tester::new(&mut env)
            .simulate(200, &RolloutPolicy::Biased(vec![0, 2]), true)
            .unwrap()
            .mean_reward
    };
    assert_eq!(run(), run());
}

#[test]
fn in_memory_repository_round_trips_learned_policy() {
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .with_default_seed(42)
        .build();
    let mut env = app
        .open_environment(&demo_program(), EnvironmentSettings::new())
        .unwrap();
    let report = Tester::new(&mut env)
        .test_learning(300, 20, 0, LearningAlgorithm::A2c)
        .unwrap();

    let path = Path::new("policies/a2c");
    app.save_policy(&report.policy, path).unwrap();
    let loaded = app.load_policy(path).unwrap();
    assert_eq!(loaded, report.policy);
    assert!(!path.exists(), "in-memory repository must not touch the disk");
}
