//! Lifecycle of an environment over the tabular engine.

mod common;

use common::{demo_program, endless_loop, infeasible_first, open_demo, open_table, terminal_start};
use gmenv::{
    ActionId, Error, Phase, StepStatus,
    adapters::TableEngineLoader,
    environment::{Environment, EnvironmentSettings},
};
use tempfile::TempDir;

const HIRE_CREW: ActionId = ActionId::new(0);
const BUILD_STEEL: ActionId = ActionId::new(4);
const RAISE_ROOF: ActionId = ActionId::new(5);

#[test]
fn reset_starts_at_the_program_start() {
    let mut env = open_demo(1);
    assert_eq!(env.phase(), Phase::Ready);
    assert_eq!(env.action_count(), 6);
    assert_eq!(env.observation_len(), 3);

    let start = env.reset().unwrap();
    assert_eq!(start.observation.values(), &[0.0, 0.0, 0.0]);
    assert!(!start.terminal);
    assert_eq!(start.legal_actions, vec![ActionId::new(0), ActionId::new(1)]);
    assert_eq!(env.phase(), Phase::Running);
}

#[test]
fn full_episode_reaches_terminal_configuration() {
    let mut env = open_demo(7);
    env.reset().unwrap();

    let first = env.step(HIRE_CREW).unwrap();
    assert!(!first.done);
    assert_eq!(first.observation.values(), &[1.0, 0.0, 0.0]);
    assert!(first.info.legal_actions.contains(&BUILD_STEEL));

    let second = env.step(BUILD_STEEL).unwrap();
    assert!(!second.done);
    assert_eq!(second.info.legal_actions, vec![RAISE_ROOF]);

    let last = env.step(RAISE_ROOF).unwrap();
    assert!(last.done);
    assert!(last.info.terminated);
    assert!(!last.info.truncated);
    assert!(last.info.legal_actions.is_empty());
    assert_eq!(last.info.steps, 3);
    assert_eq!(env.phase(), Phase::Done);

    let err = env.step(RAISE_ROOF).unwrap_err();
    assert!(matches!(err, Error::Usage { .. }), "got {err:?}");
}

#[test]
fn illegal_action_leaves_configuration_unchanged() {
    let mut env = open_demo(3);
    env.reset().unwrap();

    let err = env.step(RAISE_ROOF).unwrap_err();
    match err {
        Error::IllegalAction { action, legal } => {
            assert_eq!(action, 5);
            assert_eq!(legal, vec![0, 1]);
        }
        other => panic!("expected IllegalAction, got {other:?}"),
    }

    assert_eq!(env.phase(), Phase::Running);
    assert_eq!(env.steps(), 0);
    assert_eq!(env.legal_actions().unwrap(), vec![ActionId::new(0), ActionId::new(1)]);
}

#[test]
fn step_before_reset_is_a_usage_error() {
    let mut env = open_demo(3);
    let err = env.step(HIRE_CREW).unwrap_err();
    assert!(matches!(err, Error::Usage { .. }), "got {err:?}");
}

#[test]
fn reset_while_running_is_rejected_until_episode_ends() {
    let mut env = open_demo(3);
    env.reset().unwrap();

    let err = env.reset().unwrap_err();
    assert!(matches!(err, Error::Usage { .. }), "got {err:?}");

    env.end_episode().unwrap();
    assert_eq!(env.phase(), Phase::Done);
    env.reset().unwrap();
}

#[test]
fn reseeding_while_running_is_rejected() {
    let mut env = open_demo(3);
    env.reset().unwrap();
    assert!(matches!(env.set_seed(4), Err(Error::Usage { .. })));
    env.end_episode().unwrap();
    env.set_seed(4).unwrap();
    assert_eq!(env.seed(), Some(4));
}

#[test]
fn infeasible_outcome_keeps_configuration_and_counts_a_step() {
    let dir = TempDir::new().unwrap();
    let mut env = open_table(&infeasible_first(dir.path()), EnvironmentSettings::new().with_seed(5));
    env.reset().unwrap();

    let step = env.step(ActionId::new(0)).unwrap();
    assert!(step.is_infeasible());
    assert_eq!(step.info.status, StepStatus::Infeasible { outcome: "jammed".into() });
    assert_eq!(step.reward, 0.0);
    assert!(!step.done);
    assert_eq!(step.observation.values(), &[0.0]);
    assert_eq!(step.info.steps, 1);

    let finish = env.step(ActionId::new(1)).unwrap();
    assert!(finish.done);
    assert_eq!(finish.reward, 1.0);
    assert_eq!(finish.outcome(), "ok");
    assert_eq!(finish.info.steps, 2);
}

#[test]
fn horizon_truncates_endless_episode() {
    let dir = TempDir::new().unwrap();
    let settings = EnvironmentSettings::new().with_seed(5).with_max_steps(3);
    let mut env = open_table(&endless_loop(dir.path()), settings);
    env.reset().unwrap();

    for _ in 0..2 {
        assert!(!env.step(ActionId::new(0)).unwrap().done);
    }
    let last = env.step(ActionId::new(0)).unwrap();
    assert!(last.done);
    assert!(last.info.truncated);
    assert!(!last.info.terminated);
    assert_eq!(env.phase(), Phase::Done);
}

#[test]
fn terminal_start_yields_empty_legal_set() {
    let dir = TempDir::new().unwrap();
    let mut env = open_table(&terminal_start(dir.path()), EnvironmentSettings::new());
    let start = env.reset().unwrap();
    assert!(start.terminal);
    assert!(start.legal_actions.is_empty());
    assert_eq!(env.phase(), Phase::Done);
}

#[test]
fn same_seed_samples_same_outcomes() {
    let play = |seed| {
        let mut env = open_demo(seed);
        let mut outcomes = Vec::new();
        for _ in 0..20 {
            env.reset().unwrap();
            outcomes.push(env.step(HIRE_CREW).unwrap().outcome().to_string());
            env.end_episode().unwrap();
        }
        outcomes
    };
    assert_eq!(play(11), play(11));
}

#[test]
fn close_is_idempotent_and_final() {
    let mut env = open_demo(3);
    env.reset().unwrap();
    env.close().unwrap();
    env.close().unwrap();
    assert!(env.is_closed());

    assert!(matches!(env.reset(), Err(Error::ClosedEnvironment)));
    assert!(matches!(env.step(HIRE_CREW), Err(Error::ClosedEnvironment)));
    assert!(matches!(env.legal_actions(), Err(Error::ClosedEnvironment)));
}

#[test]
fn missing_program_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    let err = Environment::open(&TableEngineLoader, &missing, EnvironmentSettings::new()).unwrap_err();
    assert!(matches!(err, Error::EngineLoad { .. }), "got {err:?}");
}

#[test]
fn zero_horizon_is_rejected() {
    let err = Environment::open(
        &TableEngineLoader,
        &demo_program(),
        EnvironmentSettings::new().with_max_steps(0),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }), "got {err:?}");
}
