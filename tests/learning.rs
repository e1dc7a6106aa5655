//! Train-then-evaluate cycles on the bundled program.

mod common;

use common::{OPTIMAL_REWARD, open_demo, open_table, terminal_start};
use gmenv::{
    Error, LearningAlgorithm, Tester,
    adapters::MsgPackRepository,
    environment::EnvironmentSettings,
    ports::PolicyRepository,
};
use tempfile::TempDir;

#[test]
fn a2c_learns_close_to_optimum() {
    let mut env = open_demo(42);
    let report = Tester::new(&mut env)
        .test_learning(1000, 1000, 250, LearningAlgorithm::A2c)
        .expect("A2C trial should succeed");

    assert!(
        (report.mean_reward - OPTIMAL_REWARD).abs() < 0.5,
        "A2C reward {} too far from {OPTIMAL_REWARD}",
        report.mean_reward
    );
    assert_eq!(report.training.steps, 1000);
    assert!(report.training.episodes > 0);
    assert_eq!(report.evaluation.episodes, 1000);

    let parameters = &report.policy.parameters;
    assert_eq!(parameters.algorithm, LearningAlgorithm::A2c);
    assert_eq!(parameters.training_steps, 1000);
    assert!(parameters.states_visited > 0);
    assert!(parameters.to_string().contains("A2C"));
}

#[test]
fn td_learners_beat_the_acceptance_threshold() {
    for algorithm in [LearningAlgorithm::QLearning, LearningAlgorithm::Sarsa] {
        let mut env = open_demo(42);
        let report = Tester::new(&mut env)
            .test_learning(3000, 1000, 0, algorithm)
            .unwrap_or_else(|e| panic!("{algorithm} trial failed: {e}"));

        assert!(
            (report.mean_reward - OPTIMAL_REWARD).abs() < 0.5,
            "{algorithm} reward {}",
            report.mean_reward
        );
        assert!(report.policy.parameters.exploration.is_some());
        assert!(!report.policy.parameters.greedy_actions.is_empty());
    }
}

#[test]
fn seeded_trials_are_reproducible() {
    let run = || {
        let mut env = open_demo(42);
        Tester::new(&mut env)
            .test_learning(600, 200, 0, LearningAlgorithm::QLearning)
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.mean_reward, second.mean_reward);
    assert_eq!(
        first.policy.parameters.greedy_actions,
        second.policy.parameters.greedy_actions
    );
}

#[test]
fn saved_policy_evaluates_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("policy.msgpack");

    let mut env = open_demo(42);
    let report = Tester::new(&mut env)
        .test_learning(1000, 100, 0, LearningAlgorithm::Sarsa)
        .unwrap();

    let repository = MsgPackRepository::new();
    repository.save(&report.policy, &path).unwrap();
    let mut restored = repository.load(&path).unwrap();
    assert_eq!(restored.parameters, report.policy.parameters);

    let mut trained = report.policy.clone();
    env.set_seed(7).unwrap();
    let before = Tester::new(&mut env).evaluate(200, &mut trained, true).unwrap();
    env.set_seed(7).unwrap();
    let after = Tester::new(&mut env).evaluate(200, &mut restored, true).unwrap();
    assert_eq!(before.episode_rewards, after.episode_rewards);
}

#[test]
fn terminal_start_aborts_training() {
    let dir = TempDir::new().unwrap();
    let mut env = open_table(&terminal_start(dir.path()), EnvironmentSettings::new().with_seed(1));
    let err = Tester::new(&mut env)
        .test_learning(10, 10, 0, LearningAlgorithm::A2c)
        .unwrap_err();
    assert!(matches!(err, Error::Training { .. }), "got {err:?}");
}

#[test]
fn closed_environment_aborts_training() {
    let mut env = open_demo(1);
    env.close().unwrap();
    let err = Tester::new(&mut env)
        .test_learning(10, 10, 0, LearningAlgorithm::QLearning)
        .unwrap_err();
    assert!(matches!(err, Error::Training { .. }), "got {err:?}");
}

#[test]
fn zero_training_steps_is_rejected() {
    let mut env = open_demo(1);
    let err = Tester::new(&mut env)
        .test_learning(0, 10, 0, LearningAlgorithm::A2c)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }), "got {err:?}");
}
