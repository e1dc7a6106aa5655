//! Train command - train a policy and evaluate it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{
        config::{Experiment, ExperimentArgs},
        logging,
        output::{print_acceptance, print_kv, print_report_details, print_section},
    },
    environment::Environment,
    harness::{LearningReport, Tester, TesterSettings},
    learning::LearningAlgorithm,
    program::TrialKind,
};

#[derive(Parser, Debug)]
#[command(about = "Train a policy, then evaluate it")]
pub struct TrainArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Algorithm, overrides learningAlgorithm (A2C, QLEARNING, SARSA)
    #[arg(long, short = 'a')]
    pub algorithm: Option<LearningAlgorithm>,

    /// Training steps, overrides trainingIter
    #[arg(long)]
    pub training_iter: Option<usize>,

    /// Evaluation episodes, overrides testingIter
    #[arg(long)]
    pub testing_iter: Option<usize>,

    /// Save the learned policy (MessagePack)
    #[arg(long)]
    pub save_policy: Option<PathBuf>,

    /// Save the training statistics (JSON)
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let mut experiment = args.experiment.load()?;
    logging::init(experiment.config.debug);

    if let Some(algorithm) = args.algorithm {
        experiment.config.learning_algorithm = algorithm;
    }
    if let Some(steps) = args.training_iter {
        experiment.config.training_iter = steps;
    }
    if let Some(episodes) = args.testing_iter {
        experiment.config.testing_iter = episodes;
    }

    if !experiment.descriptor.runs(TrialKind::Learning) {
        print_section("Learning trial disabled");
        println!(
            "The descriptor of '{}' does not list the learning trial.",
            experiment.descriptor.name
        );
        return Ok(());
    }

    let (app, mut env) = experiment.open()?;
    let outcome = run_learning(&experiment, &mut env, args.progress);
    let closed = env.close();
    let report = outcome?;
    closed.context("Failed to close the engine")?;

    println!("\nTraining Results:");
    println!("Learned policy reward..............: {}", report.mean_reward);
    println!("--> Learning Parameters: \n {}", report.policy.parameters);
    print_report_details(&report.evaluation);
    if report.training.infeasible_attempts > 0 {
        print_kv(
            "train infeasible",
            &report.training.infeasible_attempts.to_string(),
        );
    }
    if let Some(best) = report.training.metrics.best_reward {
        print_kv("train best reward", &best.to_string());
    }

    if let Some(acceptance) = experiment.descriptor.acceptance(report.mean_reward) {
        print_acceptance("Learned", &acceptance);
    }

    if let Some(path) = &args.save_policy {
        app.save_policy(&report.policy, path)
            .with_context(|| format!("Failed to save policy to {}", path.display()))?;
        println!("Policy saved to {}", path.display());
    }
    if let Some(path) = &args.summary {
        report
            .training
            .save(path)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }
    Ok(())
}

fn run_learning(
    experiment: &Experiment,
    env: &mut Environment,
    progress: bool,
) -> Result<LearningReport> {
    let config = &experiment.config;
    let settings = TesterSettings {
        show_progress: progress,
        ..config.tester_settings()
    };
    let mut tester = Tester::new(env).with_settings(settings);

    println!("\nStarting training...");
    let report = tester.test_learning(
        config.training_iter,
        config.testing_iter,
        config.learning_logging_interval,
        config.learning_algorithm,
    )?;
    Ok(report)
}
