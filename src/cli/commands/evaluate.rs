//! Evaluate command - run a saved policy greedily

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::cli::{
    config::ExperimentArgs,
    logging,
    output::{print_acceptance, print_kv, print_report_details},
};
use crate::harness::Tester;

#[derive(Parser, Debug)]
#[command(about = "Evaluate a saved policy")]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Policy file written by `train --save-policy`
    #[arg(long, short = 'p')]
    pub policy: PathBuf,

    /// Evaluation episodes, overrides testingIter
    #[arg(long, short = 'n')]
    pub episodes: Option<usize>,

    /// Charge the infeasibility penalty instead of forgiving it
    #[arg(long)]
    pub no_forgive: bool,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let experiment = args.experiment.load()?;
    logging::init(experiment.config.debug);

    let (app, mut env) = experiment.open()?;
    let outcome = (|| -> Result<_> {
        let mut policy = app
            .load_policy(&args.policy)
            .with_context(|| format!("Failed to load policy {}", args.policy.display()))?;
        if policy.action_names != env.action_names() {
            bail!(
                "Policy was trained on actions {:?}, program has {:?}",
                policy.action_names,
                env.action_names()
            );
        }

        let episodes = args.episodes.unwrap_or(experiment.config.testing_iter);
        let forgive = experiment.config.forgive_penalty && !args.no_forgive;
        let mut tester = Tester::new(&mut env).with_settings(experiment.config.tester_settings());
        let report = tester.evaluate(episodes, &mut policy, forgive)?;
        Ok((policy, report))
    })();
    let closed = env.close();
    let (policy, report) = outcome?;
    closed.context("Failed to close the engine")?;

    println!("\nEvaluation Results:");
    print_kv("policy", &policy.algorithm.to_string());
    println!("Learned policy reward..............: {}", report.mean_reward);
    print_report_details(&report);
    if let Some(acceptance) = experiment.descriptor.acceptance(report.mean_reward) {
        print_acceptance("Policy", &acceptance);
    }
    Ok(())
}
