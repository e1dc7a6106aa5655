//! Simulate command - baseline rollouts under the rollout policies

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{
        config::{Experiment, ExperimentArgs, parse_sim_params},
        logging,
        output::{print_acceptance, print_report_details, print_section},
    },
    environment::Environment,
    harness::{RolloutPolicy, SimulationReport, Tester},
    program::TrialKind,
};

#[derive(Parser, Debug)]
#[command(about = "Run rollout simulations")]
pub struct SimulateArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Parameters of the custom biased simulation, e.g. "[0,2]"
    #[arg(long)]
    pub sim_params: Option<String>,

    /// Directory for per-episode reward CSV files, one per trial
    #[arg(long)]
    pub episodes_dir: Option<PathBuf>,

    /// Print episode counters under each result
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// One finished simulation trial
struct Trial {
    key: &'static str,
    label: &'static str,
    report: SimulationReport,
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let experiment = args.experiment.load()?;
    logging::init(experiment.config.debug);

    let custom_params = match &args.sim_params {
        Some(raw) => parse_sim_params(raw)?,
        None => experiment.config.multi_run_sim_params.clone(),
    };

    let (_app, mut env) = experiment.open()?;
    let outcome = run_trials(&experiment, &mut env, &custom_params);
    let closed = env.close();
    let trials = outcome?;
    closed.context("Failed to close the engine")?;

    println!("\nSimulation Results:");
    for trial in &trials {
        println!("{}{}", trial.label, trial.report.mean_reward);
        if args.verbose {
            print_report_details(&trial.report);
        }
    }

    if let Some(optimal) = trials.iter().find(|t| t.key == "optimal") {
        if let Some(acceptance) = experiment.descriptor.acceptance(optimal.report.mean_reward) {
            print_acceptance("Optimal", &acceptance);
        }
    }

    if let Some(dir) = &args.episodes_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for trial in &trials {
            let path = dir.join(format!("{}.csv", trial.key));
            trial.report.write_csv(&path)?;
        }
        println!("Episode rewards written to {}", dir.display());
    }

    if trials.is_empty() {
        print_section("No simulation ran");
        println!("Set simOptimalIter, simRandomIter or simCustomIter in the configuration.");
    }
    Ok(())
}

fn run_trials(
    experiment: &Experiment,
    env: &mut Environment,
    custom_params: &[usize],
) -> Result<Vec<Trial>> {
    let config = &experiment.config;
    let descriptor = &experiment.descriptor;
    let mut tester = Tester::new(env).with_settings(config.tester_settings());
    let mut trials = Vec::new();

    if config.sim_optimal_iter > 0 && descriptor.runs(TrialKind::Optimal) {
        let params = experiment.optimal_params()?;
        println!("\nRunning optimal simulation...");
        let report = tester.simulate(config.sim_optimal_iter, &RolloutPolicy::Optimal(params), true)?;
        trials.push(Trial {
            key: "optimal",
            label: "DT-Golog - simulated policy reward.: ",
            report,
        });
    }

    if config.sim_random_iter > 0 && descriptor.runs(TrialKind::Random) {
        println!("\nRunning random simulation with penalty forgiveness...");
        let report = tester.simulate(config.sim_random_iter, &RolloutPolicy::Uniform, true)?;
        trials.push(Trial {
            key: "random_forgive",
            label: "Random simulated policy reward (fg): ",
            report,
        });

        println!("\nRunning random simulation without penalty forgiveness...");
        let report = tester.simulate(config.sim_random_iter, &RolloutPolicy::Uniform, false)?;
        trials.push(Trial {
            key: "random",
            label: "Random simulated policy reward.....: ",
            report,
        });
    }

    if config.sim_custom_iter > 0 && descriptor.runs(TrialKind::Custom) {
        descriptor.check_params(custom_params)?;
        println!("\nRunning custom biased simulation with {custom_params:?}...");
        let policy = RolloutPolicy::Biased(custom_params.to_vec());
        let report = tester.simulate(config.sim_custom_iter, &policy, true)?;
        trials.push(Trial {
            key: "custom",
            label: "Custom simulated policy reward.....: ",
            report,
        });
    }

    Ok(trials)
}
