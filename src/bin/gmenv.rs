//! gmenv CLI - drive decision programs as RL environments
//!
//! - `simulate`: baseline rollouts (optimal, random, custom biased)
//! - `train`: train a policy and evaluate it
//! - `evaluate`: evaluate a saved policy
//! - `serve`: expose a tabular program over the bridge protocol

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gmenv")]
#[command(version, about = "Run RL trials against decision-theoretic programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run rollout simulations
    Simulate(gmenv::cli::commands::simulate::SimulateArgs),

    /// Train a policy, then evaluate it
    Train(Box<gmenv::cli::commands::train::TrainArgs>),

    /// Evaluate a saved policy
    Evaluate(gmenv::cli::commands::evaluate::EvaluateArgs),

    /// Serve a tabular program on stdin/stdout
    Serve(gmenv::cli::commands::serve::ServeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => gmenv::cli::commands::simulate::execute(args),
        Commands::Train(args) => gmenv::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => gmenv::cli::commands::evaluate::execute(args),
        Commands::Serve(args) => gmenv::cli::commands::serve::execute(args),
    }
}
