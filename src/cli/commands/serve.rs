//! Serve command - expose a tabular program over the bridge protocol

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    adapters::{TableEngine, serve},
    cli::logging,
};

#[derive(Parser, Debug)]
#[command(about = "Serve a tabular program on stdin/stdout")]
pub struct ServeArgs {
    /// Path to the tabular program
    pub program: PathBuf,

    /// Log every request to stderr
    #[arg(long)]
    pub debug: bool,
}

pub fn execute(args: ServeArgs) -> Result<()> {
    logging::init(args.debug);
    let mut engine = TableEngine::open(&args.program)
        .with_context(|| format!("Failed to load {}", args.program.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut engine, stdin.lock(), stdout.lock())?;
    Ok(())
}
