#![allow(dead_code, unused_imports)]
#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;
mod speech;

use cli::Cli;
use clap::Parser;

fn main() {
    // Values from .env become process environment before anything
    // reads it; a missing .env file is fine.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = infra::logging::init_from_file(&cli.logging_config) {
        // No subscriber is installed yet, so this cannot go through
        // the logging pipeline.
        eprintln!("Failed to initialize logging: {e:?}");
        std::process::exit(1);
    }

    if let Err(e) = cli.run() {
        // Single top-level error boundary: every failure arrives
        // here with its context chain and ends the process with a
        // nonzero exit code.
        tracing::error!("An error occurred: {e:?}");
        std::process::exit(1);
    }
}
