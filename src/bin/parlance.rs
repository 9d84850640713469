//! Parlance CLI binary.

use clap::Parser;
use parlance::cli::{args::*, commands::*};
use std::process;

fn main() {
    let args = ParlanceArgs::parse();

    // Map verbosity flags onto the logger before anything logs.
    let level = match args.verbosity() {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
