//! Command line argument parsing for the Parlance CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parlance - a hybrid rule/ML intent classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "parlance")]
#[command(about = "Classify conversational utterances into typed intents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ParlanceArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Use only the rule-based signal set (no neural signal)
    #[arg(long)]
    pub basic: bool,

    /// Model file to load before executing the command
    #[arg(short, long, value_name = "MODEL_FILE")]
    pub model: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ParlanceArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify a single utterance
    Classify(ClassifyArgs),

    /// Interactive classification loop over stdin
    Repl(ReplArgs),

    /// Train from a JSONL file of labeled samples
    Train(TrainArgs),

    /// Export the learned model to a JSON file
    Export(ExportArgs),

    /// Import a previously exported model
    Import(ImportArgs),
}

/// Arguments for classifying one utterance
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// The utterance to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// User identifier attached to the interaction log
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Arguments for the interactive loop
#[derive(Parser, Debug, Clone)]
pub struct ReplArgs {
    /// Print the full fused score map for each utterance
    #[arg(long)]
    pub scores: bool,
}

/// Arguments for bulk training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// JSONL file with one {"text": ..., "intent": ...} object per line
    #[arg(value_name = "SAMPLES_FILE")]
    pub samples_file: PathBuf,

    /// Wait for background retraining to finish before exiting
    #[arg(long)]
    pub wait: bool,

    /// Write the trained model to this file afterwards
    #[arg(short, long, value_name = "MODEL_FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for model export
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Destination file
    #[arg(value_name = "MODEL_FILE")]
    pub model_file: PathBuf,
}

/// Arguments for model import
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Source file
    #[arg(value_name = "MODEL_FILE")]
    pub model_file: PathBuf,

    /// Utterance to classify with the imported model, as a smoke check
    #[arg(short, long)]
    pub probe: Option<String>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
