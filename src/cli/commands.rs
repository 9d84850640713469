//! Command implementations for the Parlance CLI.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{ParlanceError, Result};
use crate::intent::Intent;
use crate::parser::{IntentParser, ParserConfig};

/// How long bulk commands wait for background retraining.
const TRAIN_WAIT: Duration = Duration::from_secs(300);

/// Execute a CLI command.
pub fn execute_command(args: ParlanceArgs) -> Result<()> {
    let parser = build_parser(&args)?;

    match &args.command {
        Command::Classify(classify_args) => classify(&parser, classify_args.clone(), &args),
        Command::Repl(repl_args) => repl(&parser, repl_args.clone(), &args),
        Command::Train(train_args) => train(&parser, train_args.clone(), &args),
        Command::Export(export_args) => export(&parser, export_args.clone(), &args),
        Command::Import(import_args) => import(&parser, import_args.clone(), &args),
    }
}

fn build_parser(args: &ParlanceArgs) -> Result<IntentParser> {
    let config = ParserConfig::default();
    let parser = if args.basic {
        IntentParser::basic(config)?
    } else {
        IntentParser::advanced(config)?
    };

    if let Some(model) = &args.model {
        if args.verbosity() > 1 {
            println!("Loading model from: {}", model.display());
        }
        parser.load_model(model)?;
    }
    Ok(parser)
}

/// Classify one utterance.
fn classify(parser: &IntentParser, args: ClassifyArgs, cli_args: &ParlanceArgs) -> Result<()> {
    let result = parser.classify_for_user(&args.text, args.user.as_deref());
    output_result(
        "Classification",
        &ClassificationResult::from(&result),
        cli_args,
    )
}

/// Interactive loop: one utterance per line, context carries across lines.
fn repl(parser: &IntentParser, args: ReplArgs, cli_args: &ParlanceArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Parlance REPL. Empty line or Ctrl-D to exit.");
    }

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            break;
        }

        let result = parser.classify(text);
        println!(
            "{} ({:.3}) sentiment={}",
            result.intent, result.confidence, result.sentiment
        );
        for (key, value) in &result.arguments {
            println!("  {key}: {value}");
        }
        if args.scores {
            for intent in &result.prior_intents {
                println!("  prior: {intent}");
            }
        }
    }
    Ok(())
}

/// One line of a training file.
#[derive(Debug, Deserialize)]
struct SampleLine {
    text: String,
    intent: String,
}

/// Bulk-train from a JSONL file.
fn train(parser: &IntentParser, args: TrainArgs, cli_args: &ParlanceArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Training from: {}", args.samples_file.display());
    }

    let file = File::open(&args.samples_file)?;
    let reader = BufReader::new(file);

    let start_time = Instant::now();
    let mut added = 0usize;
    let mut skipped = 0usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: SampleLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("skipping line {}: {e}", number + 1);
                skipped += 1;
                continue;
            }
        };
        match Intent::parse(&parsed.intent) {
            Some(intent) => {
                parser.add_training_sample(&parsed.text, intent, None, None)?;
                added += 1;
            }
            None => {
                log::warn!("skipping line {}: unknown intent '{}'", number + 1, parsed.intent);
                skipped += 1;
            }
        }
    }

    if args.wait && !parser.wait_idle(TRAIN_WAIT) {
        return Err(ParlanceError::training(
            "background retraining did not finish in time",
        ));
    }

    if let Some(output) = &args.output {
        parser.save_model(output)?;
        if cli_args.verbosity() > 0 {
            println!("Model written to: {}", output.display());
        }
    }

    output_result(
        "Training complete",
        &TrainingResult {
            samples_added: added,
            samples_skipped: skipped,
            duration_ms: start_time.elapsed().as_millis() as u64,
            last_accuracy: parser.training_stats().last_accuracy,
        },
        cli_args,
    )
}

/// Export the learned model.
fn export(parser: &IntentParser, args: ExportArgs, cli_args: &ParlanceArgs) -> Result<()> {
    parser.save_model(&args.model_file)?;
    let size_bytes = fs::metadata(&args.model_file)?.len();

    output_result(
        "Model exported",
        &ExportResult {
            path: args.model_file.to_string_lossy().to_string(),
            size_bytes,
        },
        cli_args,
    )
}

/// Import a model, optionally probing it with one utterance.
fn import(parser: &IntentParser, args: ImportArgs, cli_args: &ParlanceArgs) -> Result<()> {
    let summary = parser.load_model(&args.model_file)?;

    let probe = args
        .probe
        .as_deref()
        .map(|text| ClassificationResult::from(&parser.classify(text)));

    output_result(
        "Model imported",
        &ImportResult {
            path: args.model_file.to_string_lossy().to_string(),
            weights_loaded: summary.weights_loaded,
            weights_skipped: summary.weights_skipped,
            network_loaded: summary.network_loaded,
            probe,
        },
        cli_args,
    )
}
