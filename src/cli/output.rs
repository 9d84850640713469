//! Output formatting for CLI commands.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, ParlanceArgs};
use crate::error::Result;
use crate::intent::ParsedIntent;

/// Result structure for one classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: String,
    pub confidence: f64,
    pub sentiment: String,
    pub arguments: HashMap<String, String>,
    pub prior_intents: Vec<String>,
}

impl From<&ParsedIntent> for ClassificationResult {
    fn from(parsed: &ParsedIntent) -> Self {
        ClassificationResult {
            intent: parsed.intent.to_string(),
            confidence: parsed.confidence,
            sentiment: parsed.sentiment.to_string(),
            arguments: parsed.arguments.clone(),
            prior_intents: parsed.prior_intents.iter().map(|i| i.to_string()).collect(),
        }
    }
}

/// Result structure for bulk training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub samples_added: usize,
    pub samples_skipped: usize,
    pub duration_ms: u64,
    pub last_accuracy: Option<f64>,
}

/// Result structure for model export.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: String,
    pub size_bytes: u64,
}

/// Result structure for model import.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResult {
    pub path: String,
    pub weights_loaded: usize,
    pub weights_skipped: usize,
    pub network_loaded: bool,
    pub probe: Option<ClassificationResult>,
}

/// Output a result in the configured format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &ParlanceArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &ParlanceArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
    }

    let value = serde_json::to_value(result)?;
    print_value("", &value);
    Ok(())
}

fn print_value(indent: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, inner) in map {
                match inner {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{indent}{key}:");
                        print_value(&format!("{indent}  "), inner);
                    }
                    serde_json::Value::Null => {}
                    _ => println!("{indent}{key}: {}", plain(inner)),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                println!("{indent}- {}", plain(item));
            }
        }
        _ => println!("{indent}{}", plain(value)),
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ParlanceArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
