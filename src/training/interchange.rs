//! JSON model interchange.
//!
//! Exports and imports the learned state of a parser: word weights, intent
//! priors, the neural network's layers, and the prototype table. The format
//! is plain JSON so models can move between processes and be inspected by
//! hand. Import is deliberately forgiving: optional sections may be absent,
//! and malformed or unrecognized entries are logged and skipped so a partial
//! model still loads whatever it can.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::intent::Intent;
use crate::neural::{FeedForwardNetwork, NetworkConfig};
use crate::training::state::{NetworkSnapshot, SharedModel};
use crate::training::weights::WeightTable;

/// Format version written into every export.
pub const MODEL_VERSION: &str = "2.0";

/// Serialized network layers plus their expected shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkExport {
    pub weights_input_hidden: Vec<Vec<f64>>,
    pub weights_hidden_output: Vec<Vec<f64>>,
    pub bias_hidden: Vec<f64>,
    pub bias_output: Vec<f64>,
    /// `[input, hidden, output]` layer widths.
    pub architecture: [usize; 3],
}

/// The on-the-wire model document.
///
/// `word_weights` keys are `<stem>_<intent>`; stems may themselves contain
/// underscores, so import resolves the intent by longest matching suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelExport {
    pub model_version: String,
    pub training_data_count: usize,
    pub word_weights: HashMap<String, f64>,
    pub intent_priors: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_network: Option<NetworkExport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_prototypes: Option<HashMap<String, Vec<f64>>>,
}

/// What an import managed to load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub weights_loaded: usize,
    pub weights_skipped: usize,
    pub priors_loaded: usize,
    pub priors_skipped: usize,
    pub network_loaded: bool,
    pub prototypes_loaded: usize,
}

/// Serialize the model's learned state to a JSON string.
pub fn export_model(model: &SharedModel) -> Result<String> {
    let weights = model.weights();
    let network = model.network();
    let prototypes = model.prototypes();

    let word_weights = weights
        .iter_weights()
        .map(|((stem, intent), value)| (format!("{stem}_{intent}"), *value))
        .collect();
    let intent_priors = Intent::ALL
        .iter()
        .map(|intent| (intent.as_str().to_string(), weights.prior(*intent)))
        .collect();

    let (input, hidden, output) = network.network.architecture();
    let export = ModelExport {
        model_version: MODEL_VERSION.to_string(),
        training_data_count: weights.total_samples(),
        word_weights,
        intent_priors,
        neural_network: Some(NetworkExport {
            weights_input_hidden: network.network.weights_input_hidden().to_vec(),
            weights_hidden_output: network.network.weights_hidden_output().to_vec(),
            bias_hidden: network.network.bias_hidden().to_vec(),
            bias_output: network.network.bias_output().to_vec(),
            architecture: [input, hidden, output],
        }),
        intent_prototypes: Some(
            prototypes
                .iter()
                .map(|(intent, vector)| (intent.as_str().to_string(), vector.clone()))
                .collect(),
        ),
    };

    Ok(serde_json::to_string(&export)?)
}

/// Load learned state from a JSON string into the shared model.
///
/// Fails only when the document is not valid JSON at all. Every recognized
/// section replaces the corresponding snapshot; entries that cannot be
/// interpreted are counted, logged, and skipped.
pub fn import_model(
    model: &SharedModel,
    json: &str,
    network_config: &NetworkConfig,
) -> Result<ImportSummary> {
    let export: ModelExport = serde_json::from_str(json)?;
    let mut summary = ImportSummary::default();

    let mut table = WeightTable::new();
    for (key, value) in &export.word_weights {
        match split_weight_key(key) {
            Some((stem, intent)) if *value > 0.0 => {
                table.set_weight(stem.to_string(), intent, *value);
                summary.weights_loaded += 1;
            }
            _ => {
                log::warn!("skipping unrecognized weight entry '{key}'");
                summary.weights_skipped += 1;
            }
        }
    }

    let mut counts: HashMap<Intent, usize> = HashMap::new();
    for (name, prior) in &export.intent_priors {
        match Intent::parse(name) {
            Some(intent) if (0.0..=1.0).contains(prior) => {
                let count = (prior * export.training_data_count as f64).round() as usize;
                if count > 0 {
                    counts.insert(intent, count);
                }
                summary.priors_loaded += 1;
            }
            _ => {
                log::warn!("skipping unrecognized prior entry '{name}'");
                summary.priors_skipped += 1;
            }
        }
    }
    table.set_counts(counts);
    model.replace_weights(table);

    if let Some(network) = export.neural_network {
        match rebuild_network(network, network_config) {
            Ok(rebuilt) => {
                let threshold = model.network().activation_threshold;
                model.replace_network(NetworkSnapshot {
                    network: rebuilt,
                    activation_threshold: threshold,
                });
                summary.network_loaded = true;
            }
            Err(e) => {
                log::warn!("skipping neural network section: {e}");
            }
        }
    }

    if let Some(prototypes) = export.intent_prototypes {
        let mut rebuilt = (*model.prototypes()).clone();
        for (name, vector) in prototypes {
            match Intent::parse(&name) {
                Some(intent) => {
                    rebuilt.set_vector(intent, vector);
                    summary.prototypes_loaded += 1;
                }
                None => {
                    log::warn!("skipping prototype for unrecognized intent '{name}'");
                }
            }
        }
        model.replace_prototypes(rebuilt);
    }

    log::info!(
        "model import: {} weights, {} priors, network {}",
        summary.weights_loaded,
        summary.priors_loaded,
        if summary.network_loaded { "loaded" } else { "kept" },
    );
    Ok(summary)
}

/// Write the exported model to a file.
pub fn save_model<P: AsRef<Path>>(model: &SharedModel, path: P) -> Result<()> {
    let json = export_model(model)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a model file and import it.
pub fn load_model<P: AsRef<Path>>(
    model: &SharedModel,
    path: P,
    network_config: &NetworkConfig,
) -> Result<ImportSummary> {
    let json = fs::read_to_string(path)?;
    import_model(model, &json, network_config)
}

/// Split a `<stem>_<intent>` key, resolving the intent by longest suffix.
fn split_weight_key(key: &str) -> Option<(&str, Intent)> {
    let mut best: Option<(&str, Intent)> = None;
    for intent in Intent::ALL {
        let name = intent.as_str();
        if let Some(stem) = key.strip_suffix(name).and_then(|rest| rest.strip_suffix('_')) {
            if !stem.is_empty()
                && best.is_none_or(|(_, prev)| name.len() > prev.as_str().len())
            {
                best = Some((stem, intent));
            }
        }
    }
    best
}

fn rebuild_network(export: NetworkExport, config: &NetworkConfig) -> Result<FeedForwardNetwork> {
    let [input, hidden, output] = export.architecture;
    FeedForwardNetwork::from_parts(
        NetworkConfig {
            input_size: input,
            hidden_size: hidden,
            output_size: output,
            ..config.clone()
        },
        export.weights_input_hidden,
        export.weights_hidden_output,
        export.bias_hidden,
        export.bias_output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::analysis::{MorphologyAnalyzer, TextPreprocessor};
    use crate::embedding::{EmbeddingConfig, IntentPrototypes, WordEmbeddingStore};

    fn shared() -> SharedModel {
        let store = WordEmbeddingStore::new(
            EmbeddingConfig::default(),
            Arc::new(MorphologyAnalyzer::new()),
        );
        SharedModel::new(
            WeightTable::new(),
            NetworkSnapshot {
                network: FeedForwardNetwork::new(NetworkConfig::default()),
                activation_threshold: 0.0,
            },
            IntentPrototypes::build(&store, &TextPreprocessor::new()),
        )
    }

    #[test]
    fn test_split_weight_key_prefers_longest_intent() {
        // "question_ask_question" must resolve to AskQuestion, not fail on
        // the embedded underscore.
        let (stem, intent) = split_weight_key("question_ask_question").unwrap();
        assert_eq!(stem, "question");
        assert_eq!(intent, Intent::AskQuestion);

        let (stem, intent) = split_weight_key("цел_set_goal").unwrap();
        assert_eq!(stem, "цел");
        assert_eq!(intent, Intent::SetGoal);

        assert!(split_weight_key("no-intent-here").is_none());
        assert!(split_weight_key("_greet").is_none());
    }

    #[test]
    fn test_roundtrip_restores_weights_and_priors() {
        let model = shared();
        model.update_weights(|table| {
            table.reinforce("цел", Intent::SetGoal);
            table.reinforce("привет", Intent::Greet);
            for _ in 0..3 {
                table.record_intent(Intent::SetGoal);
            }
            table.record_intent(Intent::Greet);
        });

        let json = export_model(&model).unwrap();

        let restored = shared();
        let summary = import_model(&restored, &json, &NetworkConfig::default()).unwrap();
        assert_eq!(summary.weights_loaded, 2);
        assert!(summary.network_loaded);

        let weights = restored.weights();
        assert!((weights.weight("цел", Intent::SetGoal) - 1.1).abs() < 1e-9);
        assert_eq!(weights.total_samples(), 4);
        assert!((weights.prior(Intent::SetGoal) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_restores_network_outputs() {
        let model = shared();
        let json = export_model(&model).unwrap();

        let restored = shared();
        import_model(&restored, &json, &NetworkConfig::default()).unwrap();

        let input = vec![0.25; NetworkConfig::default().input_size];
        let original = model.network().network.forward(&input).unwrap();
        let imported = restored.network().network.forward(&input).unwrap();
        // Bit-exact: serde_json's float_roundtrip feature keeps weights
        // lossless across the JSON roundtrip.
        assert_eq!(original, imported);
    }

    #[test]
    fn test_unknown_intents_are_skipped_not_fatal() {
        let model = shared();
        let json = r#"{
            "model_version": "2.0",
            "training_data_count": 2,
            "word_weights": {"цел_set_goal": 1.3, "junk_not_an_intent": 2.0},
            "intent_priors": {"set_goal": 1.0, "not_an_intent": 0.5}
        }"#;

        let summary = import_model(&model, json, &NetworkConfig::default()).unwrap();
        assert_eq!(summary.weights_loaded, 1);
        assert_eq!(summary.weights_skipped, 1);
        assert_eq!(summary.priors_loaded, 1);
        assert_eq!(summary.priors_skipped, 1);
        assert!(!summary.network_loaded);

        assert!((model.weights().weight("цел", Intent::SetGoal) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_network_shape_is_skipped() {
        let model = shared();
        let before = Arc::as_ptr(&model.network());
        let json = r#"{
            "model_version": "2.0",
            "training_data_count": 0,
            "word_weights": {},
            "intent_priors": {},
            "neural_network": {
                "weights_input_hidden": [[0.1, 0.2]],
                "weights_hidden_output": [[0.3]],
                "bias_hidden": [0.0],
                "bias_output": [0.0],
                "architecture": [512, 64, 15]
            }
        }"#;

        let summary = import_model(&model, json, &NetworkConfig::default()).unwrap();
        assert!(!summary.network_loaded);
        assert_eq!(before, Arc::as_ptr(&model.network()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let model = shared();
        assert!(import_model(&model, "{ not json", &NetworkConfig::default()).is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let model = shared();
        model.update_weights(|table| table.reinforce("привет", Intent::Greet));
        save_model(&model, &path).unwrap();

        let restored = shared();
        let summary = load_model(&restored, &path, &NetworkConfig::default()).unwrap();
        assert_eq!(summary.weights_loaded, 1);
        assert!((restored.weights().weight("привет", Intent::Greet) - 1.1).abs() < 1e-9);
    }
}
