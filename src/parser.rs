//! The intent parser: the crate's sole classification entry point.
//!
//! [`IntentParser`] owns the analysis pipeline, the signal list, the
//! ensemble, the conversation window, and the training loop. Classification
//! is synchronous; learning runs on the background worker and publishes new
//! model snapshots, so a classification that is already in flight finishes
//! on the snapshot it started with.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::analysis::{MorphologyAnalyzer, TextPreprocessor, Utterance};
use crate::arguments::ArgumentExtractor;
use crate::context::{ContextConfig, ConversationContext};
use crate::embedding::{EmbeddingConfig, IntentPrototypes, WordEmbeddingStore};
use crate::ensemble::{Ensemble, EnsembleConfig, EnsembleDecision};
use crate::error::Result;
use crate::intent::{Intent, ParsedIntent};
use crate::neural::{FeedForwardNetwork, NetworkConfig};
use crate::signal::{
    ClassifierSignal, ContextSignal, KeywordSignal, NaiveWeightSignal, NeuralEmbeddingSignal,
    PatternCapture, PatternSignal, SignalKind,
};
use crate::training::interchange;
use crate::training::{
    ImportSummary, NetworkSnapshot, RetrainStats, Retrainer, SharedModel, TrainingConfig,
    TrainingSample, TrainingStore, ValidationReport, WeightTable,
};

/// Tuning for the neural/prototype hybrid signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Blend weight of the network's softmax output.
    pub neural_weight: f64,
    /// Blend weight of prototype cosine similarity.
    pub prototype_weight: f64,
    /// Wall-clock budget for feature extraction, in milliseconds.
    pub budget_ms: u64,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        SemanticConfig {
            neural_weight: 0.7,
            prototype_weight: 0.3,
            budget_ms: 50,
        }
    }
}

/// Aggregated configuration for a parser instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub ensemble: EnsembleConfig,
    pub context: ContextConfig,
    pub embedding: EmbeddingConfig,
    pub network: NetworkConfig,
    pub training: TrainingConfig,
    pub semantic: SemanticConfig,
    /// Correct predictions below this confidence are reinforced when
    /// feedback confirms them.
    pub low_confidence_threshold: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            ensemble: EnsembleConfig::default(),
            context: ContextConfig::default(),
            embedding: EmbeddingConfig::default(),
            network: NetworkConfig::default(),
            training: TrainingConfig::default(),
            semantic: SemanticConfig::default(),
            low_confidence_threshold: 0.7,
        }
    }
}

impl ParserConfig {
    /// Defaults with the learned thresholds lowered, convenient for tests
    /// and demos that feed only a handful of samples.
    pub fn eager() -> Self {
        ParserConfig {
            training: TrainingConfig {
                min_samples_for_weights: 0,
                min_retrain_samples: 4,
                grid_search: false,
                ..TrainingConfig::default()
            },
            ..ParserConfig::default()
        }
    }
}

/// Hybrid rule/ML intent classifier with an online learning loop.
///
/// One parser serves one conversation. The instance is `Send + Sync`;
/// callers sharing a single conversation across threads get their context
/// mutations serialized by the internal lock.
pub struct IntentParser {
    config: ParserConfig,
    preprocessor: Arc<TextPreprocessor>,
    morphology: Arc<MorphologyAnalyzer>,
    embeddings: Arc<WordEmbeddingStore>,
    model: Arc<SharedModel>,
    signals: Vec<Box<dyn ClassifierSignal>>,
    ensemble: Ensemble,
    arguments: ArgumentExtractor,
    context: RwLock<ConversationContext>,
    store: Mutex<TrainingStore>,
    retrainer: Retrainer,
}

impl std::fmt::Debug for IntentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentParser")
            .field("signals", &self.signals.len())
            .field("context_len", &self.context.read().len())
            .field("samples", &self.store.lock().len())
            .finish()
    }
}

impl IntentParser {
    /// Rule-driven parser: pattern, keyword, context, and word-weight
    /// signals.
    pub fn basic(config: ParserConfig) -> Result<Self> {
        Self::build(config, false)
    }

    /// Full parser: the basic signal set plus the neural/prototype hybrid.
    pub fn advanced(config: ParserConfig) -> Result<Self> {
        Self::build(config, true)
    }

    fn build(config: ParserConfig, semantic: bool) -> Result<Self> {
        let preprocessor = Arc::new(TextPreprocessor::new());
        let morphology = Arc::new(MorphologyAnalyzer::new());
        let embeddings = Arc::new(WordEmbeddingStore::new(
            config.embedding.clone(),
            Arc::clone(&morphology),
        ));

        let model = Arc::new(SharedModel::new(
            WeightTable::new(),
            NetworkSnapshot {
                network: FeedForwardNetwork::new(config.network.clone()),
                activation_threshold: 0.0,
            },
            IntentPrototypes::build(&embeddings, &preprocessor),
        ));

        let mut signals: Vec<Box<dyn ClassifierSignal>> = vec![
            Box::new(PatternSignal::new()?),
            Box::new(KeywordSignal::new()),
            Box::new(ContextSignal::new(config.context.clone())),
            Box::new(
                NaiveWeightSignal::new(Arc::clone(&model))
                    .with_min_samples(config.training.min_samples_for_weights),
            ),
        ];
        if semantic {
            signals.push(Box::new(
                NeuralEmbeddingSignal::new(Arc::clone(&model), Arc::clone(&embeddings))?
                    .with_budget(Duration::from_millis(config.semantic.budget_ms))
                    .with_blend(
                        config.semantic.neural_weight,
                        config.semantic.prototype_weight,
                    ),
            ));
        }

        let retrainer = Retrainer::new(
            config.training.clone(),
            config.network.clone(),
            Arc::clone(&model),
            Arc::clone(&embeddings),
            Arc::clone(&preprocessor),
            Arc::clone(&morphology),
        )?;

        Ok(IntentParser {
            ensemble: Ensemble::new(config.ensemble.clone()),
            arguments: ArgumentExtractor::new()?,
            context: RwLock::new(ConversationContext::new(config.context.max_window)),
            store: Mutex::new(TrainingStore::new()),
            config,
            preprocessor,
            morphology,
            embeddings,
            model,
            signals,
            retrainer,
        })
    }

    /// Classify one utterance.
    pub fn classify(&self, text: &str) -> ParsedIntent {
        self.classify_for_user(text, None)
    }

    /// Classify one utterance, tagging the log record with the user.
    ///
    /// The parser itself stores nothing per user; the identifier only feeds
    /// the interaction log the surrounding system persists.
    pub fn classify_for_user(&self, text: &str, user_id: Option<&str>) -> ParsedIntent {
        let utterance = Utterance::analyze(text, &self.preprocessor, &self.morphology);
        if utterance.is_empty() {
            return ParsedIntent::unknown(text);
        }

        let decision = self.score(&utterance);
        let capture = self.best_capture(&utterance);
        let arguments = self
            .arguments
            .extract(decision.intent, &utterance, capture.as_ref());

        let prior_intents = self.context.read().recent_intents();
        let result = ParsedIntent::new(decision.intent, text, decision.confidence)
            .with_arguments(arguments)
            .with_prior_intents(prior_intents)
            .with_sentiment(utterance.sentiment);

        self.context.write().record(result.clone());
        log::debug!(
            "classified user={} intent={} confidence={:.3}",
            user_id.unwrap_or("-"),
            result.intent,
            result.confidence,
        );
        result
    }

    fn score(&self, utterance: &Utterance) -> EnsembleDecision {
        let context = self.context.read();
        let mut emissions: Vec<(SignalKind, _)> = Vec::with_capacity(self.signals.len());
        for signal in &self.signals {
            if let Some(scores) = signal.score(utterance, &context) {
                log::debug!("signal {} scored {} intents", signal.name(), scores.len());
                emissions.push((signal.kind(), scores));
            }
        }
        drop(context);
        self.ensemble.fuse(&emissions)
    }

    fn best_capture(&self, utterance: &Utterance) -> Option<PatternCapture> {
        self.signals
            .iter()
            .find_map(|signal| signal.capture(utterance))
    }

    /// Record a labeled example and fold it into the model.
    ///
    /// Word weights and priors update immediately via a snapshot swap; the
    /// network's online epochs run on the background worker. Every
    /// `retrain_interval`-th sample also queues a full retrain.
    pub fn add_training_sample(
        &self,
        text: &str,
        correct_intent: Intent,
        expected_arguments: Option<HashMap<String, String>>,
        user_id: Option<&str>,
    ) -> Result<()> {
        let utterance = Utterance::analyze(text, &self.preprocessor, &self.morphology);
        if utterance.is_empty() {
            log::warn!("ignoring empty training sample");
            return Ok(());
        }

        let stems: Vec<String> = utterance.content_stems().map(str::to_string).collect();
        self.model.update_weights(|table| {
            for stem in &stems {
                table.reinforce(stem, correct_intent);
            }
            table.record_intent(correct_intent);
        });

        let mut sample = TrainingSample::new(text, correct_intent);
        if let Some(arguments) = expected_arguments {
            sample = sample.with_arguments(arguments);
        }
        if let Some(user) = user_id {
            sample = sample.with_user(user);
        }

        let (count, retrain_batch) = {
            let mut store = self.store.lock();
            store.push(sample.clone());
            store.cleanup(self.config.training.max_samples);
            let count = store.len();
            let batch = if count % self.config.training.retrain_interval == 0 {
                Some(store.samples().to_vec())
            } else {
                None
            };
            (count, batch)
        };

        self.retrainer.submit_online(sample)?;
        if let Some(batch) = retrain_batch {
            log::info!("queueing full retrain after {count} samples");
            self.retrainer.submit_retrain(batch)?;
        }
        Ok(())
    }

    /// Fold a user's verdict on a prediction back into the model.
    ///
    /// A wrong prediction demotes the weights that produced it and records
    /// the corrected label. A confirmed prediction is only reinforced when
    /// its confidence was low; confident hits teach nothing new.
    pub fn provide_feedback(
        &self,
        text: &str,
        predicted: Intent,
        correct: Intent,
        confidence: f64,
    ) -> Result<()> {
        if predicted != correct {
            let utterance = Utterance::analyze(text, &self.preprocessor, &self.morphology);
            let stems: Vec<String> = utterance.content_stems().map(str::to_string).collect();
            self.model.update_weights(|table| {
                for stem in &stems {
                    table.demote(stem, predicted);
                }
            });
            self.add_training_sample(text, correct, None, None)
        } else if confidence < self.config.low_confidence_threshold {
            self.add_training_sample(text, correct, None, None)
        } else {
            Ok(())
        }
    }

    /// Drop the oldest training samples beyond `max_samples`.
    pub fn cleanup(&self, max_samples: usize) -> usize {
        self.store.lock().cleanup(max_samples)
    }

    /// Number of training samples currently held.
    pub fn training_sample_count(&self) -> usize {
        self.store.lock().len()
    }

    /// Serialize the learned state to JSON.
    pub fn export_model(&self) -> Result<String> {
        interchange::export_model(&self.model)
    }

    /// Load learned state from JSON, skipping entries that do not parse.
    pub fn import_model(&self, json: &str) -> Result<ImportSummary> {
        interchange::import_model(&self.model, json, &self.config.network)
    }

    /// Write the exported model to a file.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        interchange::save_model(&self.model, path)
    }

    /// Import a model from a file.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        interchange::load_model(&self.model, path, &self.config.network)
    }

    /// Block until all queued training work has completed.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.retrainer.wait_idle(timeout)
    }

    /// Snapshot of the conversation window.
    pub fn context(&self) -> ConversationContext {
        self.context.read().clone()
    }

    /// Reset the conversation window.
    pub fn clear_context(&self) {
        self.context.write().clear();
    }

    /// Validation report of the most recent full retrain, if any ran.
    pub fn last_report(&self) -> Option<ValidationReport> {
        self.retrainer.last_report()
    }

    /// Lifetime training counters.
    pub fn training_stats(&self) -> RetrainStats {
        self.retrainer.stats()
    }

    /// The shared model state. Test and inspection hook.
    pub fn model(&self) -> &Arc<SharedModel> {
        &self.model
    }

    /// The shared embedding store.
    pub fn embeddings(&self) -> &Arc<WordEmbeddingStore> {
        &self.embeddings
    }

    /// Parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}
