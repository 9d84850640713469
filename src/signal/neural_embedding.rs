//! Neural network and prototype-similarity hybrid signal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::Utterance;
use crate::context::ConversationContext;
use crate::embedding::WordEmbeddingStore;
use crate::features::{FeatureExtractor, apply_activation_threshold};
use crate::intent::Intent;
use crate::signal::{ClassifierSignal, ScoreMap, SignalKind};
use crate::training::SharedModel;

/// Default wall-clock budget for feature extraction.
pub const FEATURE_BUDGET: Duration = Duration::from_millis(50);

/// Default blend weight for the network's softmax output.
pub const NEURAL_WEIGHT: f64 = 0.7;

/// Default blend weight for prototype cosine similarity.
pub const PROTOTYPE_WEIGHT: f64 = 0.3;

/// Blends the feed-forward network's softmax with prototype similarity.
///
/// Scores every intent as `neural_weight * softmax + prototype_weight *
/// similarity`. Feature extraction runs under a deadline; when it expires
/// the signal abstains rather than stall the whole classification, and the
/// ensemble proceeds on the remaining signals.
pub struct NeuralEmbeddingSignal {
    model: Arc<SharedModel>,
    store: Arc<WordEmbeddingStore>,
    extractor: FeatureExtractor,
    budget: Duration,
    neural_weight: f64,
    prototype_weight: f64,
}

impl NeuralEmbeddingSignal {
    /// Create the signal, compiling the feature extractor's patterns.
    pub fn new(
        model: Arc<SharedModel>,
        store: Arc<WordEmbeddingStore>,
    ) -> crate::error::Result<Self> {
        let extractor = FeatureExtractor::new(Arc::clone(&store))?;
        Ok(Self {
            model,
            store,
            extractor,
            budget: FEATURE_BUDGET,
            neural_weight: NEURAL_WEIGHT,
            prototype_weight: PROTOTYPE_WEIGHT,
        })
    }

    /// Override the feature extraction budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Override the softmax/similarity blend.
    pub fn with_blend(mut self, neural_weight: f64, prototype_weight: f64) -> Self {
        self.neural_weight = neural_weight;
        self.prototype_weight = prototype_weight;
        self
    }
}

impl ClassifierSignal for NeuralEmbeddingSignal {
    fn name(&self) -> &'static str {
        "neural_embedding"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Ml
    }

    fn score(&self, utterance: &Utterance, _context: &ConversationContext) -> Option<ScoreMap> {
        let deadline = Instant::now().checked_add(self.budget);
        let mut features = self.extractor.extract_with_deadline(utterance, deadline)?;

        let snapshot = self.model.network();
        apply_activation_threshold(&mut features, snapshot.activation_threshold);
        let probs = match snapshot.network.forward(&features) {
            Ok(probs) => probs,
            Err(e) => {
                log::warn!("neural forward pass failed, abstaining: {e}");
                return None;
            }
        };

        let sentence = self.store.embed_sentence(&utterance.tokens);
        let similarities = self.model.prototypes().scores(&sentence);

        let mut scores = ScoreMap::new();
        for intent in Intent::ALL {
            let neural = probs.get(intent.index()).copied().unwrap_or(0.0);
            let similarity = similarities.get(&intent).copied().unwrap_or(0.0);
            scores.insert(
                intent,
                self.neural_weight * neural + self.prototype_weight * similarity,
            );
        }
        Some(scores)
    }
}
