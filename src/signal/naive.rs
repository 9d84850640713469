//! Learned word-weight signal.

use std::sync::Arc;

use crate::analysis::Utterance;
use crate::context::ConversationContext;
use crate::intent::Intent;
use crate::signal::{ClassifierSignal, ScoreMap, SignalKind};
use crate::training::SharedModel;

/// Training samples required before this signal starts scoring.
pub const MIN_TRAINING_SAMPLES: usize = 50;

/// Naive-Bayes-style scorer over learned per-stem weights.
///
/// For each intent, multiplies the intent prior by the learned weight of
/// every content stem, then renormalizes so the emitted scores sum to one.
/// Until the model has seen enough training samples the weights are mostly
/// smoothing noise, so the signal abstains outright below the threshold.
#[derive(Debug)]
pub struct NaiveWeightSignal {
    model: Arc<SharedModel>,
    min_samples: usize,
}

impl NaiveWeightSignal {
    pub fn new(model: Arc<SharedModel>) -> Self {
        Self {
            model,
            min_samples: MIN_TRAINING_SAMPLES,
        }
    }

    /// Override the sample threshold.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }
}

impl ClassifierSignal for NaiveWeightSignal {
    fn name(&self) -> &'static str {
        "naive_weight"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Ml
    }

    fn score(&self, utterance: &Utterance, _context: &ConversationContext) -> Option<ScoreMap> {
        let table = self.model.weights();
        if table.total_samples() <= self.min_samples {
            return None;
        }

        let stems: Vec<&str> = utterance.content_stems().collect();
        let mut scores = ScoreMap::new();
        let mut total = 0.0;
        for intent in Intent::ALL {
            let mut score = table.prior(intent);
            for stem in &stems {
                score *= table.weight(stem, intent);
            }
            if score > 0.0 {
                total += score;
                scores.insert(intent, score);
            }
        }

        if scores.is_empty() || total <= 0.0 {
            return None;
        }
        for score in scores.values_mut() {
            *score /= total;
        }
        Some(scores)
    }
}
