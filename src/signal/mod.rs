//! Classifier signals.
//!
//! Each signal is an independent scoring strategy: given an analyzed
//! utterance and the conversation context, it emits a map of candidate
//! intents to scores in `[0, 1]`, or abstains entirely. The ensemble
//! decides how much each signal's opinion is worth; signals never see each
//! other. "Advanced" classification is nothing more than a richer signal
//! list injected at construction.

pub mod context;
pub mod keyword;
pub mod naive;
pub mod neural_embedding;
pub mod pattern;

pub use context::ContextSignal;
pub use keyword::KeywordSignal;
pub use naive::NaiveWeightSignal;
pub use neural_embedding::NeuralEmbeddingSignal;
pub use pattern::PatternSignal;

use std::collections::HashMap;

use crate::analysis::Utterance;
use crate::context::ConversationContext;
use crate::intent::Intent;

/// Candidate intents and their scores. Missing intents score zero.
pub type ScoreMap = HashMap<Intent, f64>;

/// The ensemble slot a signal's scores feed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Regex pattern matching.
    Pattern,
    /// Keyword set matching.
    Keyword,
    /// Conversational transition scoring.
    Context,
    /// Learned models: word weights and the neural/prototype hybrid.
    Ml,
}

/// Verbatim text pulled from the best pattern match's capture group.
#[derive(Debug, Clone)]
pub struct PatternCapture {
    /// Intent of the pattern that captured.
    pub intent: Intent,
    /// Captured text, trimmed.
    pub content: String,
    /// Score of the capturing pattern.
    pub score: f64,
}

/// One independent scoring strategy.
pub trait ClassifierSignal: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Which ensemble slot this signal feeds.
    fn kind(&self) -> SignalKind;

    /// Score the utterance, or `None` to abstain.
    ///
    /// An abstaining signal is omitted from the ensemble rather than
    /// counted as all zeros.
    fn score(&self, utterance: &Utterance, context: &ConversationContext) -> Option<ScoreMap>;

    /// Structured capture from the utterance, if this signal extracts one.
    fn capture(&self, _utterance: &Utterance) -> Option<PatternCapture> {
        None
    }
}
