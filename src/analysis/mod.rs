//! Text analysis for Parlance.
//!
//! This module provides everything that happens to an utterance before
//! scoring: normalization, tokenization, lexicon lookups, and morphological
//! analysis. The [`Utterance`] type bundles the results so each signal reads
//! from one shared analysis instead of re-running the pipeline.

pub mod lexicon;
pub mod morphology;
pub mod preprocess;

pub use morphology::{MorphInfo, MorphologyAnalyzer, PartOfSpeech};
pub use preprocess::TextPreprocessor;

use crate::intent::Sentiment;

/// A fully analyzed utterance.
///
/// Built once per classification and shared by every signal. `tokens`,
/// `stems`, and `morphs` are index-aligned.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Text exactly as received, before any normalization.
    pub raw: String,
    /// Normalized form: lowercased, punctuation-free, synonyms applied.
    pub normalized: String,
    /// Word tokens of the normalized text.
    pub tokens: Vec<String>,
    /// Stem of each token.
    pub stems: Vec<String>,
    /// Morphological analysis of each token.
    pub morphs: Vec<MorphInfo>,
    /// Lexicon-scored sentiment of the full utterance.
    pub sentiment: Sentiment,
}

impl Utterance {
    /// Run the full analysis pipeline over raw text.
    pub fn analyze(raw: &str, preprocessor: &TextPreprocessor, morphology: &MorphologyAnalyzer) -> Self {
        let (normalized, tokens) = preprocessor.process(raw);
        let morphs: Vec<MorphInfo> = tokens.iter().map(|t| morphology.analyze(t)).collect();
        let stems: Vec<String> = morphs.iter().map(|m| m.stem.clone()).collect();
        let sentiment = lexicon::score_sentiment(&tokens);

        Utterance {
            raw: raw.to_string(),
            normalized,
            tokens,
            stems,
            morphs,
            sentiment,
        }
    }

    /// Whether normalization left no usable tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Stems of tokens that are not stop words.
    pub fn content_stems(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .zip(self.stems.iter())
            .filter(|(token, _)| !lexicon::is_stop_word(token))
            .map(|(_, stem)| stem.as_str())
    }

    /// Number of word tokens.
    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }

    /// Number of characters in the normalized text.
    pub fn char_count(&self) -> usize {
        self.normalized.chars().count()
    }
}
