//! Hand-engineered feature vectors for the neural scorer.
//!
//! Every utterance maps to a fixed 512-dimension vector laid out in three
//! blocks: the sentence embedding plus scaled surface counts, a
//! morphological profile (part-of-speech ratios and grammatical tag flags),
//! and a syntactic profile (cue-category hits, punctuation counts, hashed
//! character bigrams). Block offsets are part of the model format; a
//! serialized network only works against the layout it was trained on.
//!
//! Extraction can run under a deadline. The check sits between blocks, so
//! an expired deadline abandons the vector instead of returning a half
//! filled one.

use std::sync::Arc;
use std::time::Instant;

use regex::Regex;

use crate::analysis::Utterance;
use crate::analysis::morphology::{KNOWN_TAGS, PartOfSpeech};
use crate::embedding::store::{WordEmbeddingStore, stable_hash};
use crate::error::Result;

/// Width of every feature vector.
pub const FEATURE_DIM: usize = 512;

const SCALAR_OFFSET: usize = 300;
const POS_OFFSET: usize = 305;
const TAG_OFFSET: usize = 315;
const SYNTAX_OFFSET: usize = 405;
const PUNCT_OFFSET: usize = 425;
const BIGRAM_OFFSET: usize = 432;
const BIGRAM_BUCKETS: usize = 50;

/// Cue categories matched against normalized text, one binary+count pair
/// each: question, imperative, conditional, temporal, modal, negative,
/// emotional, cognitive, memory, goal.
const SYNTAX_PATTERNS: &[&str] = &[
    r"^(?:что|как|почему|зачем|когда|где|кто|сколько|what|how|why|when|where|who|which)\b",
    r"^(?:поставь|сделай|запусти|добавь|объясни|покажи|вспомни|изменись|стань|set|add|run|make|show|explain|activate|recall|become)\b",
    r"\b(?:если|иначе|if|unless|otherwise|would)\b",
    r"\b(?:сегодня|завтра|вчера|сейчас|потом|скоро|today|tomorrow|yesterday|now|later|soon)\b",
    r"\b(?:можешь|надо|нужно|должен|должна|can|could|should|must|may|need)\b",
    r"\b(?:не|нет|ни|никогда|not|no|never|dont)\b",
    r"\b(?:эмоци\w*|чувств\w*|радость|грусть|страх|злость|emotion\w*|feel\w*|joy|sadness|fear|anger)\b",
    r"\b(?:дума\w*|зна\w*|понима\w*|помн\w*|размышля\w*|think\w*|know\w*|understand\w*|believe\w*)\b",
    r"\b(?:памят\w*|вспомн\w*|запомн\w*|memory|remember|recall|forget)\b",
    r"\b(?:цель|цели|целей|задач\w*|план\w*|goal|goals|plan|task)\b",
];

/// Count-to-unit scaling caps. A count at or above the cap saturates at 1.
const WORD_COUNT_CAP: f64 = 20.0;
const CHAR_COUNT_CAP: f64 = 200.0;
const HIT_COUNT_CAP: f64 = 5.0;

/// Extracts fixed-width feature vectors from analyzed utterances.
pub struct FeatureExtractor {
    store: Arc<WordEmbeddingStore>,
    syntax: Vec<Regex>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("dimension", &FEATURE_DIM)
            .field("syntax_patterns", &self.syntax.len())
            .finish()
    }
}

impl FeatureExtractor {
    /// Create an extractor sharing the given embedding store.
    pub fn new(store: Arc<WordEmbeddingStore>) -> Result<Self> {
        let mut syntax = Vec::with_capacity(SYNTAX_PATTERNS.len());
        for pattern in SYNTAX_PATTERNS {
            syntax.push(Regex::new(pattern)?);
        }
        Ok(FeatureExtractor { store, syntax })
    }

    /// Vector width.
    pub fn dimension(&self) -> usize {
        FEATURE_DIM
    }

    /// Extract the full feature vector.
    pub fn extract(&self, utterance: &Utterance) -> Vec<f64> {
        // With no deadline the extraction cannot be abandoned.
        self.extract_with_deadline(utterance, None)
            .unwrap_or_else(|| vec![0.0; FEATURE_DIM])
    }

    /// Extract under a deadline, checked between blocks.
    ///
    /// Returns `None` if the deadline passed before the vector completed.
    pub fn extract_with_deadline(
        &self,
        utterance: &Utterance,
        deadline: Option<Instant>,
    ) -> Option<Vec<f64>> {
        let mut features = vec![0.0; FEATURE_DIM];

        self.fill_embedding_block(utterance, &mut features);
        if expired(deadline) {
            return None;
        }

        self.fill_morphology_block(utterance, &mut features);
        if expired(deadline) {
            return None;
        }

        self.fill_syntax_block(utterance, &mut features);
        Some(features)
    }

    /// Sentence embedding plus scaled surface counts.
    fn fill_embedding_block(&self, utterance: &Utterance, features: &mut [f64]) {
        let sentence = self.store.embed_sentence(&utterance.tokens);
        features[..sentence.len()].copy_from_slice(&sentence);

        let questions = utterance.raw.chars().filter(|c| *c == '?').count();
        let exclamations = utterance.raw.chars().filter(|c| *c == '!').count();
        let capitalized = utterance
            .raw
            .split_whitespace()
            .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
            .count();

        features[SCALAR_OFFSET] = (utterance.word_count() as f64 / WORD_COUNT_CAP).min(1.0);
        features[SCALAR_OFFSET + 1] = (utterance.char_count() as f64 / CHAR_COUNT_CAP).min(1.0);
        features[SCALAR_OFFSET + 2] = (questions as f64 / HIT_COUNT_CAP).min(1.0);
        features[SCALAR_OFFSET + 3] = (exclamations as f64 / HIT_COUNT_CAP).min(1.0);
        features[SCALAR_OFFSET + 4] = (capitalized as f64 / HIT_COUNT_CAP).min(1.0);
    }

    /// Part-of-speech ratios and binary grammatical tag flags.
    fn fill_morphology_block(&self, utterance: &Utterance, features: &mut [f64]) {
        let word_count = utterance.word_count();
        if word_count == 0 {
            return;
        }

        for morph in &utterance.morphs {
            features[POS_OFFSET + morph.pos.index()] += 1.0;
        }
        for i in 0..PartOfSpeech::COUNT {
            features[POS_OFFSET + i] /= word_count as f64;
        }

        let tag_slots = SYNTAX_OFFSET - TAG_OFFSET;
        for (i, tag) in KNOWN_TAGS.iter().take(tag_slots).enumerate() {
            if utterance.morphs.iter().any(|m| m.has_tag(tag)) {
                features[TAG_OFFSET + i] = 1.0;
            }
        }
    }

    /// Cue-category hits, punctuation counts, hashed character bigrams.
    fn fill_syntax_block(&self, utterance: &Utterance, features: &mut [f64]) {
        for (i, regex) in self.syntax.iter().enumerate() {
            let hits = regex.find_iter(&utterance.normalized).count();
            features[SYNTAX_OFFSET + 2 * i] = if hits > 0 { 1.0 } else { 0.0 };
            features[SYNTAX_OFFSET + 2 * i + 1] = (hits as f64 / HIT_COUNT_CAP).min(1.0);
        }

        // Punctuation is read from the raw text; normalization strips it.
        for (i, mark) in ['?', '!', '.', ',', ':', ';', '"'].iter().enumerate() {
            let count = utterance.raw.chars().filter(|c| c == mark).count();
            features[PUNCT_OFFSET + i] = (count as f64 / HIT_COUNT_CAP).min(1.0);
        }

        let chars: Vec<char> = utterance.normalized.chars().collect();
        for pair in chars.windows(2) {
            if pair[0].is_whitespace() || pair[1].is_whitespace() {
                continue;
            }
            let bigram: String = pair.iter().collect();
            let bucket = (stable_hash(&bigram) % BIGRAM_BUCKETS as u64) as usize;
            features[BIGRAM_OFFSET + bucket] += 1.0;
        }
        let bigram_block = BIGRAM_OFFSET..BIGRAM_OFFSET + BIGRAM_BUCKETS;
        let norm: f64 = features[bigram_block.clone()]
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for f in &mut features[bigram_block] {
                *f /= norm;
            }
        }
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Zero every component whose magnitude is below `threshold`.
///
/// The network's activation threshold hyperparameter is applied to the
/// input vector before the forward pass; a zero threshold is the identity.
pub fn apply_activation_threshold(features: &mut [f64], threshold: f64) {
    if threshold <= 0.0 {
        return;
    }
    for f in features {
        if f.abs() < threshold {
            *f = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MorphologyAnalyzer, TextPreprocessor};
    use crate::embedding::EmbeddingConfig;
    use std::time::Duration;

    fn extractor() -> FeatureExtractor {
        let store = Arc::new(WordEmbeddingStore::new(
            EmbeddingConfig::default(),
            Arc::new(MorphologyAnalyzer::new()),
        ));
        FeatureExtractor::new(store).unwrap()
    }

    fn utterance(text: &str) -> Utterance {
        Utterance::analyze(text, &TextPreprocessor::new(), &MorphologyAnalyzer::new())
    }

    #[test]
    fn test_dimension_is_fixed() {
        let ex = extractor();
        assert_eq!(ex.extract(&utterance("привет")).len(), FEATURE_DIM);
        assert_eq!(ex.extract(&utterance("")).len(), FEATURE_DIM);
    }

    #[test]
    fn test_same_utterance_same_features() {
        let ex = extractor();
        let utt = utterance("поставь цель выучить английский");
        assert_eq!(ex.extract(&utt), ex.extract(&utt));
    }

    #[test]
    fn test_question_marks_count_in_scalars() {
        let ex = extractor();
        let features = ex.extract(&utterance("Почему это работает??"));
        assert_eq!(features[SCALAR_OFFSET + 2], 2.0 / HIT_COUNT_CAP);
        // Question cue category fires as well.
        assert_eq!(features[SYNTAX_OFFSET], 1.0);
    }

    #[test]
    fn test_capitalized_word_count() {
        let ex = extractor();
        let features = ex.extract(&utterance("Привет Мир и all"));
        assert_eq!(features[SCALAR_OFFSET + 4], 2.0 / HIT_COUNT_CAP);
    }

    #[test]
    fn test_statement_sets_imperative_and_goal_cues() {
        let ex = extractor();
        let features = ex.extract(&utterance("поставь цель выучить английский"));
        // Question category stays silent.
        assert_eq!(features[SYNTAX_OFFSET], 0.0);
        // Imperative opener, slot pair 1.
        assert_eq!(features[SYNTAX_OFFSET + 2], 1.0);
        // Goal vocabulary, slot pair 9.
        assert_eq!(features[SYNTAX_OFFSET + 18], 1.0);
    }

    #[test]
    fn test_infinitive_tag_flag_is_binary() {
        let ex = extractor();
        let features = ex.extract(&utterance("хочу выучить английский"));
        let infinitive_slot = TAG_OFFSET
            + KNOWN_TAGS.iter().position(|t| *t == "infinitive").unwrap();
        assert_eq!(features[infinitive_slot], 1.0);
    }

    #[test]
    fn test_pos_ratios_sum_to_one() {
        let ex = extractor();
        let features = ex.extract(&utterance("поставь цель на завтра"));
        let sum: f64 = (0..PartOfSpeech::COUNT)
            .map(|i| features[POS_OFFSET + i])
            .sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bigram_block_is_normalized() {
        let ex = extractor();
        let features = ex.extract(&utterance("привет как дела"));
        let norm: f64 = features[BIGRAM_OFFSET..BIGRAM_OFFSET + BIGRAM_BUCKETS]
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tail_past_bigrams_stays_zero() {
        let ex = extractor();
        let features = ex.extract(&utterance("привет как дела"));
        assert!(
            features[BIGRAM_OFFSET + BIGRAM_BUCKETS..]
                .iter()
                .all(|x| *x == 0.0)
        );
    }

    #[test]
    fn test_expired_deadline_returns_none() {
        let ex = extractor();
        let utt = utterance("привет как дела");
        // A deadline of "now" has always passed by the first check.
        let past = Instant::now();
        assert!(ex.extract_with_deadline(&utt, Some(past)).is_none());
    }

    #[test]
    fn test_generous_deadline_completes() {
        let ex = extractor();
        let utt = utterance("привет как дела");
        let future = Instant::now() + Duration::from_secs(60);
        assert!(ex.extract_with_deadline(&utt, Some(future)).is_some());
    }

    #[test]
    fn test_activation_threshold() {
        let mut v = vec![0.04, -0.04, 0.5, -0.5, 0.0];
        apply_activation_threshold(&mut v, 0.05);
        assert_eq!(v, vec![0.0, 0.0, 0.5, -0.5, 0.0]);

        let mut untouched = vec![0.01, 0.02];
        apply_activation_threshold(&mut untouched, 0.0);
        assert_eq!(untouched, vec![0.01, 0.02]);
    }
}
