//! Deterministic word and sentence embeddings.
//!
//! Vectors are not learned from a corpus: each word's embedding is drawn
//! from an RNG seeded by a stable hash of the word itself, then nudged on a
//! few dimensions per morphological tag so that grammatically similar words
//! end up measurably closer. The same word therefore always produces the
//! same vector, across runs and across machines, which keeps prototype
//! similarities reproducible.

use std::sync::Arc;

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::MorphologyAnalyzer;

/// Configuration for the embedding store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Dimensionality of every word and sentence vector.
    pub dimension: usize,
    /// Amount added to each biased dimension per morphological tag.
    pub tag_bias: f64,
    /// Number of dimensions biased per tag.
    pub tag_bias_dims: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            dimension: 300,
            tag_bias: 0.1,
            tag_bias_dims: 10,
        }
    }
}

/// FNV-1a over the bytes of `text`, used to seed per-word RNGs.
pub(crate) fn stable_hash(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Hash-seeded embedding store with a concurrent cache.
///
/// Word vectors are computed on first use and cached for the lifetime of
/// the store. The store is shared behind an [`Arc`] by the semantic signal
/// and the feature extractor.
pub struct WordEmbeddingStore {
    config: EmbeddingConfig,
    morphology: Arc<MorphologyAnalyzer>,
    cache: DashMap<String, Arc<Vec<f64>>>,
}

impl std::fmt::Debug for WordEmbeddingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordEmbeddingStore")
            .field("dimension", &self.config.dimension)
            .field("cached_words", &self.cache.len())
            .finish()
    }
}

impl WordEmbeddingStore {
    /// Create a new store.
    pub fn new(config: EmbeddingConfig, morphology: Arc<MorphologyAnalyzer>) -> Self {
        WordEmbeddingStore {
            config,
            morphology,
            cache: DashMap::new(),
        }
    }

    /// Vector dimensionality.
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Number of word vectors computed so far.
    pub fn cached_words(&self) -> usize {
        self.cache.len()
    }

    /// Embedding for a single word, computed on first use.
    pub fn embed_word(&self, word: &str) -> Arc<Vec<f64>> {
        if let Some(cached) = self.cache.get(word) {
            return Arc::clone(&cached);
        }

        let vector = Arc::new(self.compute_word_vector(word));
        self.cache.insert(word.to_string(), Arc::clone(&vector));
        vector
    }

    /// Sentence embedding: mean of word vectors weighted by word length.
    ///
    /// Longer words tend to carry more content in both Russian and English,
    /// so each word's weight is its character count. Empty input yields the
    /// zero vector.
    pub fn embed_sentence<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f64> {
        let mut sentence = vec![0.0; self.config.dimension];
        let mut total_weight = 0.0;

        for token in tokens {
            let token = token.as_ref();
            let weight = token.chars().count() as f64;
            if weight == 0.0 {
                continue;
            }
            let word_vec = self.embed_word(token);
            for (s, w) in sentence.iter_mut().zip(word_vec.iter()) {
                *s += w * weight;
            }
            total_weight += weight;
        }

        if total_weight > 0.0 {
            for s in &mut sentence {
                *s /= total_weight;
            }
        }
        sentence
    }

    /// Snapshot of the word-vector cache, for model export.
    pub fn export_cache(&self) -> Vec<(String, Vec<f64>)> {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().as_ref().clone()))
            .collect()
    }

    /// Preload word vectors, dropping entries of the wrong dimension.
    ///
    /// Returns how many entries were accepted.
    pub fn import_cache<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let mut loaded = 0;
        for (word, vector) in entries {
            if vector.len() == self.config.dimension {
                self.cache.insert(word, Arc::new(vector));
                loaded += 1;
            } else {
                log::warn!(
                    "dropping imported vector for {word:?}: dimension {} != {}",
                    vector.len(),
                    self.config.dimension
                );
            }
        }
        loaded
    }

    fn compute_word_vector(&self, word: &str) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(stable_hash(word));
        let mut vector: Vec<f64> = (0..self.config.dimension)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect();

        // Nudge a deterministic set of dimensions per grammatical tag so
        // words sharing a tag share a direction component.
        let info = self.morphology.analyze(word);
        for tag in &info.tags {
            let tag_seed = stable_hash(tag);
            for k in 0..self.config.tag_bias_dims {
                let idx = tag_seed
                    .wrapping_add((k as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
                    % self.config.dimension as u64;
                vector[idx as usize] += self.config.tag_bias;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WordEmbeddingStore {
        WordEmbeddingStore::new(EmbeddingConfig::default(), Arc::new(MorphologyAnalyzer::new()))
    }

    #[test]
    fn test_same_word_same_vector() {
        let store = store();
        let a = store.embed_word("привет");
        let b = store.embed_word("привет");
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_different_words_differ() {
        let store = store();
        let a = store.embed_word("привет");
        let b = store.embed_word("пока");
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_deterministic_across_stores() {
        let a = store().embed_word("goal");
        let b = store().embed_word("goal");
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_dimension() {
        let store = store();
        assert_eq!(store.embed_word("word").len(), 300);
        assert_eq!(store.embed_sentence(&["a", "b"]).len(), 300);
    }

    #[test]
    fn test_empty_sentence_is_zero_vector() {
        let store = store();
        let v = store.embed_sentence::<&str>(&[]);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_cache_round_trip() {
        let source = store();
        source.embed_word("привет");
        source.embed_word("цель");

        let target = store();
        assert_eq!(target.import_cache(source.export_cache()), 2);
        assert_eq!(target.cached_words(), 2);
        assert_eq!(*target.embed_word("привет"), *source.embed_word("привет"));
    }

    #[test]
    fn test_import_rejects_wrong_dimension() {
        let target = store();
        let accepted = target.import_cache(vec![("x".to_string(), vec![1.0, 2.0])]);
        assert_eq!(accepted, 0);
        assert_eq!(target.cached_words(), 0);
    }

    #[test]
    fn test_sentence_weighting_favors_longer_words() {
        let store = store();
        let long_word = store.embed_word("программирование");
        let sentence = store.embed_sentence(&["и", "программирование"]);
        // The 16-char word dominates the 1-char conjunction.
        let mut dot = 0.0;
        let mut mag_a = 0.0;
        let mut mag_b = 0.0;
        for (a, b) in sentence.iter().zip(long_word.iter()) {
            dot += a * b;
            mag_a += a * a;
            mag_b += b * b;
        }
        let cos = dot / (mag_a.sqrt() * mag_b.sqrt());
        assert!(cos > 0.9, "expected dominance, cosine was {cos}");
    }

    #[test]
    fn test_cache_fills() {
        let store = store();
        store.embed_sentence(&["один", "два", "три"]);
        assert_eq!(store.cached_words(), 3);
        store.embed_word("один");
        assert_eq!(store.cached_words(), 3);
    }

    #[test]
    fn test_tagged_words_bias_full_dimension_walk() {
        let store = store();
        // "учиться" carries two tags, so the bias walk covers every step
        // of the stride multiplication, including the wrapping ones.
        let a = store.embed_word("учиться");
        let b = store.embed_word("выучить");
        assert_eq!(a.len(), 300);
        assert_eq!(b.len(), 300);
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_values_are_bounded() {
        let store = store();
        let v = store.embed_word("bounded");
        // Raw draws are in [-1, 1); tag bias can push a few dims slightly out.
        assert!(v.iter().all(|x| x.abs() < 1.0 + 0.1 * 16.0));
    }
}
