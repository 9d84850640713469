//! Text normalization and tokenization.
//!
//! This module provides the preprocessor that turns raw utterance text into
//! the normalized form every downstream signal sees. Normalization is
//! idempotent: running it over already-normalized text returns the same
//! string, so stored samples can be re-fed through the pipeline safely.
//!
//! # Examples
//!
//! ```
//! use parlance::analysis::preprocess::TextPreprocessor;
//!
//! let pre = TextPreprocessor::new();
//! let normalized = pre.normalize("  Привет,   МИР!! ");
//! assert_eq!(normalized, "привет мир");
//! assert_eq!(pre.normalize(&normalized), normalized);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::lexicon;

/// Normalizes raw text and splits it into word tokens.
///
/// The pipeline applied by [`normalize`](TextPreprocessor::normalize) is:
/// lowercasing, punctuation removal, whitespace collapsing, and token-wise
/// synonym substitution. Tokenization uses Unicode word boundary rules
/// (UAX #29), so Cyrillic and Latin text split identically well.
#[derive(Clone, Debug, Default)]
pub struct TextPreprocessor;

impl TextPreprocessor {
    /// Create a new preprocessor.
    pub fn new() -> Self {
        TextPreprocessor
    }

    /// Produce the canonical form of `text`.
    ///
    /// Guaranteed idempotent: `normalize(normalize(t)) == normalize(t)`.
    pub fn normalize(&self, text: &str) -> String {
        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_alphanumeric() || c.is_whitespace() {
                for lc in c.to_lowercase() {
                    cleaned.push(lc);
                }
            } else if c == '\'' || c == '\u{2019}' {
                // Drop apostrophes without splitting: "don't" becomes "dont".
            } else {
                cleaned.push(' ');
            }
        }

        let mut out = String::with_capacity(cleaned.len());
        for token in cleaned.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(lexicon::canonical_form(token));
        }
        out
    }

    /// Split normalized text on Unicode word boundaries.
    pub fn tokenize(&self, normalized: &str) -> Vec<String> {
        normalized
            .unicode_words()
            .map(|w| w.to_string())
            .collect()
    }

    /// Normalize and tokenize in one pass.
    pub fn process(&self, text: &str) -> (String, Vec<String>) {
        let normalized = self.normalize(text);
        let tokens = self.tokenize(&normalized);
        (normalized, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_punctuation() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.normalize("Hello, World!"), "hello world");
        assert_eq!(pre.normalize("ПОСТАВЬ ЦЕЛЬ:"), "поставь цель");
    }

    #[test]
    fn test_whitespace_collapse() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.normalize("  a \t b\n\nc  "), "a b c");
    }

    #[test]
    fn test_synonym_substitution() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.normalize("Здравствуйте!"), "привет");
        assert_eq!(pre.normalize("hi there"), "hello there");
    }

    #[test]
    fn test_apostrophes_join_contractions() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.normalize("don't stop"), "dont stop");
        assert_eq!(pre.normalize("don\u{2019}t stop"), "dont stop");
    }

    #[test]
    fn test_idempotent() {
        let pre = TextPreprocessor::new();
        for text in [
            "Привет, как дела?",
            "  Set   a GOAL: learn Rust!  ",
            "Здравствуйте!!! hi,hi",
            "",
            "уже нормальный текст",
        ] {
            let once = pre.normalize(text);
            let twice = pre.normalize(&once);
            assert_eq!(once, twice, "normalize must be idempotent for {text:?}");
        }
    }

    #[test]
    fn test_tokenize_bilingual() {
        let pre = TextPreprocessor::new();
        let (normalized, tokens) = pre.process("Привет, как дела? ok");
        assert_eq!(normalized, "привет как дела хорошо");
        assert_eq!(tokens, vec!["привет", "как", "дела", "хорошо"]);
    }

    #[test]
    fn test_empty_input() {
        let pre = TextPreprocessor::new();
        let (normalized, tokens) = pre.process("   \t  ");
        assert_eq!(normalized, "");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_digits_survive() {
        let pre = TextPreprocessor::new();
        assert_eq!(pre.normalize("wake me at 7:30"), "wake me at 7 30");
    }
}
