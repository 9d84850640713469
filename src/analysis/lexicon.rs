//! Built-in Russian and English word lists.
//!
//! This module provides the static lexicons the rest of the pipeline draws
//! from: stop words, sentiment polarity words, negators, and the synonym
//! substitution table used during preprocessing. All sets are built lazily
//! on first use and shared for the lifetime of the process.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::intent::Sentiment;

/// Common Russian words filtered out before learned scoring.
const RUSSIAN_STOP_WORDS: &[&str] = &[
    "а", "бы", "в", "во", "вот", "да", "для", "до", "же", "за", "и", "из", "к", "как", "ли", "мне",
    "мы", "на", "но", "ну", "о", "об", "он", "она", "они", "оно", "от", "по", "при", "с", "со",
    "так", "также", "там", "то", "тут", "ты", "у", "уже", "это", "этот", "я",
];

/// Common English words filtered out before learned scoring.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "me", "my", "of", "on", "or", "so", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "we", "will", "with", "you", "your",
];

/// Words carrying positive sentiment.
const POSITIVE_WORDS: &[&str] = &[
    // Russian
    "хорошо",
    "отлично",
    "прекрасно",
    "замечательно",
    "супер",
    "класс",
    "здорово",
    "молодец",
    "умница",
    "спасибо",
    "благодарю",
    "нравится",
    "люблю",
    "рад",
    "рада",
    "круто",
    "верно",
    "правильно",
    "полезно",
    // English
    "good",
    "great",
    "excellent",
    "wonderful",
    "awesome",
    "nice",
    "perfect",
    "thanks",
    "thank",
    "love",
    "like",
    "helpful",
    "correct",
    "right",
    "amazing",
    "brilliant",
    "well",
];

/// Words carrying negative sentiment.
const NEGATIVE_WORDS: &[&str] = &[
    // Russian
    "плохо",
    "ужасно",
    "отвратительно",
    "неверно",
    "неправильно",
    "ошибка",
    "ошибся",
    "ошиблась",
    "глупо",
    "бесполезно",
    "ненавижу",
    "раздражает",
    "злюсь",
    "грустно",
    "обидно",
    "хуже",
    "провал",
    // English
    "bad",
    "terrible",
    "awful",
    "horrible",
    "wrong",
    "incorrect",
    "mistake",
    "error",
    "stupid",
    "useless",
    "hate",
    "annoying",
    "angry",
    "sad",
    "worse",
    "failure",
    "broken",
];

/// Words that invert the polarity of a following sentiment word.
const NEGATOR_WORDS: &[&str] = &[
    "не", "нет", "ни", "никогда", "нельзя", "без", "not", "no", "never", "dont", "don't", "isnt",
    "isn't", "cant", "can't", "without",
];

/// Token-level substitutions applied during normalization.
///
/// Keys map informal or regional variants to a canonical form. No value in
/// this table ever appears as a key, so applying the substitution twice
/// yields the same text as applying it once.
const SYNONYM_PAIRS: &[(&str, &str)] = &[
    // Russian
    ("здравствуй", "привет"),
    ("здравствуйте", "привет"),
    ("приветик", "привет"),
    ("хай", "привет"),
    ("здорова", "привет"),
    ("спс", "спасибо"),
    ("пасиб", "спасибо"),
    ("плз", "пожалуйста"),
    ("пж", "пожалуйста"),
    ("норм", "нормально"),
    ("ок", "хорошо"),
    ("окей", "хорошо"),
    ("ok", "хорошо"),
    ("okay", "хорошо"),
    ("чо", "что"),
    ("че", "что"),
    ("щас", "сейчас"),
    // English
    ("hi", "hello"),
    ("hey", "hello"),
    ("yo", "hello"),
    ("howdy", "hello"),
    ("thx", "thanks"),
    ("ty", "thanks"),
    ("pls", "please"),
    ("plz", "please"),
    ("u", "you"),
    ("ur", "your"),
    ("gonna", "going"),
    ("wanna", "want"),
    ("gotta", "got"),
];

/// Combined Russian and English stop words as a HashSet.
pub static STOP_WORDS_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    RUSSIAN_STOP_WORDS
        .iter()
        .chain(ENGLISH_STOP_WORDS.iter())
        .copied()
        .collect()
});

/// Positive sentiment words as a HashSet.
pub static POSITIVE_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| POSITIVE_WORDS.iter().copied().collect());

/// Negative sentiment words as a HashSet.
pub static NEGATIVE_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| NEGATIVE_WORDS.iter().copied().collect());

/// Negator words as a HashSet.
pub static NEGATOR_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| NEGATOR_WORDS.iter().copied().collect());

/// Synonym substitution table as a HashMap.
pub static SYNONYM_TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SYNONYM_PAIRS.iter().copied().collect());

/// Check if a word is a stop word in either language.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS_SET.contains(word)
}

/// Resolve a token to its canonical form, or return it unchanged.
pub fn canonical_form(token: &str) -> &str {
    SYNONYM_TABLE.get(token).copied().unwrap_or(token)
}

/// Number of negator positions scanned before a sentiment word.
const NEGATION_LOOKBEHIND: usize = 2;

/// Score the overall sentiment of a token sequence.
///
/// Each positive word contributes `+1` and each negative word `-1`. A
/// negator within [`NEGATION_LOOKBEHIND`] tokens before a sentiment word
/// flips its contribution. The sign of the total decides the label.
pub fn score_sentiment<S: AsRef<str>>(tokens: &[S]) -> Sentiment {
    let mut score: i64 = 0;

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let polarity = if POSITIVE_WORDS_SET.contains(token) {
            1
        } else if NEGATIVE_WORDS_SET.contains(token) {
            -1
        } else {
            continue;
        };

        let negated = tokens[i.saturating_sub(NEGATION_LOOKBEHIND)..i]
            .iter()
            .any(|t| NEGATOR_WORDS_SET.contains(t.as_ref()));

        score += if negated { -polarity } else { polarity };
    }

    match score.cmp(&0) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stop_words_cover_both_languages() {
        assert!(is_stop_word("и"));
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("цель"));
        assert!(!is_stop_word("goal"));
    }

    #[test]
    fn test_positive_sentiment() {
        assert_eq!(score_sentiment(&toks("это отлично спасибо")), Sentiment::Positive);
        assert_eq!(score_sentiment(&toks("great answer thanks")), Sentiment::Positive);
    }

    #[test]
    fn test_negative_sentiment() {
        assert_eq!(score_sentiment(&toks("это ужасно")), Sentiment::Negative);
        assert_eq!(score_sentiment(&toks("that was a terrible mistake")), Sentiment::Negative);
    }

    #[test]
    fn test_neutral_when_no_polarity_words() {
        assert_eq!(score_sentiment(&toks("поставь цель на завтра")), Sentiment::Neutral);
        assert_eq!(score_sentiment(&toks("")), Sentiment::Neutral);
    }

    #[test]
    fn test_negator_flips_polarity() {
        assert_eq!(score_sentiment(&toks("это не хорошо")), Sentiment::Negative);
        assert_eq!(score_sentiment(&toks("not bad")), Sentiment::Positive);
        // Outside the lookbehind window the negator has no effect.
        assert_eq!(
            score_sentiment(&toks("не думаю что это хорошо")),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_mixed_sentiment_balances_to_neutral() {
        assert_eq!(score_sentiment(&toks("good but terrible")), Sentiment::Neutral);
    }

    #[test]
    fn test_synonym_table_is_idempotent() {
        for value in SYNONYM_TABLE.values() {
            assert!(
                !SYNONYM_TABLE.contains_key(value),
                "canonical form {value:?} must not be a substitution key"
            );
        }
    }

    #[test]
    fn test_canonical_form_lookup() {
        assert_eq!(canonical_form("здравствуйте"), "привет");
        assert_eq!(canonical_form("hi"), "hello");
        assert_eq!(canonical_form("ok"), "хорошо");
        assert_eq!(canonical_form("ок"), "хорошо");
        assert_eq!(canonical_form("привет"), "привет");
        assert_eq!(canonical_form("rust"), "rust");
    }
}
