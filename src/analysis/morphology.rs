//! Rule-based morphological analysis for Russian and English.
//!
//! This module provides a lightweight analyzer that assigns each token a
//! part of speech, a stem, and a set of grammatical tags. It is built from
//! a function-word table plus ordered suffix rules per script, which is
//! deliberately rough: the goal is stable signals for scoring and feature
//! extraction, not linguistic completeness. All length checks count chars,
//! not bytes, so Cyrillic input is handled the same as Latin.

use dashmap::DashMap;

/// Coarse part-of-speech classes emitted by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Particle,
    Numeral,
    Other,
}

impl PartOfSpeech {
    /// All classes in a fixed order.
    pub const ALL: [PartOfSpeech; 10] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Particle,
        PartOfSpeech::Numeral,
        PartOfSpeech::Other,
    ];

    /// Number of classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable position of this class within [`ALL`](Self::ALL).
    pub fn index(self) -> usize {
        match self {
            PartOfSpeech::Noun => 0,
            PartOfSpeech::Verb => 1,
            PartOfSpeech::Adjective => 2,
            PartOfSpeech::Adverb => 3,
            PartOfSpeech::Pronoun => 4,
            PartOfSpeech::Preposition => 5,
            PartOfSpeech::Conjunction => 6,
            PartOfSpeech::Particle => 7,
            PartOfSpeech::Numeral => 8,
            PartOfSpeech::Other => 9,
        }
    }

    /// Stable name, used in the model interchange format.
    pub fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::Other => "other",
        }
    }

    /// Parse a stable name back into a class.
    pub fn parse(name: &str) -> Option<PartOfSpeech> {
        Self::ALL.into_iter().find(|pos| pos.as_str() == name)
    }
}

/// Analysis result for a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphInfo {
    /// Stem after suffix removal, never shorter than [`MIN_STEM_CHARS`].
    pub stem: String,
    /// Coarse part of speech.
    pub pos: PartOfSpeech,
    /// Grammatical tags drawn from [`KNOWN_TAGS`].
    pub tags: Vec<&'static str>,
}

impl MorphInfo {
    fn new(stem: String, pos: PartOfSpeech) -> Self {
        MorphInfo {
            stem,
            pos,
            tags: Vec::new(),
        }
    }

    fn with_tags(mut self, tags: &[&'static str]) -> Self {
        self.tags.extend_from_slice(tags);
        self
    }

    /// Whether the token carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

/// Every tag the analyzer can emit, in a fixed order.
///
/// Feature extraction maps each tag to a vector slot by its position here,
/// so entries must only ever be appended.
pub const KNOWN_TAGS: &[&str] = &[
    "infinitive",
    "reflexive",
    "imperative",
    "present",
    "past",
    "plural",
    "feminine",
    "neuter",
    "gerund",
    "comparative",
    "superlative",
    "question",
    "numeric",
    "genitive",
    "instrumental",
    "prepositional",
];

/// Suffixes shorter than this never strip below the minimum stem.
const MIN_STEM_CHARS: usize = 3;

/// One suffix rule: matched suffix, assigned class, emitted tags.
struct SuffixRule {
    suffix: &'static str,
    pos: PartOfSpeech,
    tags: &'static [&'static str],
}

const fn rule(
    suffix: &'static str,
    pos: PartOfSpeech,
    tags: &'static [&'static str],
) -> SuffixRule {
    SuffixRule { suffix, pos, tags }
}

/// Russian suffix rules, longest first. The first match wins.
const RUSSIAN_RULES: &[SuffixRule] = &[
    rule("йтесь", PartOfSpeech::Verb, &["imperative", "plural", "reflexive"]),
    rule("ться", PartOfSpeech::Verb, &["infinitive", "reflexive"]),
    rule("ский", PartOfSpeech::Adjective, &[]),
    rule("ская", PartOfSpeech::Adjective, &["feminine"]),
    rule("ское", PartOfSpeech::Adjective, &["neuter"]),
    rule("ами", PartOfSpeech::Noun, &["plural", "instrumental"]),
    rule("ями", PartOfSpeech::Noun, &["plural", "instrumental"]),
    rule("йте", PartOfSpeech::Verb, &["imperative", "plural"]),
    rule("ьте", PartOfSpeech::Verb, &["imperative", "plural"]),
    rule("ите", PartOfSpeech::Verb, &["imperative", "plural"]),
    rule("ить", PartOfSpeech::Verb, &["infinitive"]),
    rule("ать", PartOfSpeech::Verb, &["infinitive"]),
    rule("ять", PartOfSpeech::Verb, &["infinitive"]),
    rule("еть", PartOfSpeech::Verb, &["infinitive"]),
    rule("уть", PartOfSpeech::Verb, &["infinitive"]),
    rule("ала", PartOfSpeech::Verb, &["past", "feminine"]),
    rule("или", PartOfSpeech::Verb, &["past", "plural"]),
    rule("али", PartOfSpeech::Verb, &["past", "plural"]),
    rule("ила", PartOfSpeech::Verb, &["past", "feminine"]),
    rule("ает", PartOfSpeech::Verb, &["present"]),
    rule("ешь", PartOfSpeech::Verb, &["present"]),
    rule("ный", PartOfSpeech::Adjective, &[]),
    rule("ная", PartOfSpeech::Adjective, &["feminine"]),
    rule("ное", PartOfSpeech::Adjective, &["neuter"]),
    rule("ные", PartOfSpeech::Adjective, &["plural"]),
    rule("ах", PartOfSpeech::Noun, &["plural", "prepositional"]),
    rule("ов", PartOfSpeech::Noun, &["plural", "genitive"]),
    rule("ал", PartOfSpeech::Verb, &["past"]),
    rule("ил", PartOfSpeech::Verb, &["past"]),
    rule("ет", PartOfSpeech::Verb, &["present"]),
    rule("ый", PartOfSpeech::Adjective, &[]),
    rule("ий", PartOfSpeech::Adjective, &[]),
    rule("ая", PartOfSpeech::Adjective, &["feminine"]),
    rule("ое", PartOfSpeech::Adjective, &["neuter"]),
    rule("ие", PartOfSpeech::Adjective, &["plural"]),
    rule("ть", PartOfSpeech::Verb, &["infinitive"]),
    rule("и", PartOfSpeech::Noun, &["plural"]),
    rule("ы", PartOfSpeech::Noun, &["plural"]),
];

/// English suffix rules, longest first. The first match wins.
const ENGLISH_RULES: &[SuffixRule] = &[
    rule("iest", PartOfSpeech::Adjective, &["superlative"]),
    rule("tion", PartOfSpeech::Noun, &[]),
    rule("sion", PartOfSpeech::Noun, &[]),
    rule("ment", PartOfSpeech::Noun, &[]),
    rule("ness", PartOfSpeech::Noun, &[]),
    rule("able", PartOfSpeech::Adjective, &[]),
    rule("ible", PartOfSpeech::Adjective, &[]),
    rule("ing", PartOfSpeech::Verb, &["gerund"]),
    rule("est", PartOfSpeech::Adjective, &["superlative"]),
    rule("ful", PartOfSpeech::Adjective, &[]),
    rule("ous", PartOfSpeech::Adjective, &[]),
    rule("ive", PartOfSpeech::Adjective, &[]),
    rule("ity", PartOfSpeech::Noun, &[]),
    rule("ed", PartOfSpeech::Verb, &["past"]),
    rule("ly", PartOfSpeech::Adverb, &[]),
    rule("er", PartOfSpeech::Adjective, &["comparative"]),
    rule("es", PartOfSpeech::Noun, &["plural"]),
    rule("s", PartOfSpeech::Noun, &["plural"]),
];

/// Closed-class words looked up before any suffix rule.
const FUNCTION_WORDS: &[(&str, PartOfSpeech, &[&str])] = &[
    // Russian pronouns
    ("я", PartOfSpeech::Pronoun, &[]),
    ("ты", PartOfSpeech::Pronoun, &[]),
    ("мы", PartOfSpeech::Pronoun, &[]),
    ("вы", PartOfSpeech::Pronoun, &[]),
    ("он", PartOfSpeech::Pronoun, &[]),
    ("она", PartOfSpeech::Pronoun, &["feminine"]),
    ("оно", PartOfSpeech::Pronoun, &["neuter"]),
    ("они", PartOfSpeech::Pronoun, &["plural"]),
    ("мне", PartOfSpeech::Pronoun, &[]),
    ("тебя", PartOfSpeech::Pronoun, &[]),
    ("себя", PartOfSpeech::Pronoun, &["reflexive"]),
    // Russian interrogatives
    ("кто", PartOfSpeech::Pronoun, &["question"]),
    ("что", PartOfSpeech::Pronoun, &["question"]),
    ("как", PartOfSpeech::Pronoun, &["question"]),
    ("почему", PartOfSpeech::Pronoun, &["question"]),
    ("зачем", PartOfSpeech::Pronoun, &["question"]),
    ("когда", PartOfSpeech::Pronoun, &["question"]),
    ("где", PartOfSpeech::Pronoun, &["question"]),
    ("куда", PartOfSpeech::Pronoun, &["question"]),
    ("какой", PartOfSpeech::Pronoun, &["question"]),
    ("сколько", PartOfSpeech::Pronoun, &["question"]),
    // Russian prepositions
    ("в", PartOfSpeech::Preposition, &[]),
    ("на", PartOfSpeech::Preposition, &[]),
    ("с", PartOfSpeech::Preposition, &[]),
    ("к", PartOfSpeech::Preposition, &[]),
    ("от", PartOfSpeech::Preposition, &[]),
    ("до", PartOfSpeech::Preposition, &[]),
    ("по", PartOfSpeech::Preposition, &[]),
    ("за", PartOfSpeech::Preposition, &[]),
    ("под", PartOfSpeech::Preposition, &[]),
    ("при", PartOfSpeech::Preposition, &[]),
    ("без", PartOfSpeech::Preposition, &[]),
    ("для", PartOfSpeech::Preposition, &[]),
    ("про", PartOfSpeech::Preposition, &[]),
    ("через", PartOfSpeech::Preposition, &[]),
    // Russian conjunctions and particles
    ("и", PartOfSpeech::Conjunction, &[]),
    ("а", PartOfSpeech::Conjunction, &[]),
    ("но", PartOfSpeech::Conjunction, &[]),
    ("или", PartOfSpeech::Conjunction, &[]),
    ("чтобы", PartOfSpeech::Conjunction, &[]),
    ("если", PartOfSpeech::Conjunction, &[]),
    ("не", PartOfSpeech::Particle, &[]),
    ("ни", PartOfSpeech::Particle, &[]),
    ("же", PartOfSpeech::Particle, &[]),
    ("ли", PartOfSpeech::Particle, &["question"]),
    ("бы", PartOfSpeech::Particle, &[]),
    ("вот", PartOfSpeech::Particle, &[]),
    // English pronouns
    ("i", PartOfSpeech::Pronoun, &[]),
    ("you", PartOfSpeech::Pronoun, &[]),
    ("he", PartOfSpeech::Pronoun, &[]),
    ("she", PartOfSpeech::Pronoun, &["feminine"]),
    ("it", PartOfSpeech::Pronoun, &["neuter"]),
    ("we", PartOfSpeech::Pronoun, &["plural"]),
    ("they", PartOfSpeech::Pronoun, &["plural"]),
    ("me", PartOfSpeech::Pronoun, &[]),
    ("them", PartOfSpeech::Pronoun, &["plural"]),
    ("yourself", PartOfSpeech::Pronoun, &["reflexive"]),
    // English interrogatives
    ("who", PartOfSpeech::Pronoun, &["question"]),
    ("what", PartOfSpeech::Pronoun, &["question"]),
    ("how", PartOfSpeech::Pronoun, &["question"]),
    ("why", PartOfSpeech::Pronoun, &["question"]),
    ("when", PartOfSpeech::Pronoun, &["question"]),
    ("where", PartOfSpeech::Pronoun, &["question"]),
    ("which", PartOfSpeech::Pronoun, &["question"]),
    // English prepositions
    ("in", PartOfSpeech::Preposition, &[]),
    ("on", PartOfSpeech::Preposition, &[]),
    ("at", PartOfSpeech::Preposition, &[]),
    ("by", PartOfSpeech::Preposition, &[]),
    ("for", PartOfSpeech::Preposition, &[]),
    ("with", PartOfSpeech::Preposition, &[]),
    ("from", PartOfSpeech::Preposition, &[]),
    ("to", PartOfSpeech::Preposition, &[]),
    ("of", PartOfSpeech::Preposition, &[]),
    ("about", PartOfSpeech::Preposition, &[]),
    // English conjunctions and particles
    ("and", PartOfSpeech::Conjunction, &[]),
    ("or", PartOfSpeech::Conjunction, &[]),
    ("but", PartOfSpeech::Conjunction, &[]),
    ("because", PartOfSpeech::Conjunction, &[]),
    ("not", PartOfSpeech::Particle, &[]),
    ("no", PartOfSpeech::Particle, &[]),
];

/// Rule-based analyzer with a per-process result cache.
///
/// Analysis of a given token always produces the same result, so results
/// are cached in a concurrent map and shared across threads.
#[derive(Debug, Default)]
pub struct MorphologyAnalyzer {
    cache: DashMap<String, MorphInfo>,
}

impl MorphologyAnalyzer {
    /// Create a new analyzer with an empty cache.
    pub fn new() -> Self {
        MorphologyAnalyzer {
            cache: DashMap::new(),
        }
    }

    /// Analyze a single normalized token.
    pub fn analyze(&self, token: &str) -> MorphInfo {
        if let Some(cached) = self.cache.get(token) {
            return cached.clone();
        }

        let info = self.analyze_uncached(token);
        self.cache.insert(token.to_string(), info.clone());
        info
    }

    /// Convenience accessor for just the stem.
    pub fn stem(&self, token: &str) -> String {
        self.analyze(token).stem
    }

    /// Number of distinct tokens analyzed so far.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn analyze_uncached(&self, token: &str) -> MorphInfo {
        if token.is_empty() {
            return MorphInfo::new(String::new(), PartOfSpeech::Other);
        }

        for (word, pos, tags) in FUNCTION_WORDS {
            if *word == token {
                return MorphInfo::new(token.to_string(), *pos).with_tags(tags);
            }
        }

        if token.chars().all(|c| c.is_numeric()) {
            return MorphInfo::new(token.to_string(), PartOfSpeech::Numeral)
                .with_tags(&["numeric"]);
        }

        let rules = if is_cyrillic(token) {
            RUSSIAN_RULES
        } else {
            ENGLISH_RULES
        };

        let char_count = token.chars().count();
        for rule in rules {
            let suffix_chars = rule.suffix.chars().count();
            if char_count >= suffix_chars + MIN_STEM_CHARS && token.ends_with(rule.suffix) {
                let stem = token[..token.len() - rule.suffix.len()].to_string();
                return MorphInfo::new(stem, rule.pos).with_tags(rule.tags);
            }
        }

        MorphInfo::new(token.to_string(), PartOfSpeech::Noun)
    }
}

/// Whether the token contains any Cyrillic characters.
fn is_cyrillic(token: &str) -> bool {
    token.chars().any(|c| matches!(c, '\u{0400}'..='\u{04FF}'))
}
