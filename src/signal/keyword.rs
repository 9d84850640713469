//! Keyword set signal.

use std::collections::HashSet;

use crate::analysis::Utterance;
use crate::context::ConversationContext;
use crate::intent::Intent;
use crate::signal::{ClassifierSignal, ScoreMap, SignalKind};

/// Score contributed by each keyword hit, saturating at 1.0.
const HIT_WEIGHT: f64 = 0.3;

/// Curated intent keywords, matched against both surface tokens and stems.
const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::Greet,
        &[
            "привет",
            "здравствуйте",
            "добрый",
            "утро",
            "вечер",
            "hello",
            "hi",
            "greetings",
            "morning",
            "welcome",
        ],
    ),
    (
        Intent::AskQuestion,
        &[
            "что",
            "как",
            "почему",
            "зачем",
            "когда",
            "где",
            "кто",
            "сколько",
            "расскажи",
            "дела",
            "what",
            "how",
            "why",
            "when",
            "where",
            "who",
            "tell",
        ],
    ),
    (
        Intent::SetGoal,
        &[
            "цель",
            "цел",
            "поставь",
            "задача",
            "задач",
            "план",
            "хочу",
            "научиться",
            "выучить",
            "достичь",
            "goal",
            "plan",
            "task",
            "achieve",
            "want",
            "learn",
        ],
    ),
    (
        Intent::RequestMemory,
        &[
            "помнишь",
            "помн",
            "память",
            "памяти",
            "вспомни",
            "напомни",
            "забыл",
            "memory",
            "remember",
            "recall",
            "forget",
            "remind",
        ],
    ),
    (
        Intent::TriggerEmotion,
        &[
            "эмоция",
            "эмоци",
            "почувствуй",
            "чувство",
            "радость",
            "грусть",
            "злость",
            "страх",
            "испытай",
            "feel",
            "emotion",
            "joy",
            "sadness",
            "anger",
            "fear",
        ],
    ),
    (
        Intent::Introspect,
        &[
            "состояние",
            "состоян",
            "внутри",
            "себя",
            "чувствуешь",
            "самочувствие",
            "опиши",
            "state",
            "internal",
            "inside",
            "feeling",
            "introspect",
        ],
    ),
    (
        Intent::Reflect,
        &[
            "подумай",
            "поразмышляй",
            "размышление",
            "выводы",
            "вывод",
            "итог",
            "reflect",
            "think",
            "ponder",
            "summarize",
            "conclusion",
        ],
    ),
    (
        Intent::InjectThought,
        &[
            "мысль",
            "мысл",
            "мысли",
            "идея",
            "идеи",
            "идею",
            "thought",
            "idea",
            "consider",
            "inject",
        ],
    ),
    (
        Intent::ModifySelf,
        &[
            "изменись",
            "стань",
            "поменяй",
            "характер",
            "личность",
            "поведение",
            "modify",
            "change",
            "become",
            "personality",
            "yourself",
        ],
    ),
    (
        Intent::ExplainDecision,
        &[
            "объясни",
            "решение",
            "решен",
            "выбор",
            "обоснуй",
            "explain",
            "decision",
            "choice",
            "justify",
            "reasoning",
        ],
    ),
    (
        Intent::ActivateScenario,
        &[
            "запусти",
            "активируй",
            "включи",
            "сценарий",
            "сценар",
            "режим",
            "activate",
            "run",
            "start",
            "scenario",
            "mode",
        ],
    ),
    (
        Intent::UserFeedbackPositive,
        &[
            "хорошо",
            "отлично",
            "молодец",
            "спасибо",
            "супер",
            "класс",
            "верно",
            "правильно",
            "good",
            "great",
            "thanks",
            "excellent",
            "correct",
            "perfect",
        ],
    ),
    (
        Intent::UserFeedbackNegative,
        &[
            "плохо",
            "неверно",
            "неправильно",
            "ошибка",
            "ошибк",
            "ужасно",
            "bad",
            "wrong",
            "incorrect",
            "mistake",
            "terrible",
        ],
    ),
    (
        Intent::Shutdown,
        &[
            "выключись",
            "отключись",
            "заверши",
            "стоп",
            "пока",
            "shutdown",
            "off",
            "goodbye",
            "bye",
            "stop",
        ],
    ),
];

/// Scores intents by counting keyword hits.
///
/// Each hit is worth a fixed weight and scores saturate at 1.0, so two or
/// three topical words already make a strong claim.
#[derive(Debug, Default)]
pub struct KeywordSignal;

impl KeywordSignal {
    pub fn new() -> Self {
        Self
    }
}

impl ClassifierSignal for KeywordSignal {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Keyword
    }

    fn score(&self, utterance: &Utterance, _context: &ConversationContext) -> Option<ScoreMap> {
        let vocabulary: HashSet<&str> = utterance
            .tokens
            .iter()
            .map(String::as_str)
            .chain(utterance.stems.iter().map(String::as_str))
            .collect();
        if vocabulary.is_empty() {
            return None;
        }

        let mut scores = ScoreMap::new();
        for (intent, keywords) in KEYWORD_TABLE {
            let hits = keywords
                .iter()
                .filter(|kw| vocabulary.contains(**kw))
                .count();
            if hits > 0 {
                scores.insert(*intent, (hits as f64 * HIT_WEIGHT).min(1.0));
            }
        }
        if scores.is_empty() { None } else { Some(scores) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MorphologyAnalyzer, TextPreprocessor, Utterance};

    fn utter(text: &str) -> Utterance {
        Utterance::analyze(text, &TextPreprocessor::new(), &MorphologyAnalyzer::new())
    }

    #[test]
    fn test_hit_weight_is_three_tenths() {
        // Two hits score 0.6; the constant is load-bearing for ensemble
        // balance, so pin the value rather than the symbol.
        let signal = KeywordSignal::new();
        let scores = signal
            .score(&utter("привет как дела"), &Default::default())
            .unwrap();
        assert!((scores[&Intent::Greet] - 0.3).abs() < 1e-9);
        assert!((scores[&Intent::AskQuestion] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_single_hit_scores_hit_weight() {
        let signal = KeywordSignal::new();
        let scores = signal
            .score(&utter("расскажи историю"), &Default::default())
            .unwrap();
        assert!((scores[&Intent::AskQuestion] - HIT_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_hits_accumulate() {
        let signal = KeywordSignal::new();
        let scores = signal
            .score(&utter("привет как дела"), &Default::default())
            .unwrap();
        // "как" and "дела" both hit AskQuestion.
        assert!(scores[&Intent::AskQuestion] > scores[&Intent::Greet] - 1e-9);
        assert!((scores[&Intent::Greet] - HIT_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_score_saturates_at_one() {
        let signal = KeywordSignal::new();
        let scores = signal
            .score(
                &utter("что как почему зачем когда где"),
                &Default::default(),
            )
            .unwrap();
        assert!((scores[&Intent::AskQuestion] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stem_matches_count() {
        let signal = KeywordSignal::new();
        // "цели" stems to "цел", a registered keyword.
        let scores = signal
            .score(&utter("мои цели на год"), &Default::default())
            .unwrap();
        assert!(scores.contains_key(&Intent::SetGoal));
    }

    #[test]
    fn test_no_hits_abstains() {
        let signal = KeywordSignal::new();
        assert!(
            signal
                .score(&utter("фиолетовый бегемот"), &Default::default())
                .is_none()
        );
    }
}
