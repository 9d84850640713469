//! Structured argument extraction for classified intents.
//!
//! Once the ensemble has picked a winner, this module mines the utterance
//! for the fields that intent's consumers care about: goal priorities,
//! emotion hints, memory timeframes, and so on. Dictionary lookups run
//! over normalized tokens; entity patterns run over the raw text, since
//! normalization destroys emails, URLs, and clock times.

use std::collections::HashMap;

use regex::Regex;

use crate::analysis::{PartOfSpeech, Utterance};
use crate::error::{ParlanceError, Result};
use crate::intent::Intent;
use crate::signal::PatternCapture;

/// One dictionary entry: the value to emit and the token prefixes that
/// trigger it.
struct KeywordRule {
    value: &'static str,
    triggers: &'static [&'static str],
}

const fn kw(value: &'static str, triggers: &'static [&'static str]) -> KeywordRule {
    KeywordRule { value, triggers }
}

const QUESTION_TYPES: &[KeywordRule] = &[
    kw("why", &["почему", "зачем", "why"]),
    kw("when", &["когда", "when"]),
    kw("where", &["где", "куда", "where"]),
    kw("who", &["кто", "who"]),
    kw("how_many", &["сколько", "how many", "how much"]),
    kw("what", &["что", "какой", "какая", "какие", "what", "which"]),
    kw("how", &["как", "how"]),
];

const GOAL_PRIORITIES: &[KeywordRule] = &[
    kw(
        "high",
        &["срочно", "важн", "критичн", "обязательно", "urgent", "important", "critical"],
    ),
    kw(
        "low",
        &["потом", "когда нибудь", "неважн", "later", "someday", "eventually"],
    ),
];

const GOAL_TIMEFRAMES: &[KeywordRule] = &[
    kw("today", &["сегодня", "today"]),
    kw("tomorrow", &["завтра", "tomorrow"]),
    kw("week", &["недел", "week"]),
    kw("month", &["месяц", "month"]),
    kw("year", &["год", "year"]),
];

const EMOTION_TYPES: &[KeywordRule] = &[
    kw("joy", &["радост", "счаст", "весел", "joy", "happ", "glad"]),
    kw("sadness", &["груст", "печал", "sad", "sorrow"]),
    kw("anger", &["злост", "гнев", "anger", "angry", "rage"]),
    kw("fear", &["страх", "боюсь", "fear", "afraid", "scared"]),
    kw("surprise", &["удивлен", "surprise", "amazed"]),
    kw("interest", &["интерес", "любопыт", "interest", "curious"]),
    kw("calm", &["споко", "calm", "peace"]),
];

const EMOTION_INTENSITIES: &[KeywordRule] = &[
    kw("high", &["очень", "сильн", "very", "strong", "intense"]),
    kw("low", &["немного", "слегка", "чуть", "slight", "a bit", "little"]),
];

const MEMORY_TYPES: &[KeywordRule] = &[
    kw(
        "conversation",
        &["разговор", "бесед", "диалог", "conversation", "chat", "talk"],
    ),
    kw("goal", &["цел", "задач", "goal", "task"]),
    kw("event", &["событи", "встреч", "event", "meeting"]),
    kw("fact", &["факт", "fact"]),
];

const MEMORY_TIMEFRAMES: &[KeywordRule] = &[
    kw("yesterday", &["вчера", "yesterday"]),
    kw("today", &["сегодня", "today"]),
    kw("week", &["недел", "week"]),
    kw("month", &["месяц", "month"]),
];

const FEEDBACK_ASPECTS: &[KeywordRule] = &[
    kw("answer", &["ответ", "answer", "response"]),
    kw("behavior", &["поведени", "behavior", "behaviour"]),
    kw("speed", &["скорост", "быстр", "медлен", "speed", "fast", "slow"]),
    kw("accuracy", &["точност", "правильн", "accura", "correct"]),
];

const SCENARIO_TYPES: &[KeywordRule] = &[
    kw("learning", &["обучени", "учеб", "learn", "study", "education"]),
    kw("game", &["игр", "game", "play"]),
    kw("story", &["истори", "сказк", "story", "tale"]),
    kw("assistant", &["помощник", "ассистент", "assist", "helper"]),
];

const MODIFICATION_AREAS: &[KeywordRule] = &[
    kw("personality", &["характер", "личност", "personality", "character"]),
    kw("behavior", &["поведени", "behavior"]),
    kw("style", &["стил", "style", "tone"]),
    kw("knowledge", &["знани", "knowledge"]),
];

const THOUGHT_TYPES: &[KeywordRule] = &[
    kw("hypothesis", &["кажется", "возможно", "может", "maybe", "perhaps", "seems"]),
    kw("reminder", &["помни", "напомни", "remember", "remind"]),
    kw("observation", &["заметил", "замети", "вижу", "notice", "observe"]),
    kw("idea", &["иде", "idea"]),
];

/// First rule whose trigger matches, in declaration order.
///
/// Single-word triggers prefix-match tokens; triggers with a space are
/// matched as substrings of the normalized text.
fn first_match(rules: &[KeywordRule], utterance: &Utterance) -> Option<&'static str> {
    for rule in rules {
        for trigger in rule.triggers {
            let hit = if trigger.contains(' ') {
                utterance.normalized.contains(trigger)
            } else {
                utterance.tokens.iter().any(|t| t.starts_with(trigger))
            };
            if hit {
                return Some(rule.value);
            }
        }
    }
    None
}

/// Argument key that mirrors `content` for intents with a payload.
fn content_alias(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::SetGoal => Some("goal_text"),
        Intent::RequestMemory => Some("memory_query"),
        Intent::TriggerEmotion => Some("emotion_hint"),
        Intent::InjectThought => Some("thought_text"),
        Intent::ActivateScenario => Some("scenario_name"),
        _ => None,
    }
}

/// Mines structured arguments from a classified utterance.
pub struct ArgumentExtractor {
    email: Regex,
    url: Regex,
    time: Regex,
    date: Regex,
    number_unit: Regex,
    number: Regex,
}

impl ArgumentExtractor {
    /// Compile the entity patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            email: entity(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")?,
            url: entity(r"https?://[^\s]+")?,
            time: entity(r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b")?,
            date: entity(r"\b\d{1,2}[./]\d{1,2}(?:[./]\d{2,4})?\b")?,
            number_unit: entity(
                r"(\d+(?:[.,]\d+)?)\s*(минут\w*|час\w*|секунд\w*|дн(?:я|ей)\w*|недел\w*|месяц\w*|minutes?|mins?|hours?|hrs?|seconds?|secs?|days?|weeks?|months?)\b",
            )?,
            number: entity(r"\d+(?:[.,]\d+)?")?,
        })
    }

    /// Extract every argument for the winning intent.
    pub fn extract(
        &self,
        intent: Intent,
        utterance: &Utterance,
        capture: Option<&PatternCapture>,
    ) -> HashMap<String, String> {
        let mut args = HashMap::new();

        // A capture only applies when its pattern agrees with the winner.
        if let Some(capture) = capture {
            if capture.intent == intent {
                args.insert("content".to_string(), capture.content.clone());
                if let Some(alias) = content_alias(intent) {
                    args.insert(alias.to_string(), capture.content.clone());
                }
            }
        }

        self.extract_for_intent(intent, utterance, &mut args);
        self.extract_entities(utterance, &mut args);

        args.insert("word_count".to_string(), utterance.word_count().to_string());
        args.insert("char_count".to_string(), utterance.char_count().to_string());
        args
    }

    fn extract_for_intent(
        &self,
        intent: Intent,
        utterance: &Utterance,
        args: &mut HashMap<String, String>,
    ) {
        let mut put = |key: &str, value: &str| {
            args.insert(key.to_string(), value.to_string());
        };

        match intent {
            Intent::AskQuestion => {
                put(
                    "question_type",
                    first_match(QUESTION_TYPES, utterance).unwrap_or("general"),
                );
            }
            Intent::SetGoal => {
                put(
                    "priority",
                    first_match(GOAL_PRIORITIES, utterance).unwrap_or("normal"),
                );
                if let Some(timeframe) = first_match(GOAL_TIMEFRAMES, utterance) {
                    put("timeframe", timeframe);
                }
                let action = utterance
                    .tokens
                    .iter()
                    .zip(utterance.morphs.iter())
                    .find(|(_, m)| m.pos == PartOfSpeech::Verb && m.has_tag("infinitive"))
                    .map(|(token, _)| token.as_str());
                if let Some(action) = action {
                    put("action", action);
                }
            }
            Intent::TriggerEmotion => {
                if let Some(emotion) = first_match(EMOTION_TYPES, utterance) {
                    put("emotion_type", emotion);
                }
                put(
                    "intensity",
                    first_match(EMOTION_INTENSITIES, utterance).unwrap_or("medium"),
                );
            }
            Intent::RequestMemory => {
                put(
                    "memory_type",
                    first_match(MEMORY_TYPES, utterance).unwrap_or("general"),
                );
                if let Some(timeframe) = first_match(MEMORY_TIMEFRAMES, utterance) {
                    put("timeframe", timeframe);
                }
            }
            Intent::UserFeedbackPositive | Intent::UserFeedbackNegative => {
                put(
                    "aspect",
                    first_match(FEEDBACK_ASPECTS, utterance).unwrap_or("general"),
                );
            }
            Intent::ActivateScenario => {
                if let Some(scenario) = first_match(SCENARIO_TYPES, utterance) {
                    put("scenario_type", scenario);
                }
            }
            Intent::ModifySelf => {
                if let Some(area) = first_match(MODIFICATION_AREAS, utterance) {
                    put("area", area);
                }
            }
            Intent::InjectThought => {
                if let Some(thought) = first_match(THOUGHT_TYPES, utterance) {
                    put("thought_type", thought);
                }
            }
            _ => {}
        }
    }

    /// Named entities scanned from the raw text, first match per kind.
    fn extract_entities(&self, utterance: &Utterance, args: &mut HashMap<String, String>) {
        let raw = utterance.raw.as_str();

        if let Some(m) = self.email.find(raw) {
            args.insert("email".to_string(), m.as_str().to_string());
        }
        if let Some(m) = self.url.find(raw) {
            args.insert("url".to_string(), m.as_str().to_string());
        }
        if let Some(m) = self.time.find(raw) {
            args.insert("time".to_string(), m.as_str().to_string());
        }
        if let Some(m) = self.date.find(raw) {
            // Clock times also parse as dates; prefer the time reading.
            if args.get("time").map(String::as_str) != Some(m.as_str()) {
                args.insert("date".to_string(), m.as_str().to_string());
            }
        }
        if let Some(caps) = self.number_unit.captures(raw) {
            if let (Some(number), Some(unit)) = (caps.get(1), caps.get(2)) {
                args.insert("number".to_string(), number.as_str().to_string());
                args.insert("unit".to_string(), unit.as_str().to_string());
            }
        } else if let Some(m) = self.number.find(raw) {
            args.insert("number".to_string(), m.as_str().to_string());
        }
    }
}

fn entity(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ParlanceError::config(format!("invalid entity pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MorphologyAnalyzer, TextPreprocessor, Utterance};

    fn utter(text: &str) -> Utterance {
        Utterance::analyze(text, &TextPreprocessor::new(), &MorphologyAnalyzer::new())
    }

    fn extract(intent: Intent, text: &str) -> HashMap<String, String> {
        ArgumentExtractor::new()
            .unwrap()
            .extract(intent, &utter(text), None)
    }

    #[test]
    fn test_counts_always_present() {
        let args = extract(Intent::Unknown, "привет мир");
        assert_eq!(args["word_count"], "2");
        assert_eq!(args["char_count"], "10");
    }

    #[test]
    fn test_question_type() {
        assert_eq!(extract(Intent::AskQuestion, "почему небо синее")["question_type"], "why");
        assert_eq!(extract(Intent::AskQuestion, "сколько это стоит")["question_type"], "how_many");
        assert_eq!(
            extract(Intent::AskQuestion, "how much does it cost")["question_type"],
            "how_many"
        );
        assert_eq!(extract(Intent::AskQuestion, "расскажи про море")["question_type"], "general");
    }

    #[test]
    fn test_goal_arguments() {
        let args = extract(Intent::SetGoal, "поставь цель срочно выучить английский до завтра");
        assert_eq!(args["priority"], "high");
        assert_eq!(args["timeframe"], "tomorrow");
        assert_eq!(args["action"], "выучить");
    }

    #[test]
    fn test_goal_priority_defaults_to_normal() {
        let args = extract(Intent::SetGoal, "поставь цель читать книги");
        assert_eq!(args["priority"], "normal");
    }

    #[test]
    fn test_emotion_arguments() {
        let args = extract(Intent::TriggerEmotion, "почувствуй сильную радость");
        assert_eq!(args["emotion_type"], "joy");
        assert_eq!(args["intensity"], "high");

        let args = extract(Intent::TriggerEmotion, "feel a bit of sadness");
        assert_eq!(args["emotion_type"], "sadness");
        assert_eq!(args["intensity"], "low");
    }

    #[test]
    fn test_memory_arguments() {
        let args = extract(Intent::RequestMemory, "что ты помнишь о наших разговорах вчера");
        assert_eq!(args["memory_type"], "conversation");
        assert_eq!(args["timeframe"], "yesterday");
    }

    #[test]
    fn test_feedback_aspect() {
        let args = extract(Intent::UserFeedbackNegative, "твой ответ неправильный");
        assert_eq!(args["aspect"], "answer");
    }

    #[test]
    fn test_entity_extraction() {
        let args = extract(Intent::AskQuestion, "когда встреча 15.03 в 14:30?");
        assert_eq!(args["time"], "14:30");
        assert_eq!(args["date"], "15.03");

        let args = extract(Intent::Unknown, "напиши на test@example.com");
        assert_eq!(args["email"], "test@example.com");

        let args = extract(Intent::Unknown, "открой https://example.com/page");
        assert_eq!(args["url"], "https://example.com/page");
    }

    #[test]
    fn test_number_with_unit() {
        let args = extract(Intent::Unknown, "подожди 15 минут");
        assert_eq!(args["number"], "15");
        assert_eq!(args["unit"], "минут");
    }

    #[test]
    fn test_capture_sets_content_and_alias() {
        let extractor = ArgumentExtractor::new().unwrap();
        let capture = PatternCapture {
            intent: Intent::SetGoal,
            content: "выучить английский".to_string(),
            score: 1.0,
        };
        let args = extractor.extract(
            Intent::SetGoal,
            &utter("поставь цель выучить английский"),
            Some(&capture),
        );
        assert_eq!(args["content"], "выучить английский");
        assert_eq!(args["goal_text"], "выучить английский");
    }

    #[test]
    fn test_capture_for_other_intent_is_ignored() {
        let extractor = ArgumentExtractor::new().unwrap();
        let capture = PatternCapture {
            intent: Intent::SetGoal,
            content: "что-то".to_string(),
            score: 0.9,
        };
        let args = extractor.extract(Intent::AskQuestion, &utter("как дела"), Some(&capture));
        assert!(!args.contains_key("content"));
        assert!(!args.contains_key("goal_text"));
    }
}
