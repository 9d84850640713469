//! Core intent types for classification results.
//!
//! This module defines the closed set of intent categories, the sentiment
//! label, and [`ParsedIntent`] — the value returned by every classification
//! call. `ParsedIntent` is immutable after construction; the only thing that
//! happens to it afterwards is being appended into the conversation window.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of intent categories an utterance can resolve to.
///
/// The same enumeration is used everywhere a per-intent table exists: the
/// intent priors, the word-weight table, and the neural network's output
/// layer, whose width is [`Intent::COUNT`]. Adding a variant means retraining
/// every persisted model, so the set is deliberately closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Greeting or small-talk opener.
    Greet,
    /// Information-seeking question.
    AskQuestion,
    /// Request to register a new goal.
    SetGoal,
    /// Request to recall a stored memory or past interaction.
    RequestMemory,
    /// Request to induce or express an emotional reaction.
    TriggerEmotion,
    /// Request for the agent to inspect its own state.
    Introspect,
    /// Request for the agent to reflect on recent events.
    Reflect,
    /// Injection of an external thought or idea into the agent.
    InjectThought,
    /// Request to change the agent's own behavior or parameters.
    ModifySelf,
    /// Request to explain a previous decision.
    ExplainDecision,
    /// Request to activate a named scenario or mode.
    ActivateScenario,
    /// Positive feedback about a previous response.
    UserFeedbackPositive,
    /// Negative feedback about a previous response.
    UserFeedbackNegative,
    /// Request to shut the agent down.
    Shutdown,
    /// Nothing matched with any confidence.
    Unknown,
}

impl Intent {
    /// All variants, in output-layer order. `ALL[i].index() == i`.
    pub const ALL: [Intent; 15] = [
        Intent::Greet,
        Intent::AskQuestion,
        Intent::SetGoal,
        Intent::RequestMemory,
        Intent::TriggerEmotion,
        Intent::Introspect,
        Intent::Reflect,
        Intent::InjectThought,
        Intent::ModifySelf,
        Intent::ExplainDecision,
        Intent::ActivateScenario,
        Intent::UserFeedbackPositive,
        Intent::UserFeedbackNegative,
        Intent::Shutdown,
        Intent::Unknown,
    ];

    /// Number of variants; also the neural network's output width.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable snake_case name, used in the model interchange format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greet => "greet",
            Intent::AskQuestion => "ask_question",
            Intent::SetGoal => "set_goal",
            Intent::RequestMemory => "request_memory",
            Intent::TriggerEmotion => "trigger_emotion",
            Intent::Introspect => "introspect",
            Intent::Reflect => "reflect",
            Intent::InjectThought => "inject_thought",
            Intent::ModifySelf => "modify_self",
            Intent::ExplainDecision => "explain_decision",
            Intent::ActivateScenario => "activate_scenario",
            Intent::UserFeedbackPositive => "user_feedback_positive",
            Intent::UserFeedbackNegative => "user_feedback_negative",
            Intent::Shutdown => "shutdown",
            Intent::Unknown => "unknown",
        }
    }

    /// Parse a snake_case intent name. Returns `None` for unknown names so
    /// that model import can skip bad entries instead of aborting.
    pub fn parse(name: &str) -> Option<Intent> {
        Intent::ALL.iter().copied().find(|i| i.as_str() == name)
    }

    /// Position of this variant in [`Intent::ALL`], used for one-hot targets
    /// and the network output layer.
    pub fn index(&self) -> usize {
        match self {
            Intent::Greet => 0,
            Intent::AskQuestion => 1,
            Intent::SetGoal => 2,
            Intent::RequestMemory => 3,
            Intent::TriggerEmotion => 4,
            Intent::Introspect => 5,
            Intent::Reflect => 6,
            Intent::InjectThought => 7,
            Intent::ModifySelf => 8,
            Intent::ExplainDecision => 9,
            Intent::ActivateScenario => 10,
            Intent::UserFeedbackPositive => 11,
            Intent::UserFeedbackNegative => 12,
            Intent::Shutdown => 13,
            Intent::Unknown => 14,
        }
    }

    /// Variant at the given output index, if in range.
    pub fn from_index(index: usize) -> Option<Intent> {
        Intent::ALL.get(index).copied()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse sentiment label attached to every classification result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Valence used for the running mood average in the conversation window.
    pub fn valence(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Negative => -1.0,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        };
        write!(f, "{label}")
    }
}

/// The result of classifying one utterance.
///
/// `confidence` is a relative ranking score clamped to `[0, 1]`, not a
/// calibrated probability: signal weights are summed without renormalization,
/// so fewer active signals mean lower achievable totals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// The winning intent category.
    pub intent: Intent,
    /// The utterance exactly as received.
    pub raw_text: String,
    /// Ensemble score of the winner, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Structured fields mined from the utterance for the winning intent.
    pub arguments: HashMap<String, String>,
    /// Intents of the conversation window at classification time, oldest
    /// first, bounded by the window size.
    pub prior_intents: Vec<Intent>,
    /// Lexicon-based sentiment of the utterance.
    pub sentiment: Sentiment,
    /// When the classification happened.
    pub timestamp: DateTime<Utc>,
}

impl ParsedIntent {
    /// Build a result, clamping confidence into `[0, 1]`.
    pub fn new<S: Into<String>>(intent: Intent, raw_text: S, confidence: f64) -> Self {
        ParsedIntent {
            intent,
            raw_text: raw_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            arguments: HashMap::new(),
            prior_intents: Vec::new(),
            sentiment: Sentiment::Neutral,
            timestamp: Utc::now(),
        }
    }

    /// The fallback result for empty or unclassifiable input.
    pub fn unknown<S: Into<String>>(raw_text: S) -> Self {
        Self::new(Intent::Unknown, raw_text, 0.0)
    }

    /// Set the mined arguments.
    pub fn with_arguments(mut self, arguments: HashMap<String, String>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set the prior-intent window snapshot.
    pub fn with_prior_intents(mut self, prior_intents: Vec<Intent>) -> Self {
        self.prior_intents = prior_intents;
        self
    }

    /// Set the sentiment label.
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Look up one mined argument.
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_roundtrip_names() {
        for intent in Intent::ALL {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("no_such_intent"), None);
    }

    #[test]
    fn test_intent_index_matches_all_order() {
        for (i, intent) in Intent::ALL.iter().enumerate() {
            assert_eq!(intent.index(), i);
            assert_eq!(Intent::from_index(i), Some(*intent));
        }
        assert_eq!(Intent::from_index(Intent::COUNT), None);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let high = ParsedIntent::new(Intent::Greet, "hi", 3.5);
        assert_eq!(high.confidence, 1.0);

        let low = ParsedIntent::new(Intent::Greet, "hi", -0.4);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_unknown_result() {
        let result = ParsedIntent::unknown("");
        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.arguments.is_empty());
        assert_eq!(result.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_serde_snake_case_names() {
        let json = serde_json::to_string(&Intent::AskQuestion).unwrap();
        assert_eq!(json, "\"ask_question\"");

        let back: Intent = serde_json::from_str("\"set_goal\"").unwrap();
        assert_eq!(back, Intent::SetGoal);
    }

    #[test]
    fn test_argument_lookup() {
        let mut args = HashMap::new();
        args.insert("goal_text".to_string(), "learn rust".to_string());
        let result = ParsedIntent::new(Intent::SetGoal, "set a goal", 0.9).with_arguments(args);

        assert_eq!(result.argument("goal_text"), Some("learn rust"));
        assert_eq!(result.argument("missing"), None);
    }
}
