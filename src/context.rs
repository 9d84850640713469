//! Conversation context: the bounded window of recent classifications.
//!
//! One [`ConversationContext`] belongs to one conversation. It is mutated
//! only through [`record`](ConversationContext::record) and reset through
//! [`clear`](ConversationContext::clear); the context signal reads it to bias
//! the next classification. The window is a FIFO — when it is full the oldest
//! entry is dropped first, so it never exceeds its configured size.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, ParsedIntent};

/// Configuration for the conversation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum number of results kept in the window.
    pub max_window: usize,
    /// An intent recurring more often than this in the window is dampened
    /// by the context signal (topic fatigue).
    pub fatigue_threshold: usize,
    /// Multiplier applied to fatigued intents.
    pub fatigue_dampening: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            max_window: 10,
            fatigue_threshold: 2,
            fatigue_dampening: 0.7,
        }
    }
}

/// Rolling per-conversation state.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    /// Recent results, oldest first, bounded by `max_window`.
    recent: VecDeque<ParsedIntent>,
    /// Free-form variables the host may attach to the session.
    session_variables: HashMap<String, String>,
    /// Name of the last confidently-classified intent, if any.
    current_topic: Option<String>,
    /// Running mean sentiment valence over the window, in `[-1, 1]`.
    mood: f64,
    max_window: usize,
}

impl ConversationContext {
    /// Create an empty context with the given window bound.
    pub fn new(max_window: usize) -> Self {
        ConversationContext {
            recent: VecDeque::with_capacity(max_window),
            session_variables: HashMap::new(),
            current_topic: None,
            mood: 0.0,
            max_window: max_window.max(1),
        }
    }

    /// Append a classification result, evicting the oldest entry when full.
    pub fn record(&mut self, result: ParsedIntent) {
        if result.intent != Intent::Unknown && result.confidence > 0.5 {
            self.current_topic = Some(result.intent.as_str().to_string());
        }

        self.recent.push_back(result);
        while self.recent.len() > self.max_window {
            self.recent.pop_front();
        }

        let sum: f64 = self.recent.iter().map(|r| r.sentiment.valence()).sum();
        self.mood = sum / self.recent.len() as f64;
    }

    /// Drop all rolling state, keeping the configured bounds.
    pub fn clear(&mut self) {
        self.recent.clear();
        self.session_variables.clear();
        self.current_topic = None;
        self.mood = 0.0;
    }

    /// The most recent result, if any.
    pub fn last(&self) -> Option<&ParsedIntent> {
        self.recent.back()
    }

    /// Intents in the window, oldest first.
    pub fn recent_intents(&self) -> Vec<Intent> {
        self.recent.iter().map(|r| r.intent).collect()
    }

    /// How many times the given intent occurs in the window.
    pub fn occurrences(&self, intent: Intent) -> usize {
        self.recent.iter().filter(|r| r.intent == intent).count()
    }

    /// Number of results currently held.
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    /// Name of the current topic, if one has been established.
    pub fn current_topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    /// Running mean sentiment valence over the window.
    pub fn mood(&self) -> f64 {
        self.mood
    }

    /// Set a session variable.
    pub fn set_variable<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.session_variables.insert(key.into(), value.into());
    }

    /// Get a session variable.
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.session_variables.get(key).map(|s| s.as_str())
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(ContextConfig::default().max_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Sentiment;

    fn result(intent: Intent) -> ParsedIntent {
        ParsedIntent::new(intent, "text", 0.8)
    }

    #[test]
    fn test_window_never_exceeds_max() {
        let mut ctx = ConversationContext::new(10);
        for _ in 0..25 {
            ctx.record(result(Intent::AskQuestion));
            assert!(ctx.len() <= 10);
        }
        assert_eq!(ctx.len(), 10);
    }

    #[test]
    fn test_fifo_eviction_drops_oldest() {
        let mut ctx = ConversationContext::new(3);
        ctx.record(result(Intent::Greet));
        ctx.record(result(Intent::AskQuestion));
        ctx.record(result(Intent::SetGoal));
        ctx.record(result(Intent::Reflect));

        assert_eq!(
            ctx.recent_intents(),
            vec![Intent::AskQuestion, Intent::SetGoal, Intent::Reflect]
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut ctx = ConversationContext::new(5);
        ctx.record(result(Intent::Greet));
        ctx.set_variable("user", "alice");
        ctx.clear();

        assert!(ctx.is_empty());
        assert_eq!(ctx.variable("user"), None);
        assert_eq!(ctx.current_topic(), None);
        assert_eq!(ctx.mood(), 0.0);
    }

    #[test]
    fn test_topic_tracks_confident_results() {
        let mut ctx = ConversationContext::new(5);
        ctx.record(ParsedIntent::new(Intent::Unknown, "???", 0.0));
        assert_eq!(ctx.current_topic(), None);

        ctx.record(ParsedIntent::new(Intent::SetGoal, "set a goal", 0.9));
        assert_eq!(ctx.current_topic(), Some("set_goal"));

        // Low-confidence results do not move the topic.
        ctx.record(ParsedIntent::new(Intent::Greet, "uh", 0.2));
        assert_eq!(ctx.current_topic(), Some("set_goal"));
    }

    #[test]
    fn test_mood_is_mean_valence() {
        let mut ctx = ConversationContext::new(5);
        ctx.record(result(Intent::Greet).with_sentiment(Sentiment::Positive));
        ctx.record(result(Intent::Greet).with_sentiment(Sentiment::Negative));
        assert!(ctx.mood().abs() < 1e-12);

        ctx.record(result(Intent::Greet).with_sentiment(Sentiment::Positive));
        assert!((ctx.mood() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_occurrences_counts_window_only() {
        let mut ctx = ConversationContext::new(2);
        ctx.record(result(Intent::Greet));
        ctx.record(result(Intent::Greet));
        ctx.record(result(Intent::AskQuestion));

        // First greet was evicted.
        assert_eq!(ctx.occurrences(Intent::Greet), 1);
        assert_eq!(ctx.occurrences(Intent::AskQuestion), 1);
    }
}
