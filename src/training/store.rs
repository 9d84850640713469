//! Labeled sample accumulation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::Intent;

/// One labeled training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Stable identity, assigned at creation.
    pub id: Uuid,
    /// The utterance as the user typed it.
    pub text: String,
    /// The intent this text should classify as.
    pub correct_intent: Intent,
    /// Arguments the extraction layer should produce, when known.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expected_arguments: HashMap<String, String>,
    /// Who supplied the label, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TrainingSample {
    pub fn new<S: Into<String>>(text: S, correct_intent: Intent) -> Self {
        TrainingSample {
            id: Uuid::new_v4(),
            text: text.into(),
            correct_intent,
            expected_arguments: HashMap::new(),
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach expected arguments.
    pub fn with_arguments(mut self, arguments: HashMap<String, String>) -> Self {
        self.expected_arguments = arguments;
        self
    }

    /// Attach the labeling user.
    pub fn with_user<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Append-only list of samples, pruned from the oldest end.
#[derive(Debug, Clone, Default)]
pub struct TrainingStore {
    samples: Vec<TrainingSample>,
}

impl TrainingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample.
    pub fn push(&mut self, sample: TrainingSample) {
        self.samples.push(sample);
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop the oldest samples beyond `max_samples`; returns how many.
    pub fn cleanup(&mut self, max_samples: usize) -> usize {
        if self.samples.len() <= max_samples {
            return 0;
        }
        let excess = self.samples.len() - max_samples;
        self.samples.drain(..excess);
        excess
    }

    /// `(intent, text)` pairs for prototype rebuilding.
    pub fn labeled(&self) -> Vec<(Intent, String)> {
        self.samples
            .iter()
            .map(|s| (s.correct_intent, s.text.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut store = TrainingStore::new();
        store.push(TrainingSample::new("привет", Intent::Greet));
        store.push(TrainingSample::new("как дела", Intent::AskQuestion));

        assert_eq!(store.len(), 2);
        assert_eq!(store.samples()[0].text, "привет");
        assert_eq!(store.samples()[1].correct_intent, Intent::AskQuestion);
    }

    #[test]
    fn test_cleanup_drops_oldest_first() {
        let mut store = TrainingStore::new();
        for i in 0..10 {
            store.push(TrainingSample::new(format!("sample {i}"), Intent::Greet));
        }

        let removed = store.cleanup(4);
        assert_eq!(removed, 6);
        assert_eq!(store.len(), 4);
        assert_eq!(store.samples()[0].text, "sample 6");
    }

    #[test]
    fn test_cleanup_under_cap_is_noop() {
        let mut store = TrainingStore::new();
        store.push(TrainingSample::new("x", Intent::Greet));
        assert_eq!(store.cleanup(100), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sample_builders() {
        let mut args = HashMap::new();
        args.insert("goal_text".to_string(), "читать".to_string());
        let sample = TrainingSample::new("поставь цель читать", Intent::SetGoal)
            .with_arguments(args)
            .with_user("u-1");

        assert_eq!(sample.expected_arguments["goal_text"], "читать");
        assert_eq!(sample.user_id.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_labeled_pairs() {
        let mut store = TrainingStore::new();
        store.push(TrainingSample::new("привет", Intent::Greet));
        let labeled = store.labeled();
        assert_eq!(labeled, vec![(Intent::Greet, "привет".to_string())]);
    }
}
