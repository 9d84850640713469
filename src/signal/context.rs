//! Conversational transition signal.

use crate::analysis::Utterance;
use crate::context::{ContextConfig, ConversationContext};
use crate::intent::Intent;
use crate::signal::{ClassifierSignal, ScoreMap, SignalKind};

/// Likely follow-up intents for each previously seen intent.
///
/// Rows encode conversational flow: a question tends to follow a greeting,
/// an explanation request tends to follow negative feedback, and so on.
/// Unlisted transitions score zero.
const TRANSITIONS: &[(Intent, &[(Intent, f64)])] = &[
    (
        Intent::Greet,
        &[
            (Intent::AskQuestion, 0.7),
            (Intent::SetGoal, 0.4),
            (Intent::Introspect, 0.3),
        ],
    ),
    (
        Intent::AskQuestion,
        &[
            (Intent::AskQuestion, 0.6),
            (Intent::ExplainDecision, 0.5),
            (Intent::RequestMemory, 0.4),
        ],
    ),
    (
        Intent::SetGoal,
        &[
            (Intent::AskQuestion, 0.5),
            (Intent::SetGoal, 0.4),
            (Intent::InjectThought, 0.3),
        ],
    ),
    (
        Intent::RequestMemory,
        &[
            (Intent::AskQuestion, 0.5),
            (Intent::RequestMemory, 0.4),
            (Intent::Reflect, 0.3),
        ],
    ),
    (
        Intent::TriggerEmotion,
        &[
            (Intent::Introspect, 0.6),
            (Intent::AskQuestion, 0.4),
            (Intent::TriggerEmotion, 0.3),
        ],
    ),
    (
        Intent::Introspect,
        &[
            (Intent::Reflect, 0.6),
            (Intent::AskQuestion, 0.5),
            (Intent::ExplainDecision, 0.4),
        ],
    ),
    (
        Intent::Reflect,
        &[
            (Intent::AskQuestion, 0.5),
            (Intent::Introspect, 0.4),
            (Intent::InjectThought, 0.3),
        ],
    ),
    (
        Intent::InjectThought,
        &[
            (Intent::Reflect, 0.6),
            (Intent::AskQuestion, 0.4),
            (Intent::InjectThought, 0.3),
        ],
    ),
    (
        Intent::ModifySelf,
        &[
            (Intent::Introspect, 0.5),
            (Intent::AskQuestion, 0.4),
            (Intent::ExplainDecision, 0.3),
        ],
    ),
    (
        Intent::ExplainDecision,
        &[
            (Intent::AskQuestion, 0.6),
            (Intent::UserFeedbackPositive, 0.3),
            (Intent::UserFeedbackNegative, 0.3),
        ],
    ),
    (
        Intent::ActivateScenario,
        &[
            (Intent::AskQuestion, 0.5),
            (Intent::TriggerEmotion, 0.4),
            (Intent::Introspect, 0.3),
        ],
    ),
    (
        Intent::UserFeedbackPositive,
        &[
            (Intent::AskQuestion, 0.5),
            (Intent::SetGoal, 0.3),
            (Intent::Greet, 0.2),
        ],
    ),
    (
        Intent::UserFeedbackNegative,
        &[
            (Intent::ExplainDecision, 0.6),
            (Intent::ModifySelf, 0.4),
            (Intent::AskQuestion, 0.3),
        ],
    ),
    (Intent::Shutdown, &[(Intent::Greet, 0.5)]),
    (
        Intent::Unknown,
        &[(Intent::AskQuestion, 0.3), (Intent::Greet, 0.3)],
    ),
];

/// Scores intents from the conversation's most recent transition.
///
/// Looks up the transition row for the last recorded intent, then dampens
/// any intent the user has already repeated past the fatigue threshold
/// within the window. Abstains when the window is empty, so the first
/// utterance of a session carries no context bias.
#[derive(Debug)]
pub struct ContextSignal {
    config: ContextConfig,
}

impl ContextSignal {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    fn transition_row(last: Intent) -> Option<&'static [(Intent, f64)]> {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == last)
            .map(|(_, row)| *row)
    }
}

impl Default for ContextSignal {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl ClassifierSignal for ContextSignal {
    fn name(&self) -> &'static str {
        "context"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Context
    }

    fn score(&self, _utterance: &Utterance, context: &ConversationContext) -> Option<ScoreMap> {
        let last = context.last()?;
        let row = Self::transition_row(last.intent)?;

        let mut scores = ScoreMap::new();
        for (intent, weight) in row {
            let mut score = *weight;
            if context.occurrences(*intent) > self.config.fatigue_threshold {
                score *= self.config.fatigue_dampening;
            }
            scores.insert(*intent, score);
        }
        Some(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MorphologyAnalyzer, TextPreprocessor, Utterance};
    use crate::intent::ParsedIntent;

    fn utter(text: &str) -> Utterance {
        Utterance::analyze(text, &TextPreprocessor::new(), &MorphologyAnalyzer::new())
    }

    fn record(context: &mut ConversationContext, intent: Intent) {
        context.record(ParsedIntent::new(intent, "x", 0.9));
    }

    #[test]
    fn test_empty_window_abstains() {
        let signal = ContextSignal::default();
        let context = ConversationContext::default();
        assert!(signal.score(&utter("как дела"), &context).is_none());
    }

    #[test]
    fn test_greeting_promotes_question() {
        let signal = ContextSignal::default();
        let mut context = ConversationContext::default();
        record(&mut context, Intent::Greet);
        let scores = signal.score(&utter("как дела"), &context).unwrap();
        assert!((scores[&Intent::AskQuestion] - 0.7).abs() < 1e-9);
        assert!(!scores.contains_key(&Intent::Shutdown));
    }

    #[test]
    fn test_negative_feedback_promotes_explanation() {
        let signal = ContextSignal::default();
        let mut context = ConversationContext::default();
        record(&mut context, Intent::UserFeedbackNegative);
        let scores = signal.score(&utter("почему"), &context).unwrap();
        assert!((scores[&Intent::ExplainDecision] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_fatigue_dampens_repeated_intent() {
        let signal = ContextSignal::default();
        let mut context = ConversationContext::default();
        // Three questions in a row exceed the default fatigue threshold.
        record(&mut context, Intent::AskQuestion);
        record(&mut context, Intent::AskQuestion);
        record(&mut context, Intent::AskQuestion);
        let scores = signal.score(&utter("а почему"), &context).unwrap();
        assert!((scores[&Intent::AskQuestion] - 0.6 * 0.7).abs() < 1e-9);
        // Other intents in the row are untouched.
        assert!((scores[&Intent::ExplainDecision] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_every_intent_has_a_row() {
        for intent in Intent::ALL {
            assert!(
                ContextSignal::transition_row(intent).is_some(),
                "no transition row for {intent}"
            );
        }
    }
}
