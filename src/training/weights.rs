//! Word-weight table and intent priors.
//!
//! The table maps `(stem, intent)` pairs to positive multipliers. Weights
//! are reinforced additively on correct labels and decayed multiplicatively
//! on corrected mispredictions, so they never reach zero. Priors come from
//! the observed intent frequencies, falling back to a hardcoded seed table
//! while no samples have been recorded.

use std::collections::HashMap;

use ahash::AHashMap;

use crate::intent::Intent;

/// Default weight for a `(stem, intent)` pair never seen in training.
///
/// Used during scoring only. The first reinforcement of an unseen pair
/// starts from 1.0 instead, so one observation lands at 1.1.
pub const SMOOTHING_WEIGHT: f64 = 0.01;

/// Added to a pair's weight on each correct observation.
pub const REINFORCE_STEP: f64 = 0.1;

/// Multiplier applied to implicated weights on a corrected misprediction.
pub const DECAY_FACTOR: f64 = 0.9;

/// Hand-tuned prior probabilities used before any sample is recorded.
const SEED_PRIORS: &[(Intent, f64)] = &[
    (Intent::AskQuestion, 0.18),
    (Intent::Greet, 0.13),
    (Intent::SetGoal, 0.10),
    (Intent::RequestMemory, 0.08),
    (Intent::ExplainDecision, 0.07),
    (Intent::Introspect, 0.06),
    (Intent::Reflect, 0.06),
    (Intent::TriggerEmotion, 0.05),
    (Intent::UserFeedbackPositive, 0.05),
    (Intent::UserFeedbackNegative, 0.05),
    (Intent::InjectThought, 0.04),
    (Intent::ModifySelf, 0.04),
    (Intent::ActivateScenario, 0.04),
    (Intent::Shutdown, 0.03),
    (Intent::Unknown, 0.02),
];

/// Seed prior for one intent.
pub fn seed_prior(intent: Intent) -> f64 {
    SEED_PRIORS
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, p)| *p)
        .unwrap_or(0.0)
}

/// Learned word weights plus the intent frequency table behind priors.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    // ahash: these are the hottest lookups in the scoring path.
    weights: AHashMap<(String, Intent), f64>,
    intent_counts: AHashMap<Intent, usize>,
    total_samples: usize,
}

impl WeightTable {
    /// Create an empty table.
    pub fn new() -> Self {
        WeightTable::default()
    }

    /// Scoring weight for a pair, smoothed when unseen.
    pub fn weight(&self, stem: &str, intent: Intent) -> f64 {
        self.weights
            .get(&(stem.to_string(), intent))
            .copied()
            .unwrap_or(SMOOTHING_WEIGHT)
    }

    /// Reinforce a pair on a correct observation.
    pub fn reinforce(&mut self, stem: &str, intent: Intent) {
        let entry = self
            .weights
            .entry((stem.to_string(), intent))
            .or_insert(1.0);
        *entry += REINFORCE_STEP;
    }

    /// Decay a pair implicated in a corrected misprediction.
    pub fn demote(&mut self, stem: &str, intent: Intent) {
        let entry = self
            .weights
            .entry((stem.to_string(), intent))
            .or_insert(1.0);
        *entry *= DECAY_FACTOR;
    }

    /// Count one recorded sample toward the priors.
    pub fn record_intent(&mut self, intent: Intent) {
        *self.intent_counts.entry(intent).or_insert(0) += 1;
        self.total_samples += 1;
    }

    /// Observed frequency of an intent, or its seed prior with no data.
    pub fn prior(&self, intent: Intent) -> f64 {
        if self.total_samples == 0 {
            seed_prior(intent)
        } else {
            *self.intent_counts.get(&intent).unwrap_or(&0) as f64 / self.total_samples as f64
        }
    }

    /// Samples recorded into the frequency table.
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Number of stored `(stem, intent)` weights.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no weights are stored.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Stored weight for a pair, without smoothing. Test and export hook.
    pub fn stored_weight(&self, stem: &str, intent: Intent) -> Option<f64> {
        self.weights.get(&(stem.to_string(), intent)).copied()
    }

    /// All stored weights.
    pub fn iter_weights(&self) -> impl Iterator<Item = (&(String, Intent), &f64)> {
        self.weights.iter()
    }

    /// Overwrite one weight, used when importing a model.
    pub fn set_weight(&mut self, stem: String, intent: Intent, value: f64) {
        if value > 0.0 {
            self.weights.insert((stem, intent), value);
        }
    }

    /// Overwrite the frequency table, used when importing a model.
    pub fn set_counts(&mut self, counts: HashMap<Intent, usize>) {
        self.total_samples = counts.values().sum();
        self.intent_counts = counts.into_iter().collect();
    }

    /// Observed intent counts.
    pub fn intent_counts(&self) -> HashMap<Intent, usize> {
        self.intent_counts.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_priors_sum_to_one() {
        let sum: f64 = SEED_PRIORS.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9, "seed priors sum to {sum}");
        assert_eq!(SEED_PRIORS.len(), Intent::COUNT);
    }

    #[test]
    fn test_unseen_weight_is_smoothed() {
        let table = WeightTable::new();
        assert_eq!(table.weight("цель", Intent::SetGoal), SMOOTHING_WEIGHT);
    }

    #[test]
    fn test_first_reinforcement_lands_at_one_point_one() {
        let mut table = WeightTable::new();
        table.reinforce("цель", Intent::SetGoal);
        assert!((table.weight("цель", Intent::SetGoal) - 1.1).abs() < 1e-12);
        table.reinforce("цель", Intent::SetGoal);
        assert!((table.weight("цель", Intent::SetGoal) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_demotion_multiplies_by_decay() {
        let mut table = WeightTable::new();
        table.reinforce("привет", Intent::Greet);
        table.demote("привет", Intent::Greet);
        assert!((table.weight("привет", Intent::Greet) - 1.1 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_weights_stay_positive() {
        let mut table = WeightTable::new();
        for _ in 0..1000 {
            table.demote("слово", Intent::Greet);
        }
        assert!(table.weight("слово", Intent::Greet) > 0.0);
    }

    #[test]
    fn test_priors_fall_back_to_seed() {
        let table = WeightTable::new();
        assert_eq!(table.prior(Intent::AskQuestion), 0.18);
        assert_eq!(table.prior(Intent::Unknown), 0.02);
    }

    #[test]
    fn test_priors_follow_observed_frequency() {
        let mut table = WeightTable::new();
        table.record_intent(Intent::Greet);
        table.record_intent(Intent::Greet);
        table.record_intent(Intent::SetGoal);
        table.record_intent(Intent::AskQuestion);

        assert!((table.prior(Intent::Greet) - 0.5).abs() < 1e-12);
        assert!((table.prior(Intent::SetGoal) - 0.25).abs() < 1e-12);
        assert_eq!(table.prior(Intent::Shutdown), 0.0);
    }

    #[test]
    fn test_prior_strictly_increases_with_reinforcement() {
        let mut table = WeightTable::new();
        // Mixed base so the reinforced intent's share can still grow.
        table.record_intent(Intent::Greet);
        table.record_intent(Intent::SetGoal);
        table.record_intent(Intent::AskQuestion);

        let mut last = table.prior(Intent::SetGoal);
        for _ in 0..20 {
            table.record_intent(Intent::SetGoal);
            let now = table.prior(Intent::SetGoal);
            assert!(now > last, "prior did not increase: {last} -> {now}");
            last = now;
        }
    }
}
