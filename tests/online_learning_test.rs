//! Online learning loop: samples, feedback, and background retraining.

use std::time::Duration;

use parlance::intent::Intent;
use parlance::parser::{IntentParser, ParserConfig};
use parlance::training::TrainingConfig;

fn eager() -> IntentParser {
    IntentParser::advanced(ParserConfig::eager()).expect("parser construction")
}

#[test]
fn test_repeated_samples_raise_the_prior() {
    let parser = eager();
    parser
        .add_training_sample("привет", Intent::Greet, None, None)
        .unwrap();
    parser
        .add_training_sample("как дела?", Intent::AskQuestion, None, None)
        .unwrap();

    let mut last = parser.model().weights().prior(Intent::SetGoal);
    for i in 0..6 {
        parser
            .add_training_sample(&format!("поставь цель номер {i}"), Intent::SetGoal, None, None)
            .unwrap();
        let now = parser.model().weights().prior(Intent::SetGoal);
        assert!(now > last, "prior stalled at step {i}: {last} -> {now}");
        last = now;
    }
}

#[test]
fn test_feedback_demotes_and_corrects() {
    let parser = eager();
    let text = "расскажи о себе";

    // Seed the wrong intent so its weight sits above the smoothing floor.
    parser
        .add_training_sample(text, Intent::Greet, None, None)
        .unwrap();
    let weights = parser.model().weights();
    let (stem, before) = weights
        .iter_weights()
        .find(|((_, intent), _)| *intent == Intent::Greet)
        .map(|((stem, _), w)| (stem.clone(), *w))
        .expect("seeded weight");

    parser
        .provide_feedback(text, Intent::Greet, Intent::AskQuestion, 0.9)
        .unwrap();

    let after = parser.model().weights();
    let demoted = after.stored_weight(&stem, Intent::Greet).unwrap();
    assert!((demoted - before * 0.9).abs() < 1e-9);
    assert!(after.stored_weight(&stem, Intent::AskQuestion).is_some());
    assert_eq!(parser.training_sample_count(), 2);
}

#[test]
fn test_low_confidence_confirmation_reinforces() {
    let parser = eager();
    parser
        .provide_feedback("привет", Intent::Greet, Intent::Greet, 0.3)
        .unwrap();
    assert_eq!(parser.training_sample_count(), 1);

    parser
        .provide_feedback("привет", Intent::Greet, Intent::Greet, 0.95)
        .unwrap();
    assert_eq!(parser.training_sample_count(), 1);
}

#[test]
fn test_training_influences_classification() {
    let parser = eager();
    // A nonsense phrase no rule matches; teach it as InjectThought.
    let phrase = "фантасмагория квазимодо";
    for _ in 0..12 {
        parser
            .add_training_sample(phrase, Intent::InjectThought, None, None)
            .unwrap();
    }
    assert!(parser.wait_idle(Duration::from_secs(60)));

    let result = parser.classify(phrase);
    assert_eq!(result.intent, Intent::InjectThought);
}

#[test]
fn test_interval_triggers_background_retrain() {
    let config = ParserConfig {
        training: TrainingConfig {
            retrain_interval: 10,
            min_retrain_samples: 8,
            min_samples_for_weights: 0,
            grid_search: false,
            ..TrainingConfig::default()
        },
        ..ParserConfig::default()
    };
    let parser = IntentParser::advanced(config).unwrap();

    for i in 0..10 {
        let (text, intent) = if i % 2 == 0 {
            (format!("привет номер {i}"), Intent::Greet)
        } else {
            (format!("поставь цель номер {i}"), Intent::SetGoal)
        };
        parser
            .add_training_sample(&text, intent, None, None)
            .unwrap();
    }
    assert!(parser.wait_idle(Duration::from_secs(120)));

    let report = parser.last_report().expect("retrain report");
    assert!((0.0..=1.0).contains(&report.accuracy));
    assert_eq!(report.train_size + report.validation_size, 10);
    assert_eq!(parser.training_stats().retrains_completed, 1);
}

#[test]
fn test_cleanup_trims_oldest_samples() {
    let parser = eager();
    for i in 0..20 {
        parser
            .add_training_sample(&format!("привет {i}"), Intent::Greet, None, None)
            .unwrap();
    }
    assert_eq!(parser.training_sample_count(), 20);
    assert_eq!(parser.cleanup(5), 15);
    assert_eq!(parser.training_sample_count(), 5);
    assert_eq!(parser.cleanup(5), 0);
}

#[test]
fn test_wait_idle_is_deterministic() {
    let parser = eager();
    for i in 0..5 {
        parser
            .add_training_sample(&format!("привет {i}"), Intent::Greet, None, None)
            .unwrap();
    }
    assert!(parser.wait_idle(Duration::from_secs(60)));
    assert_eq!(parser.training_stats().online_updates, 5);
}

#[test]
fn test_empty_sample_is_ignored() {
    let parser = eager();
    parser
        .add_training_sample("   ", Intent::Greet, None, None)
        .unwrap();
    assert_eq!(parser.training_sample_count(), 0);
    assert_eq!(parser.model().weights().total_samples(), 0);
}
