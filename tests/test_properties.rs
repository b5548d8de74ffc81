//! Property-based tests for the engine and detector.

use contexture::config::DetectorConfig;
use contexture::context::ContextId;
use contexture::crosser::ContextCrosser;
use contexture::detector::AnomalyDetector;
use contexture::fact::{is_normalized, normalize, Fact};
use contexture::semi_context::SemiContextIndex;
use proptest::collection::vec;
use proptest::prelude::*;

fn to_facts(raw: &[u32]) -> Vec<Fact> {
    let mut facts: Vec<Fact> = raw.iter().copied().map(Fact::new).collect();
    normalize(&mut facts);
    facts
}

/// Run a full stream through a fresh engine, detector-style, returning the
/// forecast of every step.
fn drive(engine: &mut ContextCrosser, stream: &[Vec<Fact>]) -> Vec<Vec<Fact>> {
    let mut predictions = Vec::new();
    let mut prev: Option<Vec<Fact>> = None;
    for facts in stream {
        let proposal = match prev.as_deref() {
            Some(p) if !p.is_empty() && !facts.is_empty() => Some((p, facts.as_slice())),
            _ => None,
        };
        let right = engine.cross_right(facts, proposal);
        assert!(right.active.len() <= right.num_selected);
        let left = engine.cross_left(facts, &right.candidates);
        predictions.push(left.prediction);
        prev = Some(facts.clone());
    }
    predictions
}

// =============================================================================
// Property-Based Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_register_is_idempotent(sets in vec(vec(0u32..50, 1..6), 1..30)) {
        let mut index = SemiContextIndex::new();
        let mut first_ids = Vec::new();
        for set in &sets {
            first_ids.push(index.register(&to_facts(set)));
        }
        let population = index.len();

        for (set, &expected) in sets.iter().zip(&first_ids) {
            prop_assert_eq!(index.register(&to_facts(set)), expected);
        }
        prop_assert_eq!(index.len(), population);
    }

    #[test]
    fn prop_counters_never_invert(raw_stream in vec(vec(0u32..20, 1..5), 1..60)) {
        let stream: Vec<Vec<Fact>> = raw_stream.iter().map(|s| to_facts(s)).collect();
        let mut engine = ContextCrosser::new(5);
        drive(&mut engine, &stream);

        for id in 0..engine.num_contexts() {
            let ctx = engine.context(ContextId::from_raw(id as u32));
            prop_assert!(ctx.c1() <= ctx.c0());
            let weight = ctx.prediction_weight();
            prop_assert!((0.0..=1.0).contains(&weight));
        }
    }

    #[test]
    fn prop_forecasts_are_normalized(raw_stream in vec(vec(0u32..20, 1..5), 1..60)) {
        let stream: Vec<Vec<Fact>> = raw_stream.iter().map(|s| to_facts(s)).collect();
        let mut engine = ContextCrosser::new(5);
        for prediction in drive(&mut engine, &stream) {
            prop_assert!(is_normalized(&prediction));
        }
    }

    #[test]
    fn prop_replay_is_deterministic(raw_stream in vec(vec(0u32..15, 1..4), 1..40)) {
        let stream: Vec<Vec<Fact>> = raw_stream.iter().map(|s| to_facts(s)).collect();

        let mut first = ContextCrosser::new(7);
        let mut second = ContextCrosser::new(7);
        prop_assert_eq!(drive(&mut first, &stream), drive(&mut second, &stream));
        prop_assert_eq!(first.num_contexts(), second.num_contexts());
    }

    #[test]
    fn prop_growth_is_monotone(raw_stream in vec(vec(0u32..20, 1..5), 1..50)) {
        let stream: Vec<Vec<Fact>> = raw_stream.iter().map(|s| to_facts(s)).collect();
        let mut engine = ContextCrosser::new(5);

        let mut prev_contexts = 0;
        let mut prev_left = 0;
        let mut prev_right = 0;
        let mut prev: Option<Vec<Fact>> = None;
        for facts in &stream {
            let proposal = match prev.as_deref() {
                Some(p) if !p.is_empty() && !facts.is_empty() => Some((p, facts.as_slice())),
                _ => None,
            };
            let right = engine.cross_right(facts, proposal);
            engine.cross_left(facts, &right.candidates);

            prop_assert!(engine.num_contexts() >= prev_contexts);
            prop_assert!(engine.left().len() >= prev_left);
            prop_assert!(engine.right().len() >= prev_right);
            prev_contexts = engine.num_contexts();
            prev_left = engine.left().len();
            prev_right = engine.right().len();
            prev = Some(facts.clone());
        }
    }

    #[test]
    fn prop_detector_scores_in_unit_range(values in vec(-500.0..500.0f64, 1..120)) {
        let config = DetectorConfig::new(-100.0, 100.0).with_rest_period(8);
        let mut detector = AnomalyDetector::new(config).unwrap();

        for &value in &values {
            let score = detector.score(value);
            prop_assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
    }

    #[test]
    fn prop_detector_is_deterministic(values in vec(0.0..100.0f64, 1..80)) {
        let config = DetectorConfig::new(0.0, 100.0).with_rest_period(6);
        let mut first = AnomalyDetector::new(config.clone()).unwrap();
        let mut second = AnomalyDetector::new(config).unwrap();

        for &value in &values {
            prop_assert_eq!(first.score(value), second.score(value));
        }
    }

    #[test]
    fn prop_step_diagnostics_in_unit_range(raw_stream in vec(vec(0u32..25, 1..5), 1..60)) {
        let mut detector = AnomalyDetector::new(DetectorConfig::new(0.0, 100.0)).unwrap();

        for raw in &raw_stream {
            let out = detector.step(&to_facts(raw));
            prop_assert!((0.0..=1.0).contains(&out.pct_selected_active));
            prop_assert!((0.0..=1.0).contains(&out.pct_added_to_unique));
            prop_assert!(is_normalized(&out.prediction));
        }
    }
}
