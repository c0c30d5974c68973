//! Scorer invariants, including property tests over arbitrary edits

use proptest::prelude::*;

use ripple::{
    changed_region, semantic_diff, ChangeSet, ScoreInput, Status, StructuralInventory,
};

fn score_edit(before: &str, after: &str) -> ripple::ConfidenceResult {
    let region = changed_region(before, after);
    let changes = ChangeSet::default();
    ripple::confidence::score(&ScoreInput {
        region: &region,
        current_text: after,
        prior_text: Some(before),
        diagnostics: &[],
        is_test_file: false,
        discovered_tests: 0,
        changes: &changes,
    })
}

#[test]
fn test_six_metrics_with_fixed_weights() {
    let result = score_edit("", "const x = 1;\n");
    assert_eq!(result.metrics.len(), 6);

    let weight_of = |name: ripple::MetricName| {
        result
            .metrics
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.weight)
            .unwrap()
    };
    assert_eq!(weight_of(ripple::MetricName::Correctness), 0.10);
    assert_eq!(weight_of(ripple::MetricName::Security), 0.25);
    assert_eq!(weight_of(ripple::MetricName::TestValidation), 0.20);
    assert_eq!(weight_of(ripple::MetricName::Contracts), 0.15);
    assert_eq!(weight_of(ripple::MetricName::ChangeRisk), 0.10);
    assert_eq!(weight_of(ripple::MetricName::Hygiene), 0.0);
}

#[test]
fn test_status_matches_total() {
    let result = score_edit("", "const x = 1;\n");
    assert_eq!(result.status, Status::from_total(result.total));
}

#[test]
fn test_secret_monotonicity_at_api_level() {
    let before = "function configure() {\n}\n";
    let clean = "function configure() {\n  const region = 'us-east-1';\n}\n";
    let leaky = "function configure() {\n  const region = 'us-east-1';\n  const apiKey = \"sk_live_abcdef1234567890abcd\";\n}\n";

    let clean_result = score_edit(before, clean);
    let leaky_result = score_edit(before, leaky);

    let security = |r: &ripple::ConfidenceResult| {
        r.metrics
            .iter()
            .find(|m| m.name == ripple::MetricName::Security)
            .unwrap()
            .score
    };
    assert!(security(&leaky_result) < security(&clean_result));
    assert!(leaky_result.total <= clean_result.total);
}

proptest! {
    #[test]
    fn prop_total_always_in_band(before in "[ -~\n]{0,400}", after in "[ -~\n]{0,400}") {
        let result = score_edit(&before, &after);
        prop_assert!(result.total <= 100);
        prop_assert_eq!(result.status, Status::from_total(result.total));
        for metric in &result.metrics {
            prop_assert!(metric.score <= 100);
        }
    }

    #[test]
    fn prop_identical_texts_score_maximal(text in "[ -~\n]{0,400}") {
        let result = score_edit(&text, &text);
        prop_assert_eq!(result.total, 100);
    }

    #[test]
    fn prop_semantic_diff_fast_path(text in "[ -~\n]{0,400}") {
        let scanner = StructuralInventory::new();
        let inv = scanner.scan(&text, None);
        let diff = semantic_diff(&text, &text, &inv, &inv);
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn prop_scoring_is_deterministic(before in "[ -~\n]{0,200}", after in "[ -~\n]{0,200}") {
        let a = score_edit(&before, &after);
        let b = score_edit(&before, &after);
        prop_assert_eq!(a.total, b.total);
    }
}
