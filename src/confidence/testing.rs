//! Test validation metric (weight 0.20)
//!
//! Edits to test files get the bonus path (full score). Everything else
//! is judged by whether the new code paths in the diff have discovered
//! coverage nearby.

use std::sync::LazyLock;

use regex::Regex;

use super::{fold_rules, MetricName, MetricResult, Rule, RuleOutcome, ScoreInput};

pub(crate) const WEIGHT: f32 = 0.20;

const RULES: &[Rule] = &[Rule {
    name: "coverage",
    check: coverage,
}];

pub(crate) fn evaluate(input: &ScoreInput) -> MetricResult {
    fold_rules(MetricName::TestValidation, WEIGHT, RULES, input)
}

static TESTABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bfunction\s+\w+|\bdef\s+\w+|\bfn\s+\w+|=>|\bif\b|\bswitch\b|\bfor\b|\bwhile\b|\bcatch\b|\bexcept\b",
    )
    .expect("hardcoded testable regex")
});

/// How many new patterns count as outgrowing the existing coverage
const PARTIAL_COVERAGE_THRESHOLD: usize = 5;

fn coverage(input: &ScoreInput) -> RuleOutcome {
    // The changed file IS a test — that's the coverage
    if input.is_test_file {
        return RuleOutcome::clean();
    }

    let new_patterns: usize = input
        .changed_lines()
        .filter(|(_, text)| TESTABLE_PATTERN.is_match(text))
        .count();
    if new_patterns == 0 {
        return RuleOutcome::clean();
    }

    if input.discovered_tests == 0 {
        return RuleOutcome::flag(
            50,
            format!(
                "{} new code path(s) with no discovered test coverage",
                new_patterns
            ),
            None,
        );
    }

    if new_patterns >= PARTIAL_COVERAGE_THRESHOLD {
        return RuleOutcome::flag(
            20,
            format!(
                "{} new code path(s) may outgrow the {} discovered test file(s)",
                new_patterns, input.discovered_tests
            ),
            None,
        );
    }

    RuleOutcome::clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::changed_region;
    use crate::confidence::testutil::input_fixture;
    use crate::diff::ChangeSet;

    #[test]
    fn test_test_file_edit_gets_bonus_path() {
        let after = "function brandNew() {\n  if (x) {}\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let mut input = input_fixture(&region, after, &[], &changes);
        input.is_test_file = true;

        assert_eq!(evaluate(&input).score, 100);
    }

    #[test]
    fn test_no_new_patterns_full_score() {
        let after = "const LABEL = 'total';\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);
        assert_eq!(evaluate(&input).score, 100);
    }

    #[test]
    fn test_new_code_without_tests_penalized() {
        let after = "function brandNew(x: number) {\n  if (x > 0) { return x; }\n  return 0;\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert_eq!(result.score, 50);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_small_change_with_tests_full_score() {
        let after = "function tweak(x: number) { return x; }\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let mut input = input_fixture(&region, after, &[], &changes);
        input.discovered_tests = 2;

        assert_eq!(evaluate(&input).score, 100);
    }

    #[test]
    fn test_large_change_with_tests_partially_penalized() {
        let after = "\
function a() {}\nfunction b() {}\nfunction c() {}\nif (x) {}\nwhile (y) {}\nfor (;;) {}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let mut input = input_fixture(&region, after, &[], &changes);
        input.discovered_tests = 1;

        assert_eq!(evaluate(&input).score, 80);
    }
}
