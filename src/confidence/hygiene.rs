//! Code hygiene metric (weight 0.0 — informational only)
//!
//! Style findings that never move the total: indentation mixing, trailing
//! whitespace, naming drift, undocumented new exports. Surfaced so a host
//! can show them; scored so the band math stays uniform.

use std::sync::LazyLock;

use regex::Regex;

use super::{fold_rules, MetricName, MetricResult, Rule, RuleOutcome, ScoreInput};

pub(crate) const WEIGHT: f32 = 0.0;

const RULES: &[Rule] = &[
    Rule {
        name: "indentation",
        check: indentation,
    },
    Rule {
        name: "trailing_whitespace",
        check: trailing_whitespace,
    },
    Rule {
        name: "naming_drift",
        check: naming_drift,
    },
    Rule {
        name: "undocumented_export",
        check: undocumented_export,
    },
];

pub(crate) fn evaluate(input: &ScoreInput) -> MetricResult {
    fold_rules(MetricName::Hygiene, WEIGHT, RULES, input)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Tabs-vs-spaces mixing, and indents off the dominant width
fn indentation(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    let mut saw_tab = false;
    let mut saw_space = false;
    let mut space_widths: Vec<usize> = Vec::new();

    for (_, text) in input.changed_lines() {
        let indent: String = text.chars().take_while(|c| c.is_whitespace()).collect();
        if indent.contains('\t') {
            saw_tab = true;
        }
        if indent.contains(' ') {
            saw_space = true;
            if !indent.contains('\t') && !indent.is_empty() {
                space_widths.push(indent.len());
            }
        }
    }

    if saw_tab && saw_space {
        out.add(10, "Mixed tabs and spaces in changed lines", None);
    }

    // Indent widths that are neither multiples of 2 nor consistent
    if space_widths.iter().any(|w| w % 2 != 0) && space_widths.iter().any(|w| w % 2 == 0) {
        out.add(5, "Inconsistent indentation width", None);
    }

    out
}

fn trailing_whitespace(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    let mut penalty = 0u32;
    for (line_no, text) in input.changed_lines() {
        if text != text.trim_end() && !text.trim().is_empty() {
            penalty += 5;
            if out.issues.is_empty() {
                out.issues.push(super::Issue {
                    message: "Trailing whitespace on changed lines".to_string(),
                    line: Some(line_no),
                });
            }
        }
    }
    out.penalty = penalty.min(15);
    out
}

static SNAKE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var|function)\s+[a-z]+_[a-z]").expect("hardcoded naming regex")
});
static CAMEL_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var|function)\s+[a-z]+[A-Z]").expect("hardcoded naming regex")
});

/// Both snake_case and camelCase declarations introduced by one edit
fn naming_drift(input: &ScoreInput) -> RuleOutcome {
    let text = input.region.text();
    if SNAKE_DECL.is_match(&text) && CAMEL_DECL.is_match(&text) {
        RuleOutcome::flag(5, "Mixed naming conventions in changed code", None)
    } else {
        RuleOutcome::clean()
    }
}

static EXPORTED_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*export\s+(?:default\s+)?(?:async\s+)?function\s+\w+|^\s*pub(?:\([^)]*\))?\s+(?:async\s+)?fn\s+\w+")
        .expect("hardcoded export regex")
});
static DOC_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*/\s*$|^\s*//|^\s*///|^\s*#").expect("hardcoded doc regex"));

/// New exported functions without a doc comment directly above
fn undocumented_export(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    for (line_no, text) in input.changed_lines() {
        if !EXPORTED_FUNCTION.is_match(text) {
            continue;
        }
        let above = input.window_ending_at(line_no.saturating_sub(1), 1);
        let documented = above.last().is_some_and(|l| DOC_TAIL.is_match(l));
        if !documented {
            out.add(
                10,
                "New exported function without a doc comment",
                Some(line_no),
            );
        }
    }
    out.penalty = out.penalty.min(30);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::changed_region;
    use crate::confidence::testutil::input_fixture;
    use crate::diff::ChangeSet;

    #[test]
    fn test_weight_is_zero() {
        let after = "const x = 1;\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);
        assert_eq!(evaluate(&input).weight, 0.0);
    }

    #[test]
    fn test_mixed_indentation_flagged() {
        let after = "function f() {\n\tconst a = 1;\n  const b = 2;\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert!(result.score < 100);
        assert!(result
            .issues
            .iter()
            .any(|i| i.message.contains("tabs and spaces")));
    }

    #[test]
    fn test_trailing_whitespace_flagged() {
        let after = "const a = 1;   \n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);
        assert_eq!(evaluate(&input).score, 95);
    }

    #[test]
    fn test_naming_drift_flagged() {
        let after = "const user_name = 'a';\nconst userAge = 3;\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert!(result
            .issues
            .iter()
            .any(|i| i.message.contains("naming conventions")));
    }

    #[test]
    fn test_documented_export_clean() {
        let after = "/** Adds two numbers. */\nexport function add(a: number, b: number) { return a + b; }\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert!(!result
            .issues
            .iter()
            .any(|i| i.message.contains("doc comment")));
    }

    #[test]
    fn test_undocumented_export_flagged() {
        let after = "export function add(a: number, b: number) { return a + b; }\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert!(result
            .issues
            .iter()
            .any(|i| i.message.contains("doc comment")));
    }
}
