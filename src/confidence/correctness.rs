//! Code correctness metric (weight 0.10)
//!
//! Composite of six internally-weighted sub-checks: syntax, types,
//! critical patterns, complexity, lint noise, and guard coverage. Each
//! sub-check is its own rule fold scored 0-100; the metric is their
//! weighted average.

use std::sync::LazyLock;

use regex::Regex;

use super::{Issue, MetricName, MetricResult, RuleOutcome, ScoreInput, SubMetric};
use crate::diagnostics::Severity;

pub(crate) const WEIGHT: f32 = 0.10;

struct SubCheck {
    name: &'static str,
    weight: f32,
    check: fn(&ScoreInput) -> RuleOutcome,
}

/// Internal weights: 25/20/25/15/10/5
const SUB_CHECKS: &[SubCheck] = &[
    SubCheck {
        name: "syntax",
        weight: 0.25,
        check: syntax,
    },
    SubCheck {
        name: "types",
        weight: 0.20,
        check: types,
    },
    SubCheck {
        name: "critical",
        weight: 0.25,
        check: critical,
    },
    SubCheck {
        name: "complexity",
        weight: 0.15,
        check: complexity,
    },
    SubCheck {
        name: "lint",
        weight: 0.10,
        check: lint,
    },
    SubCheck {
        name: "guards",
        weight: 0.05,
        check: guards,
    },
];

pub(crate) fn evaluate(input: &ScoreInput) -> MetricResult {
    let mut sub_metrics = Vec::with_capacity(SUB_CHECKS.len());
    let mut issues: Vec<Issue> = Vec::new();
    let mut weighted = 0.0f32;
    let mut weight_sum = 0.0f32;

    for sub in SUB_CHECKS {
        let outcome = (sub.check)(input);
        let score = 100u32.saturating_sub(outcome.penalty);
        weighted += score as f32 * sub.weight;
        weight_sum += sub.weight;
        issues.extend(outcome.issues);
        sub_metrics.push(SubMetric {
            name: sub.name,
            score,
            weight: sub.weight,
        });
    }

    let score = if weight_sum == 0.0 {
        100
    } else {
        (weighted / weight_sum).clamp(0.0, 100.0).round() as u32
    };

    MetricResult {
        name: MetricName::Correctness,
        score,
        weight: WEIGHT,
        issues,
        sub_metrics,
    }
}

// ─── Sub-checks ──────────────────────────────────────────────────────────────

static CONFLICT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<{7}|={7}|>{7})(?:\s|$)").expect("hardcoded marker regex")
});
static PARSE_ERROR_MSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)unexpected|expected|syntax|unterminated").expect("hardcoded message regex")
});

/// Parse errors, merge-conflict markers, bracket imbalance
fn syntax(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();

    for diag in input.changed_diagnostics() {
        if diag.severity == Severity::Error && PARSE_ERROR_MSG.is_match(&diag.message) {
            out.add(25, format!("Syntax error: {}", diag.message), Some(diag.line));
        }
    }

    for (line_no, text) in input.changed_lines() {
        if CONFLICT_MARKER.is_match(text) {
            out.add(30, "Merge conflict marker left in code", Some(line_no));
        }
    }

    let text = input.region.text();
    let balance = bracket_balance(&text);
    if balance.abs() > 1 {
        out.add(20, "Unbalanced brackets in changed code", None);
    }

    out
}

/// Net open-minus-close across (), [], {} — crude but cheap
fn bracket_balance(text: &str) -> i32 {
    let mut balance = 0i32;
    for b in text.bytes() {
        match b {
            b'(' | b'[' | b'{' => balance += 1,
            b')' | b']' | b'}' => balance -= 1,
            _ => {}
        }
    }
    balance
}

static TYPE_ERROR_MSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btype\b|not assignable|cannot find name").expect("hardcoded message regex")
});
static UNTYPED_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfunction\s+\w+\s*\(([^):]*)\)\s*\{").expect("hardcoded function regex")
});

/// Type-error diagnostics and missing annotations on new functions
fn types(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();

    let mut diag_penalty = 0u32;
    for diag in input.changed_diagnostics() {
        if diag.severity == Severity::Error && TYPE_ERROR_MSG.is_match(&diag.message) {
            diag_penalty += 20;
            out.issues.push(Issue {
                message: format!("Type error: {}", diag.message),
                line: Some(diag.line),
            });
        }
    }
    out.penalty += diag_penalty.min(60);

    for (line_no, text) in input.changed_lines() {
        if let Some(caps) = UNTYPED_FUNCTION.captures(text) {
            let params = &caps[1];
            if !params.trim().is_empty() && !params.contains(':') {
                out.add(
                    10,
                    "New function takes untyped parameters",
                    Some(line_no),
                );
            }
        }
    }

    out
}

static DYNAMIC_EVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\beval\s*\(|\bnew\s+Function\s*\(|\bexec\s*\(").expect("hardcoded eval regex")
});
static FLOW_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:return\b|throw\b|break\s*;|continue\s*;|raise\b)")
        .expect("hardcoded exit regex")
});

/// Critical diagnostics, unreachable code, dynamic evaluation
fn critical(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();

    let mut diag_penalty = 0u32;
    for diag in input.changed_diagnostics() {
        if diag.severity == Severity::Error {
            diag_penalty += 20;
            out.issues.push(Issue {
                message: format!("Error diagnostic: {}", diag.message),
                line: Some(diag.line),
            });
        }
    }
    out.penalty += diag_penalty.min(60);

    // Unreachable: a statement directly after an exit at the same indent
    let lines: Vec<(u32, &str)> = input.changed_lines().collect();
    for pair in lines.windows(2) {
        let (prev_no, prev) = pair[0];
        let (next_no, next) = pair[1];
        if next_no == prev_no + 1
            && FLOW_EXIT.is_match(prev)
            && !next.trim().is_empty()
            && indent_of(prev) == indent_of(next)
            && !next.trim().starts_with('}')
            && !next.trim().starts_with("case ")
            && !next.trim().starts_with("default:")
        {
            out.add(15, "Statement after unconditional exit", Some(next_no));
        }
    }

    for (line_no, text) in input.changed_lines() {
        if DYNAMIC_EVAL.is_match(text) {
            out.add(25, "Dynamic code evaluation", Some(line_no));
        }
    }

    out
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

static CONTROL_FLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bif\b|\bfor\b|\bwhile\b|\bswitch\b|\bcase\b|\bcatch\b|\bexcept\b|&&|\|\||\?")
        .expect("hardcoded flow regex")
});

/// Counts control-flow tokens — the branch-count proxy the complexity and
/// risk rules share
pub(crate) fn control_flow_count(text: &str) -> usize {
    CONTROL_FLOW.find_iter(text).count()
}

/// Branch density, nesting depth, oversized diffs, repeated lines
fn complexity(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    let text = input.region.text();

    let branches = control_flow_count(&text);
    if branches > 15 {
        out.add(20, format!("High branch density: {} control-flow tokens", branches), None);
    } else if branches > 8 {
        out.add(10, format!("Elevated branch density: {} control-flow tokens", branches), None);
    }

    let depth = max_nesting_depth(&text);
    if depth > 4 {
        out.add(15, format!("Deep nesting ({} levels)", depth), None);
    }

    let changed = input.region.len();
    if changed > 400 {
        out.add(20, format!("Very large change ({} lines)", changed), None);
    } else if changed > 200 {
        out.add(10, format!("Large change ({} lines)", changed), None);
    }

    if let Some((count, line_no)) = most_repeated_line(input) {
        if count >= 3 {
            out.add(10, "Identical line repeated in change", Some(line_no));
        }
    }

    out
}

fn max_nesting_depth(text: &str) -> usize {
    let mut depth = 0i32;
    let mut max = 0i32;
    for b in text.bytes() {
        match b {
            b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b'}' => depth -= 1,
            _ => {}
        }
    }
    max.max(0) as usize
}

fn most_repeated_line(input: &ScoreInput) -> Option<(usize, u32)> {
    use std::collections::HashMap;
    let mut counts: HashMap<&str, (usize, u32)> = HashMap::new();
    for (line_no, text) in input.changed_lines() {
        let trimmed = text.trim();
        if trimmed.len() < 8 {
            continue; // braces, `else`, etc. repeat legitimately
        }
        let entry = counts.entry(trimmed).or_insert((0, line_no));
        entry.0 += 1;
    }
    counts.values().max_by_key(|(count, _)| *count).copied()
}

static SINGLE_CHAR_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+[a-z]\s*=").expect("hardcoded naming regex")
});
static MAGIC_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w.]\d{3,}(?:\.\d+)?\b").expect("hardcoded number regex")
});
static CONST_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const\s+[A-Z_]+\s*=|static\b|final\b)").expect("hardcoded const regex")
});

/// Warning/info diagnostics plus naming and magic-number smells
fn lint(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();

    let mut warn_penalty = 0u32;
    let mut info_penalty = 0u32;
    for diag in input.changed_diagnostics() {
        match diag.severity {
            Severity::Warning => warn_penalty += 5,
            Severity::Info | Severity::Hint => info_penalty += 2,
            Severity::Error => {}
        }
    }
    if warn_penalty > 0 {
        out.add(warn_penalty.min(25), "Warning diagnostics in changed code", None);
    }
    if info_penalty > 0 {
        out.add(info_penalty.min(10), "Informational diagnostics in changed code", None);
    }

    let mut naming = 0u32;
    let mut magic = 0u32;
    for (line_no, text) in input.changed_lines() {
        if SINGLE_CHAR_DECL.is_match(text) {
            naming += 5;
            out.issues.push(Issue {
                message: "Single-letter variable name".to_string(),
                line: Some(line_no),
            });
        }
        if MAGIC_NUMBER.is_match(text) && !CONST_DECL.is_match(text) {
            magic += 5;
            out.issues.push(Issue {
                message: "Magic number outside a named constant".to_string(),
                line: Some(line_no),
            });
        }
    }
    out.penalty += naming.min(10) + magic.min(10);

    out
}

static RISKY_OP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"JSON\.parse\s*\(|\bparseInt\s*\(|\bparseFloat\s*\(|await\s+fetch\b|\.unwrap\(\)|\[\s*0\s*\]|/\s*[a-zA-Z_]\w*\b",
    )
    .expect("hardcoded risky-op regex")
});
static GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bif\b|\btry\b|\bcatch\b|\bexcept\b|\?\.|\?\?|\bisNaN\b|\.length\b|\bOption\b|\bResult\b|unwrap_or")
        .expect("hardcoded guard regex")
});

/// Lookback window for guard detection, in lines
const GUARD_WINDOW: usize = 3;

/// Risky operations without a guard pattern nearby
fn guards(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    for (line_no, text) in input.changed_lines() {
        if !RISKY_OP.is_match(text) {
            continue;
        }
        let window = input.window_ending_at(line_no, GUARD_WINDOW);
        let guarded = GUARD.is_match(text) || window.iter().any(|l| GUARD.is_match(l));
        if !guarded {
            out.add(15, "Risky operation without a nearby guard", Some(line_no));
        }
    }
    out.penalty = out.penalty.min(45);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::changed_region;
    use crate::confidence::testutil::input_fixture;
    use crate::diagnostics::Diagnostic;
    use crate::diff::ChangeSet;

    #[test]
    fn test_clean_edit_full_score() {
        let after = "function add(a: number, b: number): number {\n  return a + b;\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        assert_eq!(result.score, 100);
        assert_eq!(result.sub_metrics.len(), 6);
        assert!(result.sub_metrics.iter().all(|s| s.score == 100));
    }

    #[test]
    fn test_conflict_marker_hits_syntax() {
        let after = "<<<<<<< HEAD\nconst x = 1;\n=======\nconst x = 2;\n>>>>>>> feature\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        let syntax = result.sub_metrics.iter().find(|s| s.name == "syntax").unwrap();
        assert_eq!(syntax.score, 10, "three markers at 30 each");
        assert!(result.score < 100);
    }

    #[test]
    fn test_syntax_diagnostic_counts() {
        let after = "const x = ;\n";
        let region = changed_region("", after);
        let diags = vec![Diagnostic::new(1, Severity::Error, "Expression expected")];
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &diags, &changes);

        let result = evaluate(&input);
        let syntax = result.sub_metrics.iter().find(|s| s.name == "syntax").unwrap();
        assert_eq!(syntax.score, 75);
    }

    #[test]
    fn test_type_error_diagnostic_counts() {
        let after = "const x: number = 'oops';\n";
        let region = changed_region("", after);
        let diags = vec![Diagnostic::new(
            1,
            Severity::Error,
            "Type 'string' is not assignable to type 'number'",
        )];
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &diags, &changes);

        let result = evaluate(&input);
        let types = result.sub_metrics.iter().find(|s| s.name == "types").unwrap();
        assert_eq!(types.score, 80);
    }

    #[test]
    fn test_diagnostic_outside_region_ignored() {
        let after = "const ok = 1;\n";
        let region = changed_region("", after);
        // Anchored to line 40 — far outside the one changed line
        let diags = vec![Diagnostic::new(40, Severity::Error, "Type mismatch")];
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &diags, &changes);
        assert_eq!(evaluate(&input).score, 100);
    }

    #[test]
    fn test_unreachable_code_detected() {
        let after = "function f() {\n  return 1;\n  doWork();\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        let critical = result.sub_metrics.iter().find(|s| s.name == "critical").unwrap();
        assert_eq!(critical.score, 85);
    }

    #[test]
    fn test_untyped_function_params() {
        let after = "function process(data, options) {\n  return data;\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        let types = result.sub_metrics.iter().find(|s| s.name == "types").unwrap();
        assert_eq!(types.score, 90);
    }

    #[test]
    fn test_guard_lookback_accepts_nearby_if() {
        let after = "if (raw.length > 0) {\n  const parsed = JSON.parse(raw);\n}\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        let guards = result.sub_metrics.iter().find(|s| s.name == "guards").unwrap();
        assert_eq!(guards.score, 100);
    }

    #[test]
    fn test_unguarded_parse_penalized() {
        let after = "const a = 1;\nconst b = 2;\nconst c = 3;\nconst parsed = JSON.parse(raw);\n";
        let region = changed_region("", after);
        let changes = ChangeSet::default();
        let input = input_fixture(&region, after, &[], &changes);

        let result = evaluate(&input);
        let guards = result.sub_metrics.iter().find(|s| s.name == "guards").unwrap();
        assert_eq!(guards.score, 85);
    }

    #[test]
    fn test_control_flow_count() {
        assert_eq!(control_flow_count("if (a && b) { while (c) {} }"), 3);
        assert_eq!(control_flow_count("const x = 1;"), 0);
    }
}
