//! Contracts & architecture metric (weight 0.15)
//!
//! An actual signature change to an exported symbol is a breaking-API
//! penalty — the change set already encodes "actually changed" (removed
//! or signature-differing, same rule family as the diff engine), so body
//! edits never land here. Also flags deep cross-layer imports and schema
//! migration statements showing up in the diff.

use std::sync::LazyLock;

use regex::Regex;

use super::{fold_rules, MetricName, MetricResult, Rule, RuleOutcome, ScoreInput};

pub(crate) const WEIGHT: f32 = 0.15;

const RULES: &[Rule] = &[
    Rule {
        name: "breaking_api",
        check: breaking_api,
    },
    Rule {
        name: "deep_imports",
        check: deep_imports,
    },
    Rule {
        name: "schema_migration",
        check: schema_migration,
    },
];

pub(crate) fn evaluate(input: &ScoreInput) -> MetricResult {
    fold_rules(MetricName::Contracts, WEIGHT, RULES, input)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Fixed penalty for the first breaking change
const BREAKING_PENALTY: u32 = 30;
/// Each further broken symbol, capped
const EXTRA_SYMBOL_PENALTY: u32 = 5;
const EXTRA_SYMBOL_CAP: u32 = 20;

fn breaking_api(input: &ScoreInput) -> RuleOutcome {
    let exported: Vec<&str> = input
        .changes
        .symbols()
        .filter(|name| is_exported(name, input.current_text, input.prior_text))
        .collect();

    if exported.is_empty() {
        return RuleOutcome::clean();
    }

    let mut out = RuleOutcome::flag(
        BREAKING_PENALTY,
        format!("Breaking change to exported API: {}", exported[0]),
        None,
    );
    let extra =
        (EXTRA_SYMBOL_PENALTY * (exported.len() as u32 - 1)).min(EXTRA_SYMBOL_CAP);
    if extra > 0 {
        out.add(
            extra,
            format!("{} further exported symbol(s) changed", exported.len() - 1),
            None,
        );
    }
    out
}

static EXPORT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\b|\bpub\b").expect("hardcoded export regex"));

/// Is this symbol part of the file's public surface?
///
/// Languages with export keywords: the symbol must appear on an exported
/// declaration line in either version. Languages without them (Python):
/// every non-underscore name is public.
fn is_exported(name: &str, current: &str, prior: Option<&str>) -> bool {
    let texts = [Some(current), prior];
    let any_export_markers = texts
        .iter()
        .flatten()
        .any(|t| EXPORT_MARKER.is_match(t));
    if !any_export_markers {
        return !name.starts_with('_');
    }

    let n = regex::escape(name);
    let exported_decl = Regex::new(&format!(
        r"\b(?:export\s+(?:default\s+)?(?:async\s+)?(?:function|class|const|let|var|abstract)\b[^\n]*\b{n}\b)|(?:\bpub(?:\([^)]*\))?\s+(?:async\s+)?(?:unsafe\s+)?(?:fn|struct|enum)\s+{n}\b)"
    ))
    .expect("export regex from escaped name");

    texts
        .iter()
        .flatten()
        .any(|t| exported_decl.is_match(t))
}

static DEEP_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:import|require|from)\s*\(?\s*["'](?:\.\./){3,}"#)
        .expect("hardcoded import regex")
});

fn deep_imports(input: &ScoreInput) -> RuleOutcome {
    let mut out = RuleOutcome::clean();
    for (line_no, text) in input.changed_lines() {
        if DEEP_IMPORT.is_match(text) {
            out.add(10, "Deep cross-layer relative import", Some(line_no));
        }
    }
    out.penalty = out.penalty.min(20);
    out
}

static SCHEMA_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ALTER\s+TABLE|CREATE\s+TABLE|DROP\s+TABLE|ADD\s+COLUMN|DROP\s+COLUMN|CREATE\s+INDEX|migration)\b")
        .expect("hardcoded schema regex")
});

fn schema_migration(input: &ScoreInput) -> RuleOutcome {
    for (line_no, text) in input.changed_lines() {
        if SCHEMA_STATEMENT.is_match(text) {
            return RuleOutcome::flag(
                15,
                "Schema migration statement in changed code",
                Some(line_no),
            );
        }
    }
    RuleOutcome::clean()
}
