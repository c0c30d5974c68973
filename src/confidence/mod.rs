//! Confidence scoring over a changed region
//!
//! Six independently-scored metrics, combined by weight into a single
//! 0-100 score and status band. Every heuristic is a self-contained pure
//! rule `(input) -> (penalty, issues)`; a metric is a fold over its
//! ordered rule list, which keeps each rule unit-testable on its own.
//!
//! All rules look only at the changed lines (plus small fixed lookback
//! windows for guard detection) — never the whole file — so the signal
//! stays tied to the actual edit.

mod contracts;
mod correctness;
mod hygiene;
mod risk;
mod security;
mod testing;

use serde::Serialize;

use crate::changes::ChangedRegion;
use crate::diagnostics::Diagnostic;
use crate::diff::ChangeSet;

/// Closed set of metric names — the aggregation formula is statically
/// checkable against exactly these six.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Correctness,
    Security,
    TestValidation,
    Contracts,
    ChangeRisk,
    Hygiene,
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricName::Correctness => write!(f, "correctness"),
            MetricName::Security => write!(f, "security"),
            MetricName::TestValidation => write!(f, "test_validation"),
            MetricName::Contracts => write!(f, "contracts"),
            MetricName::ChangeRisk => write!(f, "change_risk"),
            MetricName::Hygiene => write!(f, "hygiene"),
        }
    }
}

/// Status band derived from the aggregated score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    High,
    Acceptable,
    Warning,
    Critical,
}

impl Status {
    /// Band thresholds: `>85` high, `70-85` acceptable, `50-69` warning,
    /// `<50` critical
    pub fn from_total(total: u32) -> Self {
        match total {
            86.. => Status::High,
            70..=85 => Status::Acceptable,
            50..=69 => Status::Warning,
            _ => Status::Critical,
        }
    }
}

/// A single detected problem, anchored to a line when known
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub message: String,
    pub line: Option<u32>,
}

/// One internally-weighted sub-check of a composite metric
#[derive(Debug, Clone, Serialize)]
pub struct SubMetric {
    pub name: &'static str,
    pub score: u32,
    pub weight: f32,
}

/// One scored metric
#[derive(Debug, Clone, Serialize)]
pub struct MetricResult {
    pub name: MetricName,
    /// 0-100, starts at 100 and loses points per detected issue
    pub score: u32,
    /// Contribution to the total; 0.0 means informational only
    pub weight: f32,
    pub issues: Vec<Issue>,
    pub sub_metrics: Vec<SubMetric>,
}

/// Aggregated confidence for one analysis
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceResult {
    /// `round(clamp(Σ score·weight / Σ weight, 0, 100))`
    pub total: u32,
    pub status: Status,
    pub metrics: Vec<MetricResult>,
}

/// Everything the rules are allowed to look at
pub struct ScoreInput<'a> {
    /// Lines the edit touched
    pub region: &'a ChangedRegion,
    /// Full current text (for lookback windows only)
    pub current_text: &'a str,
    /// Prior text when a baseline was resolved
    pub prior_text: Option<&'a str>,
    /// Live diagnostics for the file
    pub diagnostics: &'a [Diagnostic],
    /// Whether the analyzed file is itself a test file
    pub is_test_file: bool,
    /// Number of discovered nearby test files
    pub discovered_tests: usize,
    /// Symbols whose contract actually changed
    pub changes: &'a ChangeSet,
}

impl<'a> ScoreInput<'a> {
    /// Changed lines as `(line number, text)` pairs
    pub(crate) fn changed_lines(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.region.lines.iter().map(|l| (l.number, l.text.as_str()))
    }

    /// Diagnostics anchored inside the changed region
    pub(crate) fn changed_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(|d| self.region.contains(d.line))
    }

    /// Up to `k` lines of current text ending at (and including) `line`.
    /// This is the fixed-size lookback window guard detection uses.
    pub(crate) fn window_ending_at(&self, line: u32, k: usize) -> Vec<&'a str> {
        let lines: Vec<&str> = self.current_text.lines().collect();
        let end = (line as usize).min(lines.len());
        let start = end.saturating_sub(k);
        lines[start..end].to_vec()
    }
}

// ─── Rule machinery ──────────────────────────────────────────────────────────

/// What one rule found
pub(crate) struct RuleOutcome {
    pub penalty: u32,
    pub issues: Vec<Issue>,
}

impl RuleOutcome {
    pub fn clean() -> Self {
        Self {
            penalty: 0,
            issues: Vec::new(),
        }
    }

    pub fn flag(penalty: u32, message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            penalty,
            issues: vec![Issue {
                message: message.into(),
                line,
            }],
        }
    }

    pub fn add(&mut self, penalty: u32, message: impl Into<String>, line: Option<u32>) {
        self.penalty += penalty;
        self.issues.push(Issue {
            message: message.into(),
            line,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.penalty == 0 && self.issues.is_empty()
    }
}

/// A named pure heuristic
pub(crate) struct Rule {
    pub name: &'static str,
    pub check: fn(&ScoreInput) -> RuleOutcome,
}

/// Fold an ordered rule list into a metric score
pub(crate) fn fold_rules(
    name: MetricName,
    weight: f32,
    rules: &[Rule],
    input: &ScoreInput,
) -> MetricResult {
    let mut penalty = 0u32;
    let mut issues = Vec::new();
    for rule in rules {
        let outcome = (rule.check)(input);
        if !outcome.is_clean() {
            tracing::debug!(metric = %name, rule = rule.name, penalty = outcome.penalty, "Rule fired");
        }
        penalty = penalty.saturating_add(outcome.penalty);
        issues.extend(outcome.issues);
    }
    MetricResult {
        name,
        score: 100u32.saturating_sub(penalty),
        weight,
        issues,
        sub_metrics: Vec::new(),
    }
}

// ─── Scoring entry point ─────────────────────────────────────────────────────

/// Score an edit across all six metrics.
pub fn score(input: &ScoreInput) -> ConfidenceResult {
    let _span = tracing::info_span!("confidence_score", changed = input.region.len()).entered();

    let metrics = vec![
        correctness::evaluate(input),
        security::evaluate(input),
        testing::evaluate(input),
        contracts::evaluate(input),
        risk::evaluate(input),
        hygiene::evaluate(input),
    ];

    let total = aggregate(&metrics);
    ConfidenceResult {
        total,
        status: Status::from_total(total),
        metrics,
    }
}

/// Weighted aggregation. Zero-weight metrics fall out of both numerator
/// and denominator; if every weight is zero the confidence is vacuous
/// (100).
fn aggregate(metrics: &[MetricResult]) -> u32 {
    let weight_sum: f32 = metrics.iter().map(|m| m.weight).sum();
    if weight_sum == 0.0 {
        return 100;
    }
    let weighted: f32 = metrics.iter().map(|m| m.score as f32 * m.weight).sum();
    (weighted / weight_sum).clamp(0.0, 100.0).round() as u32
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Bare-bones input for rule tests: a region, its current text, and
    /// optional diagnostics
    pub(crate) fn input_fixture<'a>(
        region: &'a ChangedRegion,
        current: &'a str,
        diagnostics: &'a [Diagnostic],
        changes: &'a ChangeSet,
    ) -> ScoreInput<'a> {
        ScoreInput {
            region,
            current_text: current,
            prior_text: None,
            diagnostics,
            is_test_file: false,
            discovered_tests: 0,
            changes,
        }
    }
}
