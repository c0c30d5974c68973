//! Change risk metric (weight 0.10)
//!
//! Size-based: big diffs, control-flow growth against the prior version,
//! and a generic large-change surcharge.

use super::correctness::control_flow_count;
use super::{fold_rules, MetricName, MetricResult, Rule, RuleOutcome, ScoreInput};

pub(crate) const WEIGHT: f32 = 0.10;

const RULES: &[Rule] = &[
    Rule {
        name: "diff_size",
        check: diff_size,
    },
    Rule {
        name: "control_flow_jump",
        check: control_flow_jump,
    },
    Rule {
        name: "large_change",
        check: large_change,
    },
];

pub(crate) fn evaluate(input: &ScoreInput) -> MetricResult {
    fold_rules(MetricName::ChangeRisk, WEIGHT, RULES, input)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn diff_size(input: &ScoreInput) -> RuleOutcome {
    let changed = input.region.len();
    match changed {
        501.. => RuleOutcome::flag(40, format!("Huge diff: {} changed lines", changed), None),
        201..=500 => RuleOutcome::flag(25, format!("Big diff: {} changed lines", changed), None),
        101..=200 => RuleOutcome::flag(15, format!("Sizable diff: {} changed lines", changed), None),
        _ => RuleOutcome::clean(),
    }
}

/// Growth in branchiness relative to the prior version
fn control_flow_jump(input: &ScoreInput) -> RuleOutcome {
    let Some(prior) = input.prior_text else {
        return RuleOutcome::clean();
    };
    let before = control_flow_count(prior);
    let after = control_flow_count(input.current_text);
    let jump = after.saturating_sub(before);

    if jump >= 10 {
        RuleOutcome::flag(
            20,
            format!("Control flow jumped by {} statements", jump),
            None,
        )
    } else if jump >= 5 {
        RuleOutcome::flag(
            10,
            format!("Control flow grew by {} statements", jump),
            None,
        )
    } else {
        RuleOutcome::clean()
    }
}

fn large_change(input: &ScoreInput) -> RuleOutcome {
    if input.region.len() > 50 {
        RuleOutcome::flag(10, "Broad change surface", None)
    } else {
        RuleOutcome::clean()
    }
}
