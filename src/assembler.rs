//! Best-effort conversion of an untrusted generation candidate into a
//! [`ReportOutput`]. Never fails: missing or malformed values fall back to
//! defaults and unknown keys are ignored.

use serde_json::{Map, Value};

use crate::models::{CapitalFigures, Justification, ReportOutput};

pub const NO_EXPLANATION: &str = "No explanation provided";
pub const UNKNOWN_FIELD: &str = "unknown";

pub fn assemble(candidate: &Value) -> ReportOutput {
    let Some(root) = candidate.as_object() else {
        return ReportOutput::default();
    };

    let figures = root
        .get("own_funds")
        .and_then(Value::as_object)
        .map(assemble_figures)
        .unwrap_or_default();

    let justifications = first_of(root, &["audit_log", "justifications"])
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(assemble_justification).collect())
        .unwrap_or_default();

    let warnings = root
        .get("warnings")
        .and_then(Value::as_array)
        .map(|items| string_items(items))
        .unwrap_or_default();

    ReportOutput {
        figures,
        justifications,
        warnings,
    }
}

fn assemble_figures(own_funds: &Map<String, Value>) -> CapitalFigures {
    let field = |keys: &[&str]| first_of(own_funds, keys).map(number).unwrap_or(0.0);
    CapitalFigures {
        cet1: field(&["common_equity_tier_1", "cet1"]),
        at1: field(&["additional_tier_1", "at1"]),
        tier2: field(&["tier_2", "tier2"]),
        total: field(&["total_own_funds", "total"]),
    }
}

/// Non-object entries in the audit log are skipped.
fn assemble_justification(entry: &Value) -> Option<Justification> {
    let entry = entry.as_object()?;
    Some(Justification {
        field: entry
            .get("field")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_FIELD)
            .to_string(),
        value: entry.get("value").map(number).unwrap_or(0.0),
        passage_ids: entry
            .get("rule_ids")
            .and_then(Value::as_array)
            .map(|ids| string_items(ids))
            .unwrap_or_default(),
        explanation: entry
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or(NO_EXPLANATION)
            .to_string(),
    })
}

fn first_of<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

/// Finite JSON numbers and numeric strings; anything else, including
/// "NaN" and "inf", counts as zero.
fn number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    parsed.filter(|v: &f64| v.is_finite()).unwrap_or(0.0)
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
