//! Text renderings of a validated report.

use crate::error::Result;
use crate::models::ReportOutput;

const RULE_WIDE: usize = 60;

pub fn to_json(output: &ReportOutput) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// COREP C 01.00 own funds extract.
pub fn to_table(output: &ReportOutput) -> String {
    let figures = &output.figures;
    let rows = [
        ("Common Equity Tier 1 (CET1)".to_string(), format_amount(figures.cet1)),
        ("Additional Tier 1 (AT1)".to_string(), format_amount(figures.at1)),
        ("Total Tier 1 Capital".to_string(), format_amount(figures.tier1())),
        ("Tier 2 (T2)".to_string(), format_amount(figures.tier2)),
        ("─".repeat(35), "─".repeat(15)),
        ("TOTAL OWN FUNDS".to_string(), format_amount(figures.total)),
    ];
    let headers = ("COREP C 01.00 - Own Funds", "Amount (Millions)");

    let label_width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .chain(std::iter::once(headers.0.len()))
        .max()
        .unwrap_or(0);
    let amount_width = rows
        .iter()
        .map(|(_, amount)| amount.chars().count())
        .chain(std::iter::once(headers.1.len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        format!("{:<label_width$}  {:>amount_width$}", headers.0, headers.1),
        format!("{}  {}", "-".repeat(label_width), "-".repeat(amount_width)),
    ];
    for (label, amount) in &rows {
        lines.push(format!("{label:<label_width$}  {amount:>amount_width$}"));
    }
    lines.join("\n")
}

pub fn to_audit_log(output: &ReportOutput) -> String {
    let rule = "=".repeat(RULE_WIDE);
    let mut lines = vec![
        rule.clone(),
        "AUDIT LOG - COREP Own Funds Population".to_string(),
        rule.clone(),
        String::new(),
    ];

    for entry in &output.justifications {
        lines.push(format!("Field: {}", entry.field));
        lines.push(format!("   Value: {}", format_amount(entry.value)));
        lines.push(format!("   Rules: {}", entry.passage_ids.join(", ")));
        lines.push(format!("   Reason: {}", entry.explanation));
        lines.push(String::new());
    }

    if !output.warnings.is_empty() {
        lines.push("-".repeat(RULE_WIDE));
        lines.push("WARNINGS:".to_string());
        for warning in &output.warnings {
            lines.push(format!("   • {warning}"));
        }
        lines.push(String::new());
    }

    lines.push(rule);
    lines.join("\n")
}

pub fn full_report(output: &ReportOutput) -> Result<String> {
    let sections = [
        "╔══════════════════════════════════════════════════════════════╗".to_string(),
        "║         PRA COREP OWN FUNDS REPORTING ASSISTANT              ║".to_string(),
        "╚══════════════════════════════════════════════════════════════╝".to_string(),
        String::new(),
        "═══ A. STRUCTURED JSON OUTPUT ═══".to_string(),
        String::new(),
        to_json(output)?,
        String::new(),
        "═══ B. COREP TABLE EXTRACT ═══".to_string(),
        String::new(),
        to_table(output),
        String::new(),
        "═══ C. AUDIT LOG ═══".to_string(),
        String::new(),
        to_audit_log(output),
    ];
    Ok(sections.join("\n"))
}

/// Two decimals with comma thousands separators, e.g. `-1,234,567.89`.
/// Non-finite values render as `n/a`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && !formatted.trim_matches(|c| c == '0' || c == '.').is_empty() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}
