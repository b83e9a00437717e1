//! Post-hoc consistency checks over assembled output.
//!
//! Each rule is pure and independent. [`Validator::run_all`] runs every rule
//! in a fixed order (totals, non-negativity, tier ordering) and concatenates
//! their warnings; no rule can suppress another.

use crate::config::DEFAULT_TOLERANCE;
use crate::models::{CapitalFigures, ReportOutput};

pub const ERROR_PREFIX: &str = "VALIDATION ERROR";
pub const WARNING_PREFIX: &str = "WARNING";

pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, output: &ReportOutput) -> Vec<String>;
}

/// `total` must equal `cet1 + at1 + tier2` within `tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct TotalsRule {
    pub tolerance: f64,
}

impl TotalsRule {
    pub fn check_figures(&self, figures: &CapitalFigures) -> Vec<String> {
        let expected = figures.cet1 + figures.at1 + figures.tier2;
        let difference = (expected - figures.total).abs();
        if difference > self.tolerance {
            vec![format!(
                "{ERROR_PREFIX}: total_own_funds ({:?}) does not equal CET1 + AT1 + Tier2 ({:?}). Difference: {:.2}",
                figures.total, expected, difference
            )]
        } else {
            Vec::new()
        }
    }
}

impl ValidationRule for TotalsRule {
    fn name(&self) -> &'static str {
        "totals"
    }

    fn check(&self, output: &ReportOutput) -> Vec<String> {
        self.check_figures(&output.figures)
    }
}

/// Every field, checked separately, must be `>= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonNegativeRule;

impl NonNegativeRule {
    pub fn check_figures(&self, figures: &CapitalFigures) -> Vec<String> {
        figures
            .named_fields()
            .iter()
            .filter(|(_, value)| *value < 0.0)
            .map(|(name, value)| format!("{ERROR_PREFIX}: {name} ({value:?}) must be >= 0"))
            .collect()
    }
}

impl ValidationRule for NonNegativeRule {
    fn name(&self) -> &'static str {
        "non_negative"
    }

    fn check(&self, output: &ReportOutput) -> Vec<String> {
        self.check_figures(&output.figures)
    }
}

/// Advisory: CET1 is conventionally the largest tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierOrderingRule;

impl TierOrderingRule {
    pub fn check_figures(&self, figures: &CapitalFigures) -> Vec<String> {
        let mut warnings = Vec::new();
        if figures.cet1 < figures.at1 {
            warnings.push(format!(
                "{WARNING_PREFIX}: CET1 is typically larger than AT1. Please verify this is intentional."
            ));
        }
        if figures.cet1 < figures.tier2 {
            warnings.push(format!(
                "{WARNING_PREFIX}: CET1 is typically larger than Tier 2. Please verify this is intentional."
            ));
        }
        warnings
    }
}

impl ValidationRule for TierOrderingRule {
    fn name(&self) -> &'static str {
        "tier_ordering"
    }

    fn check(&self, output: &ReportOutput) -> Vec<String> {
        self.check_figures(&output.figures)
    }
}

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new(tolerance: f64) -> Self {
        Validator {
            rules: vec![
                Box::new(TotalsRule { tolerance }),
                Box::new(NonNegativeRule),
                Box::new(TierOrderingRule),
            ],
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Warnings from every rule, in rule order. Does not touch `output`.
    pub fn run_all(&self, output: &ReportOutput) -> Vec<String> {
        self.rules.iter().flat_map(|rule| rule.check(output)).collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new(DEFAULT_TOLERANCE)
    }
}

/// Runs the default rule set. The caller decides whether to append the
/// result to `output.warnings`.
pub fn validate(output: &ReportOutput) -> Vec<String> {
    Validator::default().run_all(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(cet1: f64, at1: f64, tier2: f64, total: f64) -> ReportOutput {
        ReportOutput {
            figures: CapitalFigures::new(cet1, at1, tier2, total),
            ..ReportOutput::default()
        }
    }

    fn totals() -> TotalsRule {
        TotalsRule {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[test]
    fn test_consistent_totals() {
        let figures = CapitalFigures::new(100.0, 20.0, 15.0, 135.0);
        assert!(totals().check_figures(&figures).is_empty());
    }

    #[test]
    fn test_inconsistent_totals() {
        let warnings = totals().check_figures(&CapitalFigures::new(100.0, 20.0, 15.0, 140.0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with(ERROR_PREFIX));
        assert!(warnings[0].contains("(140.0)"));
        assert!(warnings[0].contains("(135.0)"));
        assert!(warnings[0].contains("Difference: 5.00"));
    }

    #[test]
    fn test_messages_render_floats_with_decimal_point() {
        let mismatch = totals().check_figures(&CapitalFigures::new(0.1, 0.2, 0.0, 1.0));
        assert!(mismatch[0].contains("total_own_funds (1.0)"));
        assert!(mismatch[0].contains("(0.30000000000000004)"));

        let negative = NonNegativeRule.check_figures(&CapitalFigures::new(0.0, -2.5, 0.0, 0.0));
        assert_eq!(negative, vec!["VALIDATION ERROR: additional_tier_1 (-2.5) must be >= 0"]);
    }

    #[test]
    fn test_totals_within_tolerance() {
        let figures = CapitalFigures::new(0.1, 0.2, 0.0, 0.3);
        assert!(totals().check_figures(&figures).is_empty());
        let loose = TotalsRule { tolerance: 10.0 };
        assert!(loose.check_figures(&CapitalFigures::new(100.0, 20.0, 15.0, 140.0)).is_empty());
    }

    #[test]
    fn test_single_negative_field() {
        let warnings = NonNegativeRule.check_figures(&CapitalFigures::new(-5.0, 0.0, 0.0, -5.0));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0], "VALIDATION ERROR: common_equity_tier_1 (-5.0) must be >= 0");
        assert!(warnings[1].contains("total_own_funds"));

        let only_cet1 = NonNegativeRule.check_figures(&CapitalFigures::new(-5.0, 0.0, 0.0, 0.0));
        assert_eq!(only_cet1.len(), 1);
        assert!(only_cet1[0].contains("common_equity_tier_1"));
    }

    #[test]
    fn test_all_negative_fields_reported() {
        let warnings = NonNegativeRule.check_figures(&CapitalFigures::new(-1.0, -2.0, -3.0, -6.0));
        assert_eq!(warnings.len(), 4);
    }

    #[test]
    fn test_tier_ordering() {
        let warnings = TierOrderingRule.check_figures(&CapitalFigures::new(10.0, 50.0, 5.0, 65.0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("AT1"));

        let both = TierOrderingRule.check_figures(&CapitalFigures::new(1.0, 2.0, 3.0, 6.0));
        assert_eq!(both.len(), 2);
        assert!(both[1].contains("Tier 2"));

        assert!(TierOrderingRule.check_figures(&CapitalFigures::new(10.0, 10.0, 10.0, 30.0)).is_empty());
    }

    #[test]
    fn test_run_all_accumulates_every_rule() {
        // cet1 < at1, negative tier2, totals off
        let warnings = validate(&output(10.0, 50.0, -5.0, 100.0));
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("total_own_funds (100.0)"));
        assert!(warnings[1].contains("tier_2 (-5.0)"));
        assert!(warnings[2].contains("AT1"));
    }

    #[test]
    fn test_negative_cet1_with_consistent_total() {
        // totals agree, so errors come only from non-negativity; a negative
        // CET1 also sits below both other tiers
        let warnings = validate(&output(-5.0, 0.0, 0.0, -5.0));
        assert_eq!(warnings.len(), 4);
        let errors = warnings.iter().filter(|w| w.starts_with(ERROR_PREFIX)).count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn test_clean_output_and_no_mutation() {
        let report = output(100.0, 20.0, 15.0, 135.0);
        let before = report.clone();
        assert!(validate(&report).is_empty());
        assert_eq!(report, before);
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            Validator::default().rule_names(),
            vec!["totals", "non_negative", "tier_ordering"]
        );
    }
}
