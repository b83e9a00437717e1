//! COREP own funds (C 01.00) output records.

use serde::{Deserialize, Serialize};

/// Capital breakdown. `total == cet1 + at1 + tier2` is expected but only
/// checked by the validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalFigures {
    #[serde(rename = "common_equity_tier_1")]
    pub cet1: f64,
    #[serde(rename = "additional_tier_1")]
    pub at1: f64,
    #[serde(rename = "tier_2")]
    pub tier2: f64,
    #[serde(rename = "total_own_funds")]
    pub total: f64,
}

impl CapitalFigures {
    pub fn new(cet1: f64, at1: f64, tier2: f64, total: f64) -> Self {
        CapitalFigures {
            cet1,
            at1,
            tier2,
            total,
        }
    }

    pub fn tier1(&self) -> f64 {
        self.cet1 + self.at1
    }

    /// The fields in report order, under their reporting names.
    pub fn named_fields(&self) -> [(&'static str, f64); 4] {
        [
            ("common_equity_tier_1", self.cet1),
            ("additional_tier_1", self.at1),
            ("tier_2", self.tier2),
            ("total_own_funds", self.total),
        ]
    }
}

/// Audit entry explaining how one field was populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    pub field: String,
    pub value: f64,
    /// Cited passage ids; may be empty or name passages that do not exist.
    #[serde(rename = "rule_ids")]
    pub passage_ids: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOutput {
    #[serde(rename = "own_funds")]
    pub figures: CapitalFigures,
    #[serde(rename = "audit_log")]
    pub justifications: Vec<Justification>,
    pub warnings: Vec<String>,
}

impl ReportOutput {
    pub fn extend_warnings<I>(&mut self, warnings: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.warnings.extend(warnings);
    }
}
