//! Static store of regulatory passages for PRA COREP own funds.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CorepError, Result};

/// A unit of retrievable regulatory text with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub source: String,
    #[serde(alias = "paragraph")]
    pub locator: String,
    #[serde(alias = "text")]
    pub body: String,
}

impl Passage {
    pub fn new(id: &str, source: &str, locator: &str, body: &str) -> Self {
        Passage {
            id: id.to_string(),
            source: source.to_string(),
            locator: locator.to_string(),
            body: body.to_string(),
        }
    }

    /// Formats the passage as prompt context.
    pub fn to_context_string(&self) -> String {
        format!("[{}] {}, {}:\n{}", self.id, self.source, self.locator, self.body)
    }
}

const OWN_FUNDS_PASSAGES: &[(&str, &str, &str, &str)] = &[
    (
        "PRA_OWNFUNDS_001",
        "PRA Rulebook",
        "Article 26",
        "Common Equity Tier 1 capital shall include the following items: (a) capital instruments, provided the conditions laid down in Article 28 are met; (b) share premium accounts related to the instruments referred to in point (a); (c) retained earnings; (d) accumulated other comprehensive income; (e) other reserves.",
    ),
    (
        "PRA_OWNFUNDS_002",
        "PRA Rulebook",
        "Article 28",
        "Capital instruments qualify as Common Equity Tier 1 instruments only if the following conditions are met: (a) the instruments are issued directly by the institution with the prior approval of the owners; (b) the instruments are paid up and their purchase is not funded by the institution; (c) the instruments are perpetual; (d) the principal amount of the instruments may not be reduced except in liquidation.",
    ),
    (
        "PRA_OWNFUNDS_003",
        "PRA Rulebook",
        "Article 36",
        "Institutions shall deduct the following from Common Equity Tier 1 items: (a) losses for the current financial year; (b) intangible assets; (c) deferred tax assets that rely on future profitability; (d) defined benefit pension fund assets; (e) direct and indirect holdings of own CET1 instruments.",
    ),
    (
        "PRA_OWNFUNDS_004",
        "PRA Rulebook",
        "Article 51",
        "Additional Tier 1 capital shall consist of capital instruments meeting conditions in Article 52, plus related share premium. AT1 instruments are subordinated to Tier 2 instruments, depositors and general creditors. AT1 instruments must be perpetual with no maturity date and may be called only after minimum 5 years.",
    ),
    (
        "PRA_OWNFUNDS_005",
        "PRA Rulebook",
        "Article 52",
        "Additional Tier 1 instruments qualify if: (a) issued and paid up; (b) not purchased by the institution or its subsidiaries; (c) perpetual and provisions do not provide incentive to redeem; (d) callable only at option of issuer after minimum 5 years; (e) distributions are paid out of distributable items and are fully discretionary.",
    ),
    (
        "PRA_OWNFUNDS_006",
        "PRA Rulebook",
        "Article 62",
        "Tier 2 capital shall consist of: (a) capital instruments meeting Article 63 conditions; (b) share premium accounts related to those instruments; (c) for institutions calculating risk-weighted exposure amounts under Standardised Approach, general credit risk adjustments up to 1.25% of risk-weighted exposure amounts.",
    ),
    (
        "PRA_OWNFUNDS_007",
        "PRA Rulebook",
        "Article 63",
        "Tier 2 instruments qualify if: (a) issued and paid up; (b) not purchased by the institution; (c) original maturity of at least 5 years; (d) provisions do not provide incentive for early redemption; (e) callable only at option of issuer after 5 years; (f) claim on principal is subordinated to all non-subordinated creditors.",
    ),
    (
        "PRA_OWNFUNDS_008",
        "PRA Rulebook",
        "Article 72",
        "Total Own Funds of an institution shall consist of the sum of its Tier 1 capital and Tier 2 capital. Tier 1 capital is the sum of Common Equity Tier 1 capital and Additional Tier 1 capital. Total Own Funds = CET1 + AT1 + Tier2.",
    ),
    (
        "PRA_OWNFUNDS_009",
        "PRA SS3/21",
        "Section 2.1",
        "UK banks must report their own funds in accordance with COREP reporting template C 01.00. The template requires disclosure of CET1 capital items, CET1 deductions, AT1 capital, AT1 deductions, Tier 2 capital, Tier 2 deductions, and total own funds after all deductions.",
    ),
    (
        "PRA_OWNFUNDS_010",
        "PRA SS3/21",
        "Section 2.3",
        "For COREP C 01.00 reporting, UK institutions should report: Row 010 (CET1 capital before deductions), Row 020 (CET1 deductions), Row 029 (CET1 capital after deductions), Row 045 (AT1 capital), Row 060 (Total Tier 1), Row 070 (Tier 2 capital), and Row 100 (Total Own Funds). All values shall be reported in thousands.",
    ),
];

/// Immutable, ordered collection of passages loaded once at startup.
#[derive(Debug, Clone)]
pub struct Corpus {
    passages: Vec<Passage>,
}

impl Corpus {
    /// Rejects duplicate ids; order is preserved as given.
    pub fn new(passages: Vec<Passage>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for passage in &passages {
            if !seen.insert(passage.id.as_str()) {
                return Err(CorepError::Config(format!(
                    "duplicate passage id '{}'",
                    passage.id
                )));
            }
        }
        Ok(Corpus { passages })
    }

    /// The built-in PRA own funds corpus.
    pub fn own_funds() -> Self {
        Corpus {
            passages: OWN_FUNDS_PASSAGES
                .iter()
                .map(|(id, source, locator, body)| Passage::new(id, source, locator, body))
                .collect(),
        }
    }

    /// Loads a JSON array of passages.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let passages: Vec<Passage> = serde_json::from_str(&content)?;
        Self::new(passages)
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn get(&self, id: &str) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::own_funds()
    }
}
