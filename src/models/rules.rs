//! Declarative field rules for procurement documents.
//!
//! Each [`FieldRule`] names one leaf of the extraction tree and the strategies
//! tried, in order, to fill it. Adding a field means adding a row here; the
//! interpreter in `extract.rs` never changes.
//!
//! Pattern conventions:
//! - `Label` patterns are wrapped as `(?i)^(?:…)` and matched at line start.
//! - `Section` headers are wrapped as `(?i)^(?:<numbering>)?(?:…)`, so
//!   "3.2 Pricing Schedule" matches the `pricing` header.
//! - `Section` headers also accept a "PART 2:" / "Section IV -" prefix.
//! - `Pattern`, `Flag` and `Infer` patterns are used as written, over the
//!   full text. A `FlagUnless` guard is wrapped as `(?i)(?:…)[\s\-]*$` and
//!   tested against the text just before each match.

use crate::types::FieldKey;

/// Start of an ALL-CAPS heading: optional numbering, then a capital.
/// The full heading test (no lowercase, one real word, not a bare
/// reference code) lives in `extract::Heading`.
pub const HEADING_START: &str = r"^(?:\d+(?:\.\d+)*\.?\s+)?[A-Z]";

/// An all-letter word of at least three capitals ("PRICING", not "R" or "SBD4").
pub const HEADING_WORD: &str = r"(?:^|[^A-Za-z])[A-Z]{3,}(?:[^A-Za-z]|$)";

/// Leading outline numbering stripped before the reference-code check.
pub const HEADING_NUMBERING: &str = r"^\d+(?:\.\d+)*\.?\s+";

/// Prefix accepted before a section header: "PART 2:", "Section IV -", "3.2".
pub const SECTION_NUMBERING: &str =
    r"(?:(?:part|section)\s+(?:\d+|[IVX]+|[A-Z])\s*[:.\-–]?\s*)?(?:\d+(?:\.\d+)*\.?\s*)?";

const ENVELOPE: &str = r"(?i)\b(?:two|one|single|dual|2|1)[\s\-]*envelope(?:\s+system)?\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Stop at the next ALL-CAPS heading.
    Heading,
    /// Stop at the first line matching this pattern.
    Pattern(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Value follows a label at the start of a line.
    Label(&'static str),
    /// Value is the block of lines after a header.
    Section { header: &'static str, stop: Stop },
    /// Value is a capture group of the first match in the full text,
    /// optionally rendered through a `${n}` template.
    Pattern {
        pattern: &'static str,
        group: usize,
        template: Option<&'static str>,
    },
    /// Field is set to `true` when the pattern occurs anywhere.
    Flag(&'static str),
    /// Like `Flag`, but a match directly preceded by `preceded_by`
    /// ("no", "non-") does not count.
    FlagUnless {
        pattern: &'static str,
        preceded_by: &'static str,
    },
    /// Field is set to a canonical value when the pattern occurs anywhere.
    Infer {
        pattern: &'static str,
        value: &'static str,
    },
}

impl Strategy {
    /// Whether this strategy yields a boolean rather than text.
    pub fn is_flag(&self) -> bool {
        matches!(self, Strategy::Flag(_) | Strategy::FlagUnless { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: FieldKey,
    pub strategies: &'static [Strategy],
}

const fn label(pattern: &'static str) -> Strategy {
    Strategy::Label(pattern)
}

const fn section(header: &'static str) -> Strategy {
    Strategy::Section {
        header,
        stop: Stop::Heading,
    }
}

const fn first(pattern: &'static str) -> Strategy {
    Strategy::Pattern {
        pattern,
        group: 0,
        template: None,
    }
}

const fn group(pattern: &'static str, group: usize) -> Strategy {
    Strategy::Pattern {
        pattern,
        group,
        template: None,
    }
}

const fn templated(pattern: &'static str, template: &'static str) -> Strategy {
    Strategy::Pattern {
        pattern,
        group: 1,
        template: Some(template),
    }
}

const fn infer(pattern: &'static str, value: &'static str) -> Strategy {
    Strategy::Infer { pattern, value }
}

pub static RULES: &[FieldRule] = &[
    // ── meta ──
    FieldRule {
        field: FieldKey::TenderNumber,
        strategies: &[
            label(r"(?:tender|bid|rfq|rfp|rfb|quotation|contract)\s*(?:number|no|ref(?:erence)?(?:\s*(?:number|no))?)\b"),
            first(r"\b(?:RFPQ|RFBQ|RFQ|RFP|RFB|RFT|RFI|RFA|EOI)[ \t:#/\-]*(?:(?:No\.?|Number)[ \t:#]*)?[A-Z0-9/\-.]*[0-9][A-Z0-9/\-.]*"),
        ],
    },
    FieldRule {
        field: FieldKey::Title,
        strategies: &[label(
            r"(?:(?:tender|bid|project|contract|quotation)\s+)?title\b|name\s+of\s+(?:the\s+)?(?:tender|project|bid)\b|(?:tender|bid)\s+description\b",
        )],
    },
    FieldRule {
        field: FieldKey::Buyer,
        strategies: &[label(
            r"(?:procuring|issuing)\s+(?:entity|institution|department|organ)\b|organ\s+of\s+state\b|issued\s+by\b|buyer\b|purchaser\b|employer\b|(?:department|municipality|entity|institution)\s*:",
        )],
    },
    FieldRule {
        field: FieldKey::PublishedDate,
        strategies: &[label(
            r"date\s+(?:of\s+)?(?:publication|issue|advert(?:isement)?)\b|publi(?:shed|cation)\s+date\b|(?:advert(?:isement)?|advertised|issue)\s+date\b|published(?:\s+on)?\s*:",
        )],
    },
    // ── dates ──
    FieldRule {
        field: FieldKey::Briefing,
        strategies: &[
            label(r"(?:(?:compulsory|mandatory|non-compulsory|optional)\s+)?(?:site\s+)?(?:briefing|clarification\s+meeting|site\s+(?:inspection|visit|meeting))(?:\s+(?:session|meeting))?(?:\s+(?:date|details))?(?:\s*(?:and|&)\s*(?:time|venue))?\s*[:\-–]"),
            section(r"(?:(?:compulsory|mandatory|non-compulsory)\s+)?(?:site\s+)?briefing\s+(?:session|meeting)s?\b"),
        ],
    },
    FieldRule {
        field: FieldKey::EnquiriesClose,
        strategies: &[label(
            r"closing\s+date\s+for\s+(?:enquiries|queries|questions|clarifications?)\b|(?:last\s+day|deadline)\s+for\s+(?:enquiries|queries|questions|clarifications?)\b|(?:enquiries|queries|questions|clarifications?)\s+(?:close|closing\s+date|deadline|cut-?off)\b",
        )],
    },
    FieldRule {
        field: FieldKey::SubmissionClose,
        strategies: &[label(
            r"closing\s+(?:date|time)(?:\s*(?:and|&|/)\s*(?:date|time))?(?:\s+(?:of|for)\s+(?:the\s+)?(?:tender|bid|quotation|submission)s?)?\s*[:\-–]|(?:tender|bid|quotation)\s+closing\s+(?:date|time)(?:\s*(?:and|&)\s*time)?\b|submission\s+(?:deadline|closing\s+date)\b|deadline\s+for\s+(?:submissions?|bids|tenders|quotations)\b",
        )],
    },
    FieldRule {
        field: FieldKey::ValidityPeriod,
        strategies: &[label(
            r"(?:(?:bid|tender|offer|quotation|proposal)\s+)?validity(?:\s+period)?\b|period\s+of\s+validity\b",
        )],
    },
    FieldRule {
        field: FieldKey::ImplementationPeriod,
        strategies: &[label(
            r"(?:implementation|contract|project|completion)\s+(?:period|duration)\b|duration\s+of\s+(?:the\s+)?(?:contract|project|services)\b",
        )],
    },
    // ── submission ──
    FieldRule {
        field: FieldKey::SubmissionMethod,
        strategies: &[
            label(r"(?:(?:bid|tender|quotation)\s+)?submission\s+method\b|(?:method|mode)\s+of\s+submission\b"),
            first(ENVELOPE),
            infer(r"(?i)\be-?submission\b", "e-Submission"),
            infer(r"(?i)\be-?mail\s+submissions?\b|\bsubmi(?:t|tted|ssions?)\b[^\n]{0,40}\bby\s+e-?mail\b", "Email"),
            infer(r"(?i)\btender\s+box\b", "Tender box"),
            infer(r"(?i)\bhand[\s\-]+deliver(?:y|ed)\b", "Hand delivery"),
            infer(r"(?i)\bportal\b", "Portal"),
        ],
    },
    FieldRule {
        field: FieldKey::SubmissionAddress,
        strategies: &[label(
            r"(?:submission|delivery|physical|postal|street)\s+address\b|address\s+for\s+(?:submission|delivery)\b",
        )],
    },
    FieldRule {
        field: FieldKey::SubmissionEmail,
        strategies: &[first(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}")],
    },
    FieldRule {
        field: FieldKey::SubmissionUrl,
        strategies: &[first(r#"(?i)\bhttps?://[^\s<>"'()\[\]]+"#)],
    },
    FieldRule {
        field: FieldKey::EnvelopeSystem,
        strategies: &[first(ENVELOPE)],
    },
    FieldRule {
        field: FieldKey::SubmissionInstructions,
        strategies: &[section(
            r"(?:(?:bid|tender)\s+)?submission\s+instructions\b|instructions\s+(?:to|for)\s+(?:bidders|tenderers|submission)\b",
        )],
    },
    FieldRule {
        field: FieldKey::LateBidPolicy,
        strategies: &[section(r"late\s+(?:bids|submissions|tenders|quotations|proposals)\b")],
    },
    // ── eligibility ──
    FieldRule {
        field: FieldKey::Csd,
        strategies: &[Strategy::Flag(r"\bCSD\b|(?i:central\s+supplier\s+database)")],
    },
    FieldRule {
        field: FieldKey::TaxCompliance,
        strategies: &[Strategy::Flag(r"(?i)\btax\s+(?:compliance|clearance)\b")],
    },
    FieldRule {
        field: FieldKey::Cidb,
        strategies: &[group(
            r"(?i)\bCIDB\b[^\n]{0,60}?\b(\d{1,2}\s?(?:GB|CE|EB|EP|ME|SO|S[A-Z])(?:\s?PE)?)\b",
            1,
        )],
    },
    FieldRule {
        field: FieldKey::Bbbee,
        strategies: &[
            templated(r"(?i)\bB-?BBEE\b[^\n]{0,40}?\blevel\s*[:\-]?\s*(\d)\b", "Level ${1}"),
            templated(r"(?i)\blevel\s*(\d)\s+(?:B-?BBEE|BEE)\b", "Level ${1}"),
        ],
    },
    FieldRule {
        field: FieldKey::Oem,
        strategies: &[section(r"(?:oem|original\s+equipment\s+manufacturer)s?\b")],
    },
    FieldRule {
        field: FieldKey::LocalContent,
        strategies: &[section(r"local\s+(?:content|production)\b")],
    },
    FieldRule {
        field: FieldKey::MandatoryBriefing,
        strategies: &[Strategy::FlagUnless {
            pattern: r"(?i)\b(?:mandatory|compulsory)\s+(?:site\s+)?(?:briefing|clarification\s+meeting|site\s+(?:inspection|visit|meeting))\b",
            preceded_by: r"\b(?:no|non|not)",
        }],
    },
    FieldRule {
        field: FieldKey::OtherEligibility,
        strategies: &[section(
            r"eligibility(?:\s+(?:criteria|requirements))?\b|(?:pre-?)?qualification\s+criteria\b",
        )],
    },
    // ── evaluation ──
    FieldRule {
        field: FieldKey::EvaluationMethod,
        strategies: &[group(r"\b(80/20|90/10)\b", 1), first(r"\bPPPFA\b")],
    },
    FieldRule {
        field: FieldKey::FunctionalityThreshold,
        strategies: &[templated(
            r"(?i)\bfunctionality\b[^\n]{0,80}?\b(?:minimum|threshold|at\s+least|not\s+less\s+than|cut-?off)\b[^\n\d]{0,40}?(\d{1,3}(?:[.,]\d+)?)\s*(?:%|percent\b|points\b)",
            "${1}%",
        )],
    },
    FieldRule {
        field: FieldKey::ScoringRubric,
        strategies: &[section(r"(?:evaluation|scoring|functionality)\b")],
    },
    // ── scope ──
    FieldRule {
        field: FieldKey::ScopeDescription,
        strategies: &[section(
            r"(?:scope\s+of\s+(?:the\s+)?(?:works?|services|supply|tender)|project\s+description|(?:technical\s+)?requirements|terms\s+of\s+reference|specifications?)\b",
        )],
    },
    FieldRule {
        field: FieldKey::Lots,
        strategies: &[section(r"(?:lots?|packages?)\b")],
    },
    FieldRule {
        field: FieldKey::Delivery,
        strategies: &[section(
            r"(?:delivery\s+(?:period|schedule|requirements|terms|date)|implementation\s+period|(?:place|point)\s+of\s+delivery)\b",
        )],
    },
    // ── commercial ──
    FieldRule {
        field: FieldKey::Pricing,
        strategies: &[section(
            r"(?:pric(?:ing|e)(?:\s+(?:schedule|instructions|basis|structure|proposal))?|bill\s+of\s+quantities|schedule\s+of\s+(?:rates|prices))\b",
        )],
    },
    FieldRule {
        field: FieldKey::CurrencyVat,
        strategies: &[section(r"(?:currency|vat|value[\s\-]+added\s+tax)\b")],
    },
    FieldRule {
        field: FieldKey::BidBond,
        strategies: &[section(r"(?:bid|tender)\s+(?:security|bond|guarantee)\b")],
    },
    FieldRule {
        field: FieldKey::PerformanceSecurity,
        strategies: &[section(r"performance\s+(?:security|guarantee|bond)\b")],
    },
    FieldRule {
        field: FieldKey::Penalties,
        strategies: &[section(r"(?:penalt(?:y|ies)(?:\s+clause)?|liquidated\s+damages)\b")],
    },
    FieldRule {
        field: FieldKey::Warranty,
        strategies: &[section(r"(?:warrant(?:y|ies)|guarantee\s+period|defects?\s+liability(?:\s+period)?)\b")],
    },
    FieldRule {
        field: FieldKey::Sla,
        strategies: &[section(r"(?:service\s+level(?:\s+agreements?)?|sla)\b")],
    },
    // ── contacts ──
    FieldRule {
        field: FieldKey::EnquiriesContact,
        strategies: &[
            section(r"(?:(?:technical|bidding|procurement|supply\s+chain)\s+)?(?:enquiries|queries|clarifications)(?:\s+(?:and|&)\s+(?:contact\s+)?(?:details|information))?\s*:?$"),
            label(r"contact\s+person\b|enquiries\b|queries\b"),
        ],
    },
    FieldRule {
        field: FieldKey::SubmissionContact,
        strategies: &[section(r"submission\s+contact(?:\s+(?:person|details))?\b")],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;
    use std::collections::HashSet;

    #[test]
    fn every_leaf_has_exactly_one_rule() {
        let mut seen = HashSet::new();
        for rule in RULES {
            assert!(seen.insert(rule.field), "{:?} has two rules", rule.field);
            assert!(!rule.strategies.is_empty(), "{:?} has no strategies", rule.field);
        }
        for key in FieldKey::ALL {
            assert!(seen.contains(&key), "{:?} has no rule", key);
        }
    }

    #[test]
    fn flag_strategies_only_target_flag_fields() {
        for rule in RULES {
            let is_flag_field = rule.field.kind() == FieldKind::Flag;
            for strategy in rule.strategies {
                assert_eq!(
                    strategy.is_flag(),
                    is_flag_field,
                    "{:?} mixes flag and text strategies",
                    rule.field
                );
            }
        }
    }
}
