use serde::{Deserialize, Serialize};

/// One extracted value plus its provenance and confidence.
///
/// `value` is `None` when nothing was found; `source` and `confidence` are
/// always filled so "not found" stays distinguishable from "not attempted".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField<T> {
    pub value: Option<T>,
    pub source: String,
    pub confidence: f64,
}

impl<T> ExtractedField<T> {
    pub fn missing(source: &str, confidence: f64) -> Self {
        Self {
            value: None,
            source: source.to_string(),
            confidence,
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}

impl ExtractedField<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl ExtractedField<bool> {
    /// True only when the flag was positively detected.
    pub fn is_set(&self) -> bool {
        self.value == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFields {
    pub tender_number: ExtractedField<String>,
    pub title: ExtractedField<String>,
    pub buyer: ExtractedField<String>,
    pub published_date: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFields {
    pub briefing: ExtractedField<String>,
    pub enquiries_close: ExtractedField<String>,
    pub submission_close: ExtractedField<String>,
    pub validity_period: ExtractedField<String>,
    pub implementation_period: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFields {
    pub method: ExtractedField<String>,
    pub address: ExtractedField<String>,
    pub email: ExtractedField<String>,
    pub url: ExtractedField<String>,
    pub envelope_system: ExtractedField<String>,
    pub instructions: ExtractedField<String>,
    pub late_bid_policy: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityFields {
    pub csd: ExtractedField<bool>,
    pub tax_compliance: ExtractedField<bool>,
    pub cidb: ExtractedField<String>,
    pub bbbee: ExtractedField<String>,
    pub oem: ExtractedField<String>,
    pub local_content: ExtractedField<String>,
    pub mandatory_briefing: ExtractedField<bool>,
    pub other: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationFields {
    pub method: ExtractedField<String>,
    pub functionality_threshold: ExtractedField<String>,
    pub scoring_rubric: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFields {
    pub description: ExtractedField<String>,
    pub lots: ExtractedField<String>,
    pub delivery: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialFields {
    pub pricing: ExtractedField<String>,
    pub currency_vat: ExtractedField<String>,
    pub bid_bond: ExtractedField<String>,
    pub performance_security: ExtractedField<String>,
    pub penalties: ExtractedField<String>,
    pub warranty: ExtractedField<String>,
    pub sla: ExtractedField<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub enquiries: ExtractedField<String>,
    pub submission: ExtractedField<String>,
}

/// Everything pulled out of one procurement document.
///
/// `raw` keeps the input verbatim so every value can be traced back to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocExtraction {
    pub meta: MetaFields,
    pub dates: DateFields,
    pub submission: SubmissionFields,
    pub eligibility: EligibilityFields,
    pub evaluation: EvaluationFields,
    pub scope: ScopeFields,
    pub commercial: CommercialFields,
    pub contacts: ContactFields,
    pub raw: String,
}

impl DocExtraction {
    /// A fully-shaped record with every leaf unset.
    pub fn empty(raw: &str, source: &str, confidence: f64) -> Self {
        let text = || ExtractedField::<String>::missing(source, confidence);
        let flag = || ExtractedField::<bool>::missing(source, confidence);
        Self {
            meta: MetaFields {
                tender_number: text(),
                title: text(),
                buyer: text(),
                published_date: text(),
            },
            dates: DateFields {
                briefing: text(),
                enquiries_close: text(),
                submission_close: text(),
                validity_period: text(),
                implementation_period: text(),
            },
            submission: SubmissionFields {
                method: text(),
                address: text(),
                email: text(),
                url: text(),
                envelope_system: text(),
                instructions: text(),
                late_bid_policy: text(),
            },
            eligibility: EligibilityFields {
                csd: flag(),
                tax_compliance: flag(),
                cidb: text(),
                bbbee: text(),
                oem: text(),
                local_content: text(),
                mandatory_briefing: flag(),
                other: text(),
            },
            evaluation: EvaluationFields {
                method: text(),
                functionality_threshold: text(),
                scoring_rubric: text(),
            },
            scope: ScopeFields {
                description: text(),
                lots: text(),
                delivery: text(),
            },
            commercial: CommercialFields {
                pricing: text(),
                currency_vat: text(),
                bid_bond: text(),
                performance_security: text(),
                penalties: text(),
                warranty: text(),
                sla: text(),
            },
            contacts: ContactFields {
                enquiries: text(),
                submission: text(),
            },
            raw: raw.to_string(),
        }
    }

    /// Text leaf for `key`, or `None` when `key` names a flag.
    pub fn text_field(&self, key: FieldKey) -> Option<&ExtractedField<String>> {
        use FieldKey::*;
        Some(match key {
            TenderNumber => &self.meta.tender_number,
            Title => &self.meta.title,
            Buyer => &self.meta.buyer,
            PublishedDate => &self.meta.published_date,
            Briefing => &self.dates.briefing,
            EnquiriesClose => &self.dates.enquiries_close,
            SubmissionClose => &self.dates.submission_close,
            ValidityPeriod => &self.dates.validity_period,
            ImplementationPeriod => &self.dates.implementation_period,
            SubmissionMethod => &self.submission.method,
            SubmissionAddress => &self.submission.address,
            SubmissionEmail => &self.submission.email,
            SubmissionUrl => &self.submission.url,
            EnvelopeSystem => &self.submission.envelope_system,
            SubmissionInstructions => &self.submission.instructions,
            LateBidPolicy => &self.submission.late_bid_policy,
            Cidb => &self.eligibility.cidb,
            Bbbee => &self.eligibility.bbbee,
            Oem => &self.eligibility.oem,
            LocalContent => &self.eligibility.local_content,
            OtherEligibility => &self.eligibility.other,
            EvaluationMethod => &self.evaluation.method,
            FunctionalityThreshold => &self.evaluation.functionality_threshold,
            ScoringRubric => &self.evaluation.scoring_rubric,
            ScopeDescription => &self.scope.description,
            Lots => &self.scope.lots,
            Delivery => &self.scope.delivery,
            Pricing => &self.commercial.pricing,
            CurrencyVat => &self.commercial.currency_vat,
            BidBond => &self.commercial.bid_bond,
            PerformanceSecurity => &self.commercial.performance_security,
            Penalties => &self.commercial.penalties,
            Warranty => &self.commercial.warranty,
            Sla => &self.commercial.sla,
            EnquiriesContact => &self.contacts.enquiries,
            SubmissionContact => &self.contacts.submission,
            Csd | TaxCompliance | MandatoryBriefing => return None,
        })
    }

    fn text_field_mut(&mut self, key: FieldKey) -> Option<&mut ExtractedField<String>> {
        use FieldKey::*;
        Some(match key {
            TenderNumber => &mut self.meta.tender_number,
            Title => &mut self.meta.title,
            Buyer => &mut self.meta.buyer,
            PublishedDate => &mut self.meta.published_date,
            Briefing => &mut self.dates.briefing,
            EnquiriesClose => &mut self.dates.enquiries_close,
            SubmissionClose => &mut self.dates.submission_close,
            ValidityPeriod => &mut self.dates.validity_period,
            ImplementationPeriod => &mut self.dates.implementation_period,
            SubmissionMethod => &mut self.submission.method,
            SubmissionAddress => &mut self.submission.address,
            SubmissionEmail => &mut self.submission.email,
            SubmissionUrl => &mut self.submission.url,
            EnvelopeSystem => &mut self.submission.envelope_system,
            SubmissionInstructions => &mut self.submission.instructions,
            LateBidPolicy => &mut self.submission.late_bid_policy,
            Cidb => &mut self.eligibility.cidb,
            Bbbee => &mut self.eligibility.bbbee,
            Oem => &mut self.eligibility.oem,
            LocalContent => &mut self.eligibility.local_content,
            OtherEligibility => &mut self.eligibility.other,
            EvaluationMethod => &mut self.evaluation.method,
            FunctionalityThreshold => &mut self.evaluation.functionality_threshold,
            ScoringRubric => &mut self.evaluation.scoring_rubric,
            ScopeDescription => &mut self.scope.description,
            Lots => &mut self.scope.lots,
            Delivery => &mut self.scope.delivery,
            Pricing => &mut self.commercial.pricing,
            CurrencyVat => &mut self.commercial.currency_vat,
            BidBond => &mut self.commercial.bid_bond,
            PerformanceSecurity => &mut self.commercial.performance_security,
            Penalties => &mut self.commercial.penalties,
            Warranty => &mut self.commercial.warranty,
            Sla => &mut self.commercial.sla,
            EnquiriesContact => &mut self.contacts.enquiries,
            SubmissionContact => &mut self.contacts.submission,
            Csd | TaxCompliance | MandatoryBriefing => return None,
        })
    }

    /// Flag leaf for `key`, or `None` when `key` names a text field.
    pub fn flag_field(&self, key: FieldKey) -> Option<&ExtractedField<bool>> {
        match key {
            FieldKey::Csd => Some(&self.eligibility.csd),
            FieldKey::TaxCompliance => Some(&self.eligibility.tax_compliance),
            FieldKey::MandatoryBriefing => Some(&self.eligibility.mandatory_briefing),
            _ => None,
        }
    }

    fn flag_field_mut(&mut self, key: FieldKey) -> Option<&mut ExtractedField<bool>> {
        match key {
            FieldKey::Csd => Some(&mut self.eligibility.csd),
            FieldKey::TaxCompliance => Some(&mut self.eligibility.tax_compliance),
            FieldKey::MandatoryBriefing => Some(&mut self.eligibility.mandatory_briefing),
            _ => None,
        }
    }

    /// Store a found value in the leaf named by `key`.
    ///
    /// Returns `false` when the value's kind does not match the leaf.
    pub(crate) fn assign(&mut self, key: FieldKey, value: FieldValue) -> bool {
        match value {
            FieldValue::Text(s) => match self.text_field_mut(key) {
                Some(field) => {
                    field.value = Some(s);
                    true
                }
                None => false,
            },
            FieldValue::Flag(b) => match self.flag_field_mut(key) {
                Some(field) => {
                    field.value = Some(b);
                    true
                }
                None => false,
            },
        }
    }

    /// Number of leaves holding a value.
    pub fn found_count(&self) -> usize {
        FieldKey::ALL
            .iter()
            .filter(|key| {
                self.text_field(**key).map(|f| f.is_found()).unwrap_or(false)
                    || self.flag_field(**key).map(|f| f.is_found()).unwrap_or(false)
            })
            .count()
    }
}

/// A value produced by one rule before it lands in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
}

/// Names every leaf of [`DocExtraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    TenderNumber,
    Title,
    Buyer,
    PublishedDate,
    Briefing,
    EnquiriesClose,
    SubmissionClose,
    ValidityPeriod,
    ImplementationPeriod,
    SubmissionMethod,
    SubmissionAddress,
    SubmissionEmail,
    SubmissionUrl,
    EnvelopeSystem,
    SubmissionInstructions,
    LateBidPolicy,
    Csd,
    TaxCompliance,
    Cidb,
    Bbbee,
    Oem,
    LocalContent,
    MandatoryBriefing,
    OtherEligibility,
    EvaluationMethod,
    FunctionalityThreshold,
    ScoringRubric,
    ScopeDescription,
    Lots,
    Delivery,
    Pricing,
    CurrencyVat,
    BidBond,
    PerformanceSecurity,
    Penalties,
    Warranty,
    Sla,
    EnquiriesContact,
    SubmissionContact,
}

impl FieldKey {
    pub const ALL: [FieldKey; 39] = [
        FieldKey::TenderNumber,
        FieldKey::Title,
        FieldKey::Buyer,
        FieldKey::PublishedDate,
        FieldKey::Briefing,
        FieldKey::EnquiriesClose,
        FieldKey::SubmissionClose,
        FieldKey::ValidityPeriod,
        FieldKey::ImplementationPeriod,
        FieldKey::SubmissionMethod,
        FieldKey::SubmissionAddress,
        FieldKey::SubmissionEmail,
        FieldKey::SubmissionUrl,
        FieldKey::EnvelopeSystem,
        FieldKey::SubmissionInstructions,
        FieldKey::LateBidPolicy,
        FieldKey::Csd,
        FieldKey::TaxCompliance,
        FieldKey::Cidb,
        FieldKey::Bbbee,
        FieldKey::Oem,
        FieldKey::LocalContent,
        FieldKey::MandatoryBriefing,
        FieldKey::OtherEligibility,
        FieldKey::EvaluationMethod,
        FieldKey::FunctionalityThreshold,
        FieldKey::ScoringRubric,
        FieldKey::ScopeDescription,
        FieldKey::Lots,
        FieldKey::Delivery,
        FieldKey::Pricing,
        FieldKey::CurrencyVat,
        FieldKey::BidBond,
        FieldKey::PerformanceSecurity,
        FieldKey::Penalties,
        FieldKey::Warranty,
        FieldKey::Sla,
        FieldKey::EnquiriesContact,
        FieldKey::SubmissionContact,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            FieldKey::Csd | FieldKey::TaxCompliance | FieldKey::MandatoryBriefing => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }

    /// Dotted JSON path of the leaf, e.g. `"meta.tenderNumber"`.
    pub fn path(self) -> &'static str {
        use FieldKey::*;
        match self {
            TenderNumber => "meta.tenderNumber",
            Title => "meta.title",
            Buyer => "meta.buyer",
            PublishedDate => "meta.publishedDate",
            Briefing => "dates.briefing",
            EnquiriesClose => "dates.enquiriesClose",
            SubmissionClose => "dates.submissionClose",
            ValidityPeriod => "dates.validityPeriod",
            ImplementationPeriod => "dates.implementationPeriod",
            SubmissionMethod => "submission.method",
            SubmissionAddress => "submission.address",
            SubmissionEmail => "submission.email",
            SubmissionUrl => "submission.url",
            EnvelopeSystem => "submission.envelopeSystem",
            SubmissionInstructions => "submission.instructions",
            LateBidPolicy => "submission.lateBidPolicy",
            Csd => "eligibility.csd",
            TaxCompliance => "eligibility.taxCompliance",
            Cidb => "eligibility.cidb",
            Bbbee => "eligibility.bbbee",
            Oem => "eligibility.oem",
            LocalContent => "eligibility.localContent",
            MandatoryBriefing => "eligibility.mandatoryBriefing",
            OtherEligibility => "eligibility.other",
            EvaluationMethod => "evaluation.method",
            FunctionalityThreshold => "evaluation.functionalityThreshold",
            ScoringRubric => "evaluation.scoringRubric",
            ScopeDescription => "scope.description",
            Lots => "scope.lots",
            Delivery => "scope.delivery",
            Pricing => "commercial.pricing",
            CurrencyVat => "commercial.currencyVat",
            BidBond => "commercial.bidBond",
            PerformanceSecurity => "commercial.performanceSecurity",
            Penalties => "commercial.penalties",
            Warranty => "commercial.warranty",
            Sla => "commercial.sla",
            EnquiriesContact => "contacts.enquiries",
            SubmissionContact => "contacts.submission",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_resolves_to_exactly_one_leaf() {
        let doc = DocExtraction::empty("", "doc.text", 0.6);
        for key in FieldKey::ALL {
            let text = doc.text_field(key).is_some();
            let flag = doc.flag_field(key).is_some();
            assert!(text ^ flag, "{:?} should map to one leaf", key);
            assert_eq!(flag, key.kind() == FieldKind::Flag);
        }
    }

    #[test]
    fn paths_match_serialized_shape() {
        let doc = DocExtraction::empty("", "doc.text", 0.6);
        let json = serde_json::to_value(&doc).unwrap();
        for key in FieldKey::ALL {
            let mut node = &json;
            for part in key.path().split('.') {
                node = node.get(part).unwrap_or_else(|| panic!("missing {}", key.path()));
            }
            assert!(node.get("value").unwrap().is_null());
            assert_eq!(node.get("source").unwrap(), "doc.text");
        }
    }

    #[test]
    fn assign_rejects_kind_mismatch() {
        let mut doc = DocExtraction::empty("", "doc.text", 0.6);
        assert!(!doc.assign(FieldKey::Csd, FieldValue::Text("yes".into())));
        assert!(!doc.assign(FieldKey::Title, FieldValue::Flag(true)));
        assert!(doc.assign(FieldKey::Csd, FieldValue::Flag(true)));
        assert!(doc.eligibility.csd.is_set());
        assert_eq!(doc.found_count(), 1);
    }
}
