//! Display-oriented flattening of a [`DocExtraction`].
//!
//! Only fields that were actually found make it into the lists, so a missing
//! eligibility criterion simply does not appear as a must-have.

use crate::types::{DocExtraction, ExtractedField};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Flat score attached to every summary for ranking; independent of the
/// per-field confidences.
pub const DISPLAY_CONFIDENCE: f64 = 0.65;

const MAX_NOTE_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    pub label: String,
    /// Text as it appeared in the document.
    pub value: String,
    /// Calendar date when one could be recognised in `value`.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderSummary {
    pub tender_number: Option<String>,
    pub title: Option<String>,
    pub deadlines: Vec<Deadline>,
    pub must_haves: Vec<String>,
    pub scoring_notes: Vec<String>,
    pub confidence: f64,
}

pub fn summarize(doc: &DocExtraction) -> TenderSummary {
    let deadlines = [
        ("Briefing", &doc.dates.briefing),
        ("Enquiries close", &doc.dates.enquiries_close),
        ("Submission closes", &doc.dates.submission_close),
    ]
    .into_iter()
    .filter_map(|(label, field)| {
        field.as_deref().map(|value| Deadline {
            label: label.to_string(),
            value: value.to_string(),
            date: parse_date(value),
        })
    })
    .collect();

    TenderSummary {
        tender_number: doc.meta.tender_number.value.clone(),
        title: doc.meta.title.value.clone(),
        deadlines,
        must_haves: must_haves(doc),
        scoring_notes: scoring_notes(doc),
        confidence: DISPLAY_CONFIDENCE,
    }
}

fn must_haves(doc: &DocExtraction) -> Vec<String> {
    let e = &doc.eligibility;
    let mut out = Vec::new();
    if e.csd.is_set() {
        out.push("Registered on the Central Supplier Database (CSD)".to_string());
    }
    if e.tax_compliance.is_set() {
        out.push("Valid tax compliance status".to_string());
    }
    if let Some(grade) = e.cidb.as_deref() {
        out.push(format!("CIDB grading {}", grade));
    }
    if let Some(level) = e.bbbee.as_deref() {
        out.push(format!("B-BBEE {}", level));
    }
    if e.mandatory_briefing.is_set() {
        match doc.dates.briefing.as_deref() {
            Some(when) => out.push(format!("Attend the compulsory briefing ({})", shorten(when))),
            None => out.push("Attend the compulsory briefing".to_string()),
        }
    }
    push_prefixed(&mut out, "OEM", &e.oem);
    push_prefixed(&mut out, "Local content", &e.local_content);
    out
}

fn scoring_notes(doc: &DocExtraction) -> Vec<String> {
    let ev = &doc.evaluation;
    let mut out = Vec::new();
    match ev.method.as_deref() {
        Some("PPPFA") => out.push("Preference points per the PPPFA".to_string()),
        Some(split) => out.push(format!("{} preference point system", split)),
        None => {}
    }
    if let Some(threshold) = ev.functionality_threshold.as_deref() {
        out.push(format!("Minimum functionality score: {}", threshold));
    }
    if let Some(rubric) = ev.scoring_rubric.as_deref() {
        out.push(shorten(rubric));
    }
    out
}

fn push_prefixed(out: &mut Vec<String>, prefix: &str, field: &ExtractedField<String>) {
    if let Some(v) = field.as_deref() {
        out.push(format!("{}: {}", prefix, shorten(v)));
    }
}

fn shorten(s: &str) -> String {
    if s.chars().count() <= MAX_NOTE_CHARS {
        return s.to_string();
    }
    let cut: String = s.chars().take(MAX_NOTE_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[/.]\d{1,2}[/.]\d{4}|\d{1,2}(?:st|nd|rd|th)?\s+[a-z]{3,9}\.?,?\s+\d{4})\b",
        )
        .expect("date regex")
    })
}

/// First recognisable calendar date in `text`.
///
/// Numeric dates are read day-first (`20/11/2025`), as South African
/// documents write them.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    date_pattern().captures_iter(text).find_map(|caps| {
        let raw = caps.get(1)?.as_str();
        parse_date_token(raw)
    })
}

fn parse_date_token(raw: &str) -> Option<NaiveDate> {
    let numeric = raw.replace(['.', '-'], "/");
    for fmt in ["%Y/%m/%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&numeric, fmt) {
            return Some(d);
        }
    }
    // "20th Nov., 2025" -> "20 Nov 2025"
    let words: Vec<&str> = raw
        .split_whitespace()
        .map(|w| {
            let w = w.trim_end_matches(['.', ',']);
            if w.starts_with(|c: char| c.is_ascii_digit()) {
                w.trim_end_matches(|c: char| c.is_ascii_alphabetic())
            } else {
                w
            }
        })
        .collect();
    let cleaned = words.join(" ");
    ["%d %B %Y", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn parses_common_date_shapes() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        assert_eq!(parse_date("2025-11-20"), Some(d));
        assert_eq!(parse_date("20/11/2025 at 11:00"), Some(d));
        assert_eq!(parse_date("Thursday, 20 November 2025 @ 11h00"), Some(d));
        assert_eq!(parse_date("20th Nov 2025"), Some(d));
        assert_eq!(parse_date("to be announced"), None);
    }

    #[test]
    fn only_found_fields_are_listed() {
        let doc = extract(
            "Tender Number: RFQ-77\nClosing Date: 2025-11-20\nBidders must be registered on CSD.\nEvaluated on 80/20.",
        );
        let summary = summarize(&doc);
        assert_eq!(summary.tender_number.as_deref(), Some("RFQ-77"));
        assert_eq!(summary.deadlines.len(), 1);
        assert_eq!(summary.deadlines[0].label, "Submission closes");
        assert_eq!(summary.deadlines[0].date, NaiveDate::from_ymd_opt(2025, 11, 20));
        assert_eq!(
            summary.must_haves,
            vec!["Registered on the Central Supplier Database (CSD)".to_string()]
        );
        assert_eq!(summary.scoring_notes, vec!["80/20 preference point system".to_string()]);
        assert_eq!(summary.confidence, 0.65);
    }

    #[test]
    fn empty_extraction_gives_empty_lists() {
        let summary = summarize(&extract(""));
        assert!(summary.deadlines.is_empty());
        assert!(summary.must_haves.is_empty());
        assert!(summary.scoring_notes.is_empty());
        assert_eq!(summary.tender_number, None);
    }

    #[test]
    fn long_sections_are_shortened() {
        let long = "word ".repeat(200);
        let out = shorten(&long);
        assert!(out.ends_with('…'));
        assert!(out.chars().count() <= MAX_NOTE_CHARS + 1);
    }
}
