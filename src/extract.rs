//! Rule-driven field extraction over plain document text.

use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::models::{
    FieldRule, Stop, Strategy, HEADING_NUMBERING, HEADING_START, HEADING_WORD, RULES,
    SECTION_NUMBERING,
};
use crate::types::{DocExtraction, FieldKey, FieldValue};
use regex::Regex;
use std::sync::OnceLock;

static DEFAULT_EXTRACTOR: OnceLock<Extractor> = OnceLock::new();

/// Shared extractor built from the built-in rules and default config.
pub fn default_extractor() -> &'static Extractor {
    DEFAULT_EXTRACTOR.get_or_init(|| Extractor::new().expect("built-in rule table compiles"))
}

/// Extract every known field from `text` with the default extractor.
///
/// Never fails: unmatched fields stay `None`, and empty input produces a
/// fully-shaped record with every leaf unset.
pub fn extract(text: &str) -> DocExtraction {
    default_extractor().extract(text)
}

/// Text looked at before a `FlagUnless` match.
const GUARD_WINDOW_CHARS: usize = 64;

enum SectionStop {
    Heading,
    Pattern(Regex),
}

enum Compiled {
    Label(Regex),
    Section { header: Regex, stop: SectionStop },
    Pattern {
        regex: Regex,
        group: usize,
        template: Option<&'static str>,
    },
    Flag(Regex),
    FlagUnless { regex: Regex, guard: Regex },
    Infer { regex: Regex, value: &'static str },
}

struct CompiledRule {
    field: FieldKey,
    strategies: Vec<Compiled>,
}

/// The default section stop: a new ALL-CAPS heading.
///
/// A heading has no lowercase letters, starts with a capital (after optional
/// outline numbering), contains a word of three or more capitals, and is not
/// a bare reference code such as `RFQ-2025/0456`. "PART 2: PRICING SCHEDULE",
/// "SBD 4" and "3. EVALUATION CRITERIA:" all qualify.
#[derive(Debug, Clone)]
pub struct Heading {
    start: Regex,
    word: Regex,
    numbering: Regex,
}

impl Heading {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            start: Regex::new(HEADING_START)?,
            word: Regex::new(HEADING_WORD)?,
            numbering: Regex::new(HEADING_NUMBERING)?,
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        let line = line.trim();
        if line.chars().any(char::is_lowercase) || !self.start.is_match(line) || !self.word.is_match(line) {
            return false;
        }
        let body = self.numbering.replace(line, "");
        let bare_code = !body.contains(char::is_whitespace) && body.chars().any(|c| c.is_ascii_digit());
        !bare_code
    }
}

/// Compiled rule table plus the settings stamped on every field.
pub struct Extractor {
    config: ExtractorConfig,
    heading: Heading,
    rules: Vec<CompiledRule>,
}

impl Extractor {
    pub fn new() -> Result<Self, Error> {
        Self::with_config(ExtractorConfig::default())
    }

    /// Extractor configured from `.env` / environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::with_config(ExtractorConfig::from_env()?)
    }

    pub fn with_config(config: ExtractorConfig) -> Result<Self, Error> {
        Self::with_rules(config, RULES)
    }

    pub fn with_rules(config: ExtractorConfig, rules: &[FieldRule]) -> Result<Self, Error> {
        let heading = Heading::new().map_err(|source| Error::Pattern {
            field: "heading",
            source,
        })?;
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut strategies = Vec::with_capacity(rule.strategies.len());
            for strategy in rule.strategies {
                strategies.push(compile_strategy(rule.field, strategy)?);
            }
            compiled.push(CompiledRule {
                field: rule.field,
                strategies,
            });
        }
        Ok(Self {
            config,
            heading,
            rules: compiled,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extract(&self, text: &str) -> DocExtraction {
        let lines = split_lines(text);
        let mut doc =
            DocExtraction::empty(text, &self.config.source, self.config.default_confidence);

        for rule in &self.rules {
            match self.apply(rule, text, &lines) {
                Some(value) => {
                    if !doc.assign(rule.field, value) {
                        tracing::warn!(field = rule.field.path(), "rule produced a value of the wrong kind");
                    }
                }
                None => tracing::trace!(field = rule.field.path(), "not found"),
            }
        }

        tracing::debug!(
            lines = lines.len(),
            found = doc.found_count(),
            "extracted tender fields"
        );
        doc
    }

    /// Run only the rule for `field`; `None` when nothing matched or no rule exists.
    pub fn extract_field(&self, field: FieldKey, text: &str) -> Option<FieldValue> {
        let lines = split_lines(text);
        self.rules
            .iter()
            .find(|r| r.field == field)
            .and_then(|rule| self.apply(rule, text, &lines))
    }

    fn apply(&self, rule: &CompiledRule, text: &str, lines: &[&str]) -> Option<FieldValue> {
        rule.strategies
            .iter()
            .find_map(|strategy| self.run(strategy, text, lines))
    }

    fn run(&self, strategy: &Compiled, text: &str, lines: &[&str]) -> Option<FieldValue> {
        match strategy {
            Compiled::Label(label) => pick_after(lines, label).map(FieldValue::Text),
            Compiled::Section { header, stop } => {
                let is_stop = |line: &str| match stop {
                    SectionStop::Heading => self.heading.is_match(line),
                    SectionStop::Pattern(re) => re.is_match(line),
                };
                section_after(lines, header, is_stop, self.config.section_max_lines)
                    .map(FieldValue::Text)
            }
            Compiled::Pattern {
                regex,
                group,
                template,
            } => first_match(text, regex, *group, *template).map(FieldValue::Text),
            Compiled::Flag(regex) => regex.is_match(text).then_some(FieldValue::Flag(true)),
            Compiled::FlagUnless { regex, guard } => regex
                .find_iter(text)
                .any(|m| !guard.is_match(tail(&text[..m.start()], GUARD_WINDOW_CHARS)))
                .then_some(FieldValue::Flag(true)),
            Compiled::Infer { regex, value } => regex
                .is_match(text)
                .then(|| FieldValue::Text((*value).to_string())),
        }
    }
}

fn compile(field: FieldKey, pattern: &str) -> Result<Regex, Error> {
    tracing::trace!(field = field.path(), pattern, "compiling rule pattern");
    Regex::new(pattern).map_err(|source| Error::Pattern {
        field: field.path(),
        source,
    })
}

fn compile_strategy(field: FieldKey, strategy: &Strategy) -> Result<Compiled, Error> {
    Ok(match *strategy {
        Strategy::Label(p) => Compiled::Label(compile(field, &format!("(?i)^(?:{})", p))?),
        Strategy::Section { header, stop } => Compiled::Section {
            header: compile(field, &format!("(?i)^{}(?:{})", SECTION_NUMBERING, header))?,
            stop: match stop {
                Stop::Heading => SectionStop::Heading,
                Stop::Pattern(p) => SectionStop::Pattern(compile(field, p)?),
            },
        },
        Strategy::Pattern {
            pattern,
            group,
            template,
        } => Compiled::Pattern {
            regex: compile(field, pattern)?,
            group,
            template,
        },
        Strategy::Flag(p) => Compiled::Flag(compile(field, p)?),
        Strategy::FlagUnless {
            pattern,
            preceded_by,
        } => Compiled::FlagUnless {
            regex: compile(field, pattern)?,
            guard: compile(field, &format!(r"(?i)(?:{})[\s\-]*$", preceded_by))?,
        },
        Strategy::Infer { pattern, value } => Compiled::Infer {
            regex: compile(field, pattern)?,
            value,
        },
    })
}

/// Non-empty, trimmed lines of `text`, in document order.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Value after `label` on the first line that starts with it.
///
/// Only the first matching line is considered; if its remainder is empty
/// the result is `None`.
pub fn pick_after(lines: &[&str], label: &Regex) -> Option<String> {
    let (line, m) = lines
        .iter()
        .find_map(|line| label.find(line).filter(|m| m.start() == 0).map(|m| (*line, m)))?;
    let rest = line[m.end()..]
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '.' | '#'))
        .trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Lines following the first `header` line, up to a line where `is_stop`
/// holds or `max_lines`.
pub fn section_after<F>(lines: &[&str], header: &Regex, is_stop: F, max_lines: usize) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let start = lines.iter().position(|l| header.is_match(l))?;
    let mut captured: Vec<&str> = Vec::new();
    for line in lines.iter().skip(start + 1).take(max_lines) {
        if is_stop(line) {
            break;
        }
        captured.push(line);
    }
    if captured.is_empty() {
        return None;
    }
    Some(collapse_whitespace(&captured.join(" ")))
}

fn first_match(text: &str, regex: &Regex, group: usize, template: Option<&str>) -> Option<String> {
    let caps = regex.captures(text)?;
    let m = caps.get(group)?;
    let raw = match template {
        Some(t) => {
            let mut out = String::new();
            caps.expand(t, &mut out);
            out
        }
        None => m.as_str().to_string(),
    };
    let value = collapse_whitespace(&raw);
    let value = value.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'));
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Last `max_chars` characters of `s`.
fn tail(s: &str, max_chars: usize) -> &str {
    match s.char_indices().rev().nth(max_chars.saturating_sub(1)) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(p: &str) -> Regex {
        Regex::new(&format!("(?i)^(?:{})", p)).unwrap()
    }

    fn stop_at_heading() -> impl Fn(&str) -> bool {
        let heading = Heading::new().unwrap();
        move |line| heading.is_match(line)
    }

    #[test]
    fn split_lines_drops_blank_and_trims() {
        let lines = split_lines("  a  \n\n\t\n b\r\n");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn pick_after_strips_separators() {
        let re = label(r"tender\s*(?:number|no)\b");
        assert_eq!(pick_after(&["Tender No.: ABC/1"], &re).as_deref(), Some("ABC/1"));
        assert_eq!(pick_after(&["TENDER NUMBER - X 9"], &re).as_deref(), Some("X 9"));
    }

    #[test]
    fn pick_after_first_match_wins_even_when_empty() {
        let re = label(r"closing\s+date\s*:");
        let lines = ["Closing date:", "Closing date: 2025-01-01"];
        assert_eq!(pick_after(&lines, &re), None);
    }

    #[test]
    fn pick_after_requires_line_start() {
        let re = label(r"buyer\b");
        assert_eq!(pick_after(&["The buyer: nobody"], &re), None);
    }

    #[test]
    fn section_after_stops_at_heading() {
        let header = label(r"scope\s+of\s+work\b");
        let lines = ["SCOPE OF WORK", "one", "two", "COMMERCIAL TERMS", "three"];
        assert_eq!(
            section_after(&lines, &header, stop_at_heading(), 12).as_deref(),
            Some("one two")
        );
    }

    #[test]
    fn section_after_respects_cap() {
        let header = label(r"pricing\b");
        let lines = ["Pricing", "a", "b", "c", "d"];
        assert_eq!(section_after(&lines, &header, stop_at_heading(), 2).as_deref(), Some("a b"));
    }

    #[test]
    fn section_after_none_when_header_missing_or_empty() {
        let header = label(r"warranty\b");
        assert_eq!(section_after(&["nothing here"], &header, stop_at_heading(), 12), None);
        assert_eq!(section_after(&["WARRANTY", "PENALTIES"], &header, stop_at_heading(), 12), None);
        assert_eq!(section_after(&["Warranty"], &header, stop_at_heading(), 12), None);
    }

    #[test]
    fn heading_recognises_caps_lines_with_numbers() {
        let heading = Heading::new().unwrap();
        for line in [
            "COMMERCIAL TERMS",
            "3. EVALUATION CRITERIA:",
            "B-BBEE",
            "PART 2: PRICING SCHEDULE",
            "SBD 4",
            "ANNEXURE 1",
            "4.2 CIDB GRADING 7CE",
        ] {
            assert!(heading.is_match(line), "{line:?} should be a heading");
        }
        for line in [
            "Bidders must be registered on the CSD.",
            "80/20 PPPFA",
            "RFQ-2025/0456",
            "R 1 500 000.00",
            "12 months on all parts.",
            "",
        ] {
            assert!(!heading.is_match(line), "{line:?} should not be a heading");
        }
    }

    #[test]
    fn section_stops_at_numbered_part_heading() {
        let doc = default_extractor().extract(
            "1. SCOPE OF WORK\nSupply and delivery of nitrile gloves.\nPART 2: PRICING SCHEDULE\nAll prices must include VAT.\n",
        );
        assert_eq!(doc.scope.description.as_deref(), Some("Supply and delivery of nitrile gloves."));
        assert_eq!(doc.commercial.pricing.as_deref(), Some("All prices must include VAT."));
    }

    #[test]
    fn guarded_flag_ignores_negated_matches() {
        let extractor = default_extractor();
        for text in [
            "There is no compulsory briefing for this tender.",
            "A non compulsory site visit is offered.",
            "A non-compulsory briefing session will be held.",
        ] {
            assert_eq!(extractor.extract_field(FieldKey::MandatoryBriefing, text), None, "{text}");
        }
        assert_eq!(
            extractor.extract_field(
                FieldKey::MandatoryBriefing,
                "No site visit applies to lot 1. A compulsory briefing applies to lot 2."
            ),
            Some(FieldValue::Flag(true))
        );
    }

    #[test]
    fn tail_keeps_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("ünï non ", 4), "non ");
    }

    #[test]
    fn first_match_renders_template_and_trims() {
        let re = Regex::new(r"(?i)level\s*(\d)").unwrap();
        assert_eq!(first_match("B-BBEE level 4.", &re, 1, Some("Level ${1}")).as_deref(), Some("Level 4"));
        let url = Regex::new(r"https?://\S+").unwrap();
        assert_eq!(
            first_match("See https://etenders.gov.za/tenders.", &url, 0, None).as_deref(),
            Some("https://etenders.gov.za/tenders")
        );
    }

    #[test]
    fn custom_stop_pattern_is_honoured() {
        const CUSTOM: &[FieldRule] = &[FieldRule {
            field: FieldKey::Lots,
            strategies: &[Strategy::Section {
                header: r"lots\b",
                stop: Stop::Pattern(r"^---"),
            }],
        }];
        let extractor = Extractor::with_rules(ExtractorConfig::default(), CUSTOM).unwrap();
        let text = "Lots\nLot 1: Gauteng\nLOT 2: LIMPOPO\n---\nLot 3";
        let doc = extractor.extract(text);
        assert_eq!(doc.scope.lots.as_deref(), Some("Lot 1: Gauteng LOT 2: LIMPOPO"));
    }

    #[test]
    fn bad_pattern_names_the_field() {
        const BROKEN: &[FieldRule] = &[FieldRule {
            field: FieldKey::Title,
            strategies: &[Strategy::Label(r"(unclosed")],
        }];
        match Extractor::with_rules(ExtractorConfig::default(), BROKEN) {
            Err(Error::Pattern { field, .. }) => assert_eq!(field, "meta.title"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("pattern should not compile"),
        }
    }

    #[test]
    fn configured_cap_and_tags_flow_into_fields() {
        let config = ExtractorConfig {
            section_max_lines: 1,
            default_confidence: 0.9,
            source: "ocds.doc".into(),
        };
        let extractor = Extractor::with_config(config).unwrap();
        let doc = extractor.extract("SCOPE OF WORK\nfirst\nsecond");
        assert_eq!(doc.scope.description.as_deref(), Some("first"));
        assert_eq!(doc.scope.description.source, "ocds.doc");
        assert_eq!(doc.meta.title.confidence, 0.9);
    }

    #[test]
    fn extract_field_runs_a_single_rule() {
        let extractor = default_extractor();
        assert_eq!(
            extractor.extract_field(FieldKey::EvaluationMethod, "Evaluated on 90/10."),
            Some(FieldValue::Text("90/10".into()))
        );
        assert_eq!(extractor.extract_field(FieldKey::Csd, "no registration"), None);
    }
}
