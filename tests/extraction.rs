// tests/extraction.rs
//
// Behaviour of the extractor over whole documents.
//
use serde_json::Value;
use tender_extract::{extract, DocExtraction, FieldKey};

fn leaf<'a>(json: &'a Value, key: FieldKey) -> &'a Value {
    key.path()
        .split('.')
        .fold(json, |node, part| &node[part])
}

fn assert_fully_shaped(doc: &DocExtraction) {
    let json = serde_json::to_value(doc).unwrap();
    for key in FieldKey::ALL {
        let field = leaf(&json, key);
        assert!(field.is_object(), "{} is not an object", key.path());
        assert!(field.get("value").is_some(), "{} has no value key", key.path());
        assert_eq!(field["source"], "doc.text", "{}", key.path());
        assert_eq!(field["confidence"], 0.6, "{}", key.path());
    }
}

const SCENARIO: &str = "\
DEPARTMENT OF PUBLIC WORKS
Tender Number: RFQ-2025/0456
Closing Date: 2025-11-20
B-BBEE Level: 2

ELIGIBILITY
Bidders must be registered on the Central Supplier Database.
Bidders must submit a valid tax compliance status pin.

EVALUATION CRITERIA
Bids will be evaluated on the 80/20 preference point system.
Functionality: minimum threshold of 70%.
";

#[test]
fn any_input_yields_a_full_record() {
    let inputs = [
        "",
        "   \n\n\t",
        "\u{0}\u{1}@@##~~ ¯\\_(ツ)_/¯",
        "lorem ipsum dolor sit amet",
        SCENARIO,
    ];
    for input in inputs {
        assert_fully_shaped(&extract(input));
    }
}

#[test]
fn empty_input_has_every_value_null() {
    let doc = extract("");
    let json = serde_json::to_value(&doc).unwrap();
    for key in FieldKey::ALL {
        assert!(leaf(&json, key)["value"].is_null(), "{} should be null", key.path());
    }
    assert_eq!(doc.found_count(), 0);
    assert_eq!(doc.raw, "");
}

#[test]
fn first_label_wins() {
    let text = "Tender Number: ABC/123\nSome filler text.\nTender Number: XYZ/456\n";
    assert_eq!(extract(text).meta.tender_number.as_deref(), Some("ABC/123"));
}

#[test]
fn tender_number_found_in_free_text() {
    let text = "Suppliers are invited to quote.\nPlease quote RFQ-2025/0456 on all correspondence.\n";
    let doc = extract(text);
    let number = doc.meta.tender_number.as_deref().unwrap();
    assert!(number.contains("RFQ-2025/0456"), "got {:?}", number);
}

#[test]
fn section_stops_at_next_heading() {
    let text = "\
SCOPE OF WORK
Supply and delivery of 40 laptops to the district office.
Installation of the standard operating environment.
Training of two administrators on site.
COMMERCIAL TERMS
Payment within 30 days of invoice.
";
    let doc = extract(text);
    assert_eq!(
        doc.scope.description.as_deref(),
        Some(
            "Supply and delivery of 40 laptops to the district office. \
             Installation of the standard operating environment. \
             Training of two administrators on site."
        )
    );
    assert!(!doc.scope.description.as_deref().unwrap().contains("Payment"));
}

#[test]
fn absent_flags_are_null_not_false() {
    let doc = extract("Tender Number: X-1\nNo registration requirements apply.\n");
    assert_eq!(doc.eligibility.csd.value, None);
    for key in FieldKey::ALL {
        if let Some(flag) = doc.flag_field(key) {
            assert_ne!(flag.value, Some(false), "{} must never be false", key.path());
        }
    }
}

#[test]
fn raw_is_the_input_verbatim() {
    for input in ["", "  padded  \r\n", SCENARIO, "ünïcödé\ttabs\n\n"] {
        assert_eq!(extract(input).raw, input);
    }
}

#[test]
fn extraction_is_deterministic() {
    assert_eq!(extract(SCENARIO), extract(SCENARIO));
}

#[test]
fn end_to_end_scenario() {
    let doc = extract(SCENARIO);
    assert_eq!(doc.meta.tender_number.as_deref(), Some("RFQ-2025/0456"));
    assert_eq!(doc.dates.submission_close.as_deref(), Some("2025-11-20"));
    assert!(doc.eligibility.bbbee.as_deref().unwrap().contains('2'));
    assert_eq!(
        doc.eligibility.other.as_deref(),
        Some(
            "Bidders must be registered on the Central Supplier Database. \
             Bidders must submit a valid tax compliance status pin."
        )
    );
    assert!(doc.eligibility.csd.is_set());
    assert!(doc.eligibility.tax_compliance.is_set());

    assert_eq!(doc.evaluation.method.as_deref(), Some("80/20"));
    assert_eq!(doc.evaluation.functionality_threshold.as_deref(), Some("70%"));
    let rubric = doc.evaluation.scoring_rubric.as_deref().unwrap();
    assert!(rubric.starts_with("Bids will be evaluated"));
    assert!(!rubric.contains("Bidders must"));
}

#[test]
fn submission_channels_are_recognised() {
    let text = "\
Tenders must be deposited in the tender box at the main entrance.
Enquiries may be sent to scm@dpw.gov.za.
Documents are available at https://www.etenders.gov.za/tender/4411.
";
    let doc = extract(text);
    assert_eq!(doc.submission.method.as_deref(), Some("Tender box"));
    assert_eq!(doc.submission.email.as_deref(), Some("scm@dpw.gov.za"));
    assert_eq!(
        doc.submission.url.as_deref(),
        Some("https://www.etenders.gov.za/tender/4411")
    );
}

#[test]
fn non_compulsory_briefing_is_not_flagged() {
    let doc = extract("A non-compulsory briefing session will be held on 3 March 2025.\n");
    assert_eq!(doc.eligibility.mandatory_briefing.value, None);

    let doc = extract("A compulsory briefing session will be held on 3 March 2025.\n");
    assert!(doc.eligibility.mandatory_briefing.is_set());
}
