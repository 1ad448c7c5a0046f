//! Fetch → convert → extract → summarise, per document and in batches.
//!
//! Nothing here returns an error: a document that cannot be turned into text
//! becomes a `Skipped` record, and the extractor is never run on it.

use crate::error::ConvertError;
use crate::extract::Extractor;
use crate::services::convert;
use crate::services::fetch::DocumentFetcher;
use crate::summary::{summarize, TenderSummary};
use crate::types::DocExtraction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Documents processed at the same time by [`process_paths`].
pub const CONCURRENCY: usize = 5;

/// Largest local file accepted for conversion.
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExtractionOutcome {
    Extracted { extraction: Box<DocExtraction> },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderDocumentRecord {
    /// File path or URL the document came from.
    pub source: String,
    /// RFC 3339 timestamp of processing.
    pub extracted_at: String,
    pub outcome: ExtractionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TenderSummary>,
}

impl TenderDocumentRecord {
    pub fn extraction(&self) -> Option<&DocExtraction> {
        match &self.outcome {
            ExtractionOutcome::Extracted { extraction } => Some(extraction.as_ref()),
            ExtractionOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Skipped { .. })
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn skipped(source: &str, reason: String) -> TenderDocumentRecord {
    tracing::warn!(source, reason = %reason, "skipping document");
    TenderDocumentRecord {
        source: source.to_string(),
        extracted_at: now(),
        outcome: ExtractionOutcome::Skipped { reason },
        summary: None,
    }
}

/// Run the extractor on already-converted text; blank text is skipped.
pub fn process_text(extractor: &Extractor, source: &str, text: &str) -> TenderDocumentRecord {
    if text.trim().is_empty() {
        return skipped(source, ConvertError::Empty.to_string());
    }
    let extraction = extractor.extract(text);
    let summary = summarize(&extraction);
    tracing::info!(source, found = extraction.found_count(), "extracted document");
    TenderDocumentRecord {
        source: source.to_string(),
        extracted_at: now(),
        outcome: ExtractionOutcome::Extracted {
            extraction: Box::new(extraction),
        },
        summary: Some(summary),
    }
}

pub fn process_bytes(
    extractor: &Extractor,
    source: &str,
    bytes: &[u8],
    extension: &str,
) -> TenderDocumentRecord {
    match convert::convert(bytes, extension) {
        Ok(text) => process_text(extractor, source, &text),
        Err(e) => skipped(source, format!("conversion failed: {}", e)),
    }
}

pub fn process_path(extractor: &Extractor, path: &Path) -> TenderDocumentRecord {
    let source = path.display().to_string();
    let extension = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_string(),
        None => return skipped(&source, "file has no extension".to_string()),
    };
    match fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_BYTES => {
            return skipped(
                &source,
                format!("file too large ({} bytes, max {})", meta.len(), MAX_FILE_BYTES),
            )
        }
        Ok(_) => {}
        Err(e) => return skipped(&source, read_error(&e)),
    }
    match fs::read(path) {
        Ok(bytes) => process_bytes(extractor, &source, &bytes, &extension),
        Err(e) => skipped(&source, read_error(&e)),
    }
}

fn read_error(e: &std::io::Error) -> String {
    if e.kind() == std::io::ErrorKind::NotFound {
        "file not found".to_string()
    } else {
        format!("could not read file: {}", e)
    }
}

/// Download and process a document; `extension` overrides the inferred one.
pub fn process_url(
    extractor: &Extractor,
    fetcher: &DocumentFetcher,
    url: &str,
    extension: Option<&str>,
) -> TenderDocumentRecord {
    let doc = match fetcher.fetch(url) {
        Ok(doc) => doc,
        Err(e) => return skipped(url, format!("fetch failed: {}", e)),
    };
    let ext = match extension.map(str::to_string).or(doc.extension) {
        Some(ext) => ext,
        None => return skipped(url, "could not determine document type".to_string()),
    };
    process_bytes(extractor, url, &doc.bytes, &ext)
}

/// Process many files, [`CONCURRENCY`] at a time; records keep input order.
pub fn process_paths(extractor: &Extractor, paths: &[PathBuf]) -> Vec<TenderDocumentRecord> {
    let mut records = Vec::with_capacity(paths.len());
    for chunk in paths.chunks(CONCURRENCY) {
        let chunk_records: Vec<TenderDocumentRecord> = std::thread::scope(|s| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|path| s.spawn(move || process_path(extractor, path)))
                .collect();
            handles
                .into_iter()
                .zip(chunk)
                .map(|(handle, path)| {
                    handle.join().unwrap_or_else(|_| {
                        skipped(&path.display().to_string(), "worker panicked".to_string())
                    })
                })
                .collect()
        });
        records.extend(chunk_records);
    }
    let done = records.iter().filter(|r| !r.is_skipped()).count();
    tracing::info!(total = records.len(), extracted = done, skipped = records.len() - done, "batch finished");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::default_extractor;

    #[test]
    fn unsupported_bytes_are_skipped_not_extracted() {
        let record = process_bytes(default_extractor(), "x.xlsx", b"PK..", "xlsx");
        assert!(record.is_skipped());
        assert!(record.summary.is_none());
        assert!(record.extraction().is_none());
    }

    #[test]
    fn empty_text_is_skipped() {
        let record = process_bytes(default_extractor(), "blank.txt", b"   \n", "txt");
        match &record.outcome {
            ExtractionOutcome::Skipped { reason } => assert!(reason.contains("no text")),
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let record = process_bytes(default_extractor(), "a.txt", b"Tender Number: RFQ-1", "txt");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"]["status"], "extracted");
        assert_eq!(json["outcome"]["extraction"]["meta"]["tenderNumber"]["value"], "RFQ-1");
        assert!(json["summary"].is_object());

        let skipped = process_bytes(default_extractor(), "a.bin", b"", "bin");
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["outcome"]["status"], "skipped");
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn blank_text_is_never_extracted() {
        let record = process_text(default_extractor(), "stdin", " \n\t\n");
        assert!(record.is_skipped());
        assert!(record.extraction().is_none());
    }

    #[test]
    fn missing_file_is_skipped() {
        let record = process_path(default_extractor(), Path::new("/definitely/not/here.txt"));
        assert_eq!(
            record.outcome,
            ExtractionOutcome::Skipped {
                reason: "file not found".to_string()
            }
        );
    }
}
