//! Document bytes to plain text (PDF, DOCX, HTML, plain text).

use crate::error::ConvertError;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use zip::read::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    PlainText,
    Html,
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Kind for a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "csv" | "md" => Some(DocumentKind::PlainText),
            "html" | "htm" => Some(DocumentKind::Html),
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// Kind for an HTTP `Content-Type` header value (parameters ignored).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::Docx)
            }
            "text/html" | "application/xhtml+xml" => Some(DocumentKind::Html),
            "text/plain" | "text/csv" | "text/markdown" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::PlainText => "txt",
            DocumentKind::Html => "html",
            DocumentKind::Docx => "docx",
            DocumentKind::Pdf => "pdf",
        }
    }
}

/// Convert document bytes to text according to the declared extension.
pub fn convert(bytes: &[u8], extension: &str) -> Result<String, ConvertError> {
    let kind = DocumentKind::from_extension(extension)
        .ok_or_else(|| ConvertError::Unsupported(extension.to_string()))?;
    let text = match kind {
        DocumentKind::PlainText => decode_text(bytes),
        DocumentKind::Html => html_to_text(&decode_text(bytes)),
        DocumentKind::Docx => docx_to_text(bytes)?,
        DocumentKind::Pdf => pdf_to_text(bytes)?,
    };
    if text.trim().is_empty() {
        return Err(ConvertError::Empty);
    }
    tracing::debug!(kind = kind.extension(), bytes = bytes.len(), chars = text.len(), "converted document");
    Ok(text)
}

/// Best-effort conversion: `None` on any failure (logged).
pub fn document_to_text(bytes: &[u8], extension: &str) -> Option<String> {
    match convert(bytes, extension) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(extension, error = %e, "document conversion failed");
            None
        }
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn html_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
                .expect("html script regex"),
            Regex::new(r"(?i)<\s*(?:br|/p|/div|/li|/tr|/h[1-6]|/table)\b[^>]*>")
                .expect("html block regex"),
            Regex::new(r"<[^>]*>").expect("html tag regex"),
        )
    })
}

fn html_to_text(html: &str) -> String {
    let (scripts, blocks, tags) = html_patterns();
    let out = scripts.replace_all(html, "");
    let out = blocks.replace_all(&out, "\n");
    let out = tags.replace_all(&out, " ");
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Walk `word/document.xml`: each paragraph becomes a line.
fn docx_to_text(bytes: &[u8]) -> Result<String, ConvertError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn pdf_to_text(bytes: &[u8]) -> Result<String, ConvertError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(ConvertError::NotPdf);
    }
    let owned = bytes.to_vec();
    // pdf-extract panics on some malformed inputs.
    match std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&owned)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ConvertError::Pdf(format!("{e:?}"))),
        Err(_) => Err(ConvertError::Pdf("extractor panicked".to_string())),
    }
}
