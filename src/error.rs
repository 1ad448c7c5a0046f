use thiserror::Error;

/// Crate-level error for the fallible edges around the extractor.
///
/// The extractor itself never fails; these cover rule compilation,
/// configuration, and the document fetch/convert steps.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid pattern for {field}: {source}")]
    Pattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed reading response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document at {url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

impl FetchError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_connect() || e.is_timeout(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Body { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            FetchError::TooLarge { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported document type: {0:?}")]
    Unsupported(String),

    #[error("document contains no text")]
    Empty,

    #[error("not a valid PDF (missing %PDF- header)")]
    NotPdf,

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid DOCX XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_classify_as_transient_only_for_server_side() {
        let busy = FetchError::Status { status: 503, url: "https://x".into() };
        let throttled = FetchError::Status { status: 429, url: "https://x".into() };
        let missing = FetchError::Status { status: 404, url: "https://x".into() };
        assert!(busy.is_transient());
        assert!(throttled.is_transient());
        assert!(!missing.is_transient());
    }

    #[test]
    fn too_large_is_never_retried() {
        let err = FetchError::TooLarge { url: "https://x".into(), limit: 5 };
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "document at https://x is larger than 5 bytes");
    }
}
