//! HTTP download of tender documents.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::services::convert::DocumentKind;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Extension the converter should use, when it could be inferred.
    pub extension: Option<String>,
}

pub struct DocumentFetcher {
    client: Client,
    config: FetchConfig,
}

impl DocumentFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// GET `url`, retrying once after the configured backoff on transient failures.
    pub fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        match self.fetch_once(url) {
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    url,
                    error = %e,
                    backoff_ms = self.config.retry_backoff.as_millis() as u64,
                    "fetch failed, retrying once"
                );
                std::thread::sleep(self.config.retry_backoff);
                self.fetch_once(url)
            }
            other => other,
        }
    }

    fn fetch_once(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let limit = self.config.max_bytes;
        if let Some(size) = response.content_length() {
            if size > limit {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = read_capped(response, url, limit)?;
        let extension = infer_extension(url, content_type.as_deref());
        tracing::info!(url, bytes = bytes.len(), extension = ?extension, "fetched document");
        Ok(FetchedDocument {
            url: url.to_string(),
            bytes,
            content_type,
            extension,
        })
    }
}

/// Read at most `limit` bytes of body; one byte more means the document is
/// too large. Servers may omit or understate `Content-Length`.
fn read_capped<R: Read>(body: R, url: &str, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut bytes = Vec::new();
    body.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
    if bytes.len() as u64 > limit {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }
    Ok(bytes)
}

/// Extension from the URL path, falling back to the content type.
pub fn infer_extension(url: &str, content_type: Option<&str>) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let from_path = path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| DocumentKind::from_extension(ext).is_some())
        .map(|ext| ext.to_ascii_lowercase());
    from_path.or_else(|| {
        content_type
            .and_then(DocumentKind::from_content_type)
            .map(|kind| kind.extension().to_string())
    })
}
