//! Structured field extraction from South African public-procurement
//! (tender) documents.
//!
//! The core is [`extract`]: plain text in, a fully-shaped [`DocExtraction`]
//! out, driven by the declarative rule table in [`models`]. Around it sit the
//! document converter and fetcher ([`services`]), the display [`summary`], and
//! the per-document [`pipeline`].

pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod summary;
pub mod types;

pub use config::{ExtractorConfig, FetchConfig};
pub use error::{ConfigError, ConvertError, Error, FetchError};
pub use extract::{default_extractor, extract, Extractor};
pub use pipeline::{ExtractionOutcome, TenderDocumentRecord};
pub use summary::{summarize, TenderSummary};
pub use types::{DocExtraction, ExtractedField, FieldKey, FieldValue};
