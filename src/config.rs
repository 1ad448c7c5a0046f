//! Environment-driven tunables.
//!
//! `.env` is loaded first (if present) so deployments can drop settings next
//! to the binary; real environment variables win over it.

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SOURCE_TAG: &str = "doc.text";
pub const DEFAULT_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_SECTION_MAX_LINES: usize = 12;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_RETRY_BACKOFF_MS: u64 = 1500;
const DEFAULT_FETCH_MAX_BYTES: u64 = 50 * 1024 * 1024;

fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Settings that shape every `ExtractedField` and section capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Maximum lines accumulated after a section header.
    pub section_max_lines: usize,
    /// Confidence stamped on every leaf, found or not.
    pub default_confidence: f64,
    /// Provenance tag stamped on every leaf.
    pub source: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            section_max_lines: DEFAULT_SECTION_MAX_LINES,
            default_confidence: DEFAULT_CONFIDENCE,
            source: DEFAULT_SOURCE_TAG.to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(n) = parse_key::<usize, _>(&lookup, "TENDER_SECTION_MAX_LINES")? {
            if n == 0 {
                return Err(invalid("TENDER_SECTION_MAX_LINES", "0", "must be at least 1"));
            }
            config.section_max_lines = n;
        }
        if let Some(c) = parse_key::<f64, _>(&lookup, "TENDER_DEFAULT_CONFIDENCE")? {
            if !(0.0..=1.0).contains(&c) {
                return Err(invalid(
                    "TENDER_DEFAULT_CONFIDENCE",
                    &c.to_string(),
                    "must be within [0, 1]",
                ));
            }
            config.default_confidence = c;
        }
        if let Some(tag) = lookup("TENDER_SOURCE_TAG") {
            let tag = tag.trim();
            if !tag.is_empty() {
                config.source = tag.to_string();
            }
        }
        Ok(config)
    }
}

/// Settings for the HTTP document fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub retry_backoff: Duration,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(DEFAULT_FETCH_RETRY_BACKOFF_MS),
            max_bytes: DEFAULT_FETCH_MAX_BYTES,
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(secs) = parse_key::<u64, _>(&lookup, "TENDER_FETCH_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_key::<u64, _>(&lookup, "TENDER_FETCH_RETRY_BACKOFF_MS")? {
            config.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(bytes) = parse_key::<u64, _>(&lookup, "TENDER_FETCH_MAX_BYTES")? {
            config.max_bytes = bytes;
        }
        Ok(config)
    }
}

fn parse_key<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(key) {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| invalid(key, &raw, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
