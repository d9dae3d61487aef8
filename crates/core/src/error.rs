//! Error types for pagecraft operations.
//!
//! Each pipeline stage that can fail has its own error enum: [`FetchError`] for the
//! fetch guard and [`RewriteError`] for the generation backend. [`PagecraftError`]
//! wraps both, together with configuration and I/O failures, for callers that
//! drive the whole pipeline.
//!
//! # Example
//!
//! ```rust
//! use pagecraft_core::{FailureRecord, FetchError};
//!
//! let err = FetchError::Status { status: 404 };
//! let record = FailureRecord::from_fetch(&err);
//! assert_eq!(record.http_status, Some(404));
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rewrite::Layout;

/// Maximum length of an error message kept in a [`FailureRecord`].
pub const FAILURE_MESSAGE_LIMIT: usize = 500;

/// Maximum length of a backend response body quoted in [`RewriteError::BackendStatus`].
pub const BACKEND_BODY_LIMIT: usize = 300;

/// Errors raised while retrieving a page.
///
/// Every variant that happens after a response arrived carries the HTTP status,
/// so callers can persist it next to the item as fetch diagnostics.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The final response status (after redirects) was outside `[200, 300)`.
    #[error("Request failed (HTTP {status}): page unreachable")]
    Status { status: u16 },

    /// The response declared a content type that is not HTML.
    #[error("The URL did not return HTML content (HTTP {status}, content type {content_type:?})")]
    NotHtml { status: u16, content_type: String },

    /// The body exceeded the configured size ceiling.
    #[error("The page is too large to process ({size} bytes, limit {limit} bytes)")]
    TooLarge { status: u16, size: u64, limit: u64 },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Connection, DNS, TLS or body-read failures.
    #[error("HTTP request failed: {message}")]
    Transport { status: Option<u16>, message: String },
}

impl FetchError {
    /// HTTP status of the failed fetch, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } => Some(*status),
            FetchError::NotHtml { status, .. } => Some(*status),
            FetchError::TooLarge { status, .. } => Some(*status),
            FetchError::Transport { status, .. } => *status,
            FetchError::InvalidUrl(_) | FetchError::Timeout { .. } => None,
        }
    }
}

/// Errors raised by the rewrite engine.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// The configured provider is not one the engine can talk to.
    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    /// No API key is configured.
    #[error("Missing API key for the generation backend. Set OPENAI_API_KEY in your environment.")]
    MissingCredential,

    /// The requested layout is disabled by configuration.
    #[error("Layout {0} is disabled by configuration")]
    LayoutDisabled(Layout),

    /// The source text was empty after trimming.
    #[error("Source text is empty; nothing to rewrite")]
    EmptySource,

    /// The request never produced a response.
    #[error("AI request failed: {0}")]
    Transport(String),

    /// The backend did not answer within the configured timeout.
    #[error("AI request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The backend answered with a non-2xx status.
    #[error("AI request failed (HTTP {status}): {body}")]
    BackendStatus { status: u16, body: String },

    /// The backend answered 2xx but the payload could not be decoded.
    #[error("AI response could not be decoded: {0}")]
    MalformedResponse(String),

    /// The backend answered 2xx without any message content.
    #[error("AI response did not contain content")]
    EmptyContent,
}

impl RewriteError {
    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RewriteError::BackendStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Umbrella error for pipeline callers.
#[derive(Error, Debug)]
pub enum PagecraftError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch record (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PagecraftError {
    /// HTTP status attached to the underlying fetch or backend failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            PagecraftError::Fetch(err) => err.status(),
            PagecraftError::Rewrite(err) => err.status(),
            _ => None,
        }
    }
}

/// Result type alias for PagecraftError.
pub type Result<T> = std::result::Result<T, PagecraftError>;

/// Persistable failure diagnostics for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// HTTP status when the failure happened after a response arrived.
    pub http_status: Option<u16>,
    /// Human-readable message, truncated to [`FAILURE_MESSAGE_LIMIT`] characters.
    pub message: String,
}

impl FailureRecord {
    pub fn new(http_status: Option<u16>, message: &str) -> Self {
        Self { http_status, message: truncate_chars(message, FAILURE_MESSAGE_LIMIT) }
    }

    pub fn from_fetch(err: &FetchError) -> Self {
        Self::new(err.status(), &err.to_string())
    }

    pub fn from_rewrite(err: &RewriteError) -> Self {
        Self::new(err.status(), &err.to_string())
    }
}

impl From<&PagecraftError> for FailureRecord {
    fn from(err: &PagecraftError) -> Self {
        Self::new(err.status(), &err.to_string())
    }
}

/// Truncates to at most `limit` characters without splitting a code point.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_is_carried() {
        assert_eq!(FetchError::Status { status: 404 }.status(), Some(404));
        assert_eq!(
            FetchError::NotHtml { status: 200, content_type: "application/json".into() }.status(),
            Some(200)
        );
        assert_eq!(FetchError::Timeout { timeout: 20 }.status(), None);
    }

    #[test]
    fn test_fetch_messages_are_distinguishable() {
        let unreachable = FetchError::Status { status: 503 }.to_string();
        let not_html = FetchError::NotHtml { status: 200, content_type: "image/png".into() }.to_string();
        let too_large = FetchError::TooLarge { status: 200, size: 10, limit: 5 }.to_string();

        assert!(unreachable.contains("503"));
        assert!(not_html.contains("did not return HTML"));
        assert!(too_large.contains("too large"));
    }

    #[test]
    fn test_rewrite_messages() {
        assert!(RewriteError::UnsupportedProvider("acme".into()).to_string().contains("acme"));
        assert!(RewriteError::MissingCredential.to_string().contains("OPENAI_API_KEY"));
        let err = RewriteError::BackendStatus { status: 429, body: "rate limited".into() };
        assert!(err.to_string().contains("429"));
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_failure_record_truncates() {
        let long = "x".repeat(FAILURE_MESSAGE_LIMIT + 50);
        let record = FailureRecord::new(Some(500), &long);
        assert_eq!(record.message.chars().count(), FAILURE_MESSAGE_LIMIT);
        assert_eq!(record.http_status, Some(500));
    }

    #[test]
    fn test_umbrella_status() {
        let err: PagecraftError = FetchError::Status { status: 410 }.into();
        assert_eq!(err.status(), Some(410));
        assert_eq!(FailureRecord::from(&err).http_status, Some(410));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
