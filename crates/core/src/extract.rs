//! Content cleaner entry points.
//!
//! [`extract_from_html`] runs the full markup pipeline (noise removal, text
//! conversion, boilerplate removal). [`fetch_and_extract`] puts the fetch guard
//! in front of it and attaches response metadata. The text-only path lives in
//! [`crate::postprocess::reclean`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::FetchError;
use crate::fetch::{FetchConfig, fetch_url};
use crate::formatters::text::element_to_text;
use crate::parse::Document;
use crate::postprocess::remove_boilerplate;
use crate::preprocess::strip_noise;

/// Cleaned page content, owned by the caller once returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Normalized plain text.
    pub cleaned_text: String,
    /// Trimmed `<title>` text, if any.
    pub title: Option<String>,
    /// Final HTTP status of the fetch.
    pub http_status: Option<u16>,
    /// Declared or observed body size in bytes.
    pub content_length: Option<u64>,
    /// Populated only when the fetch failed.
    pub fetch_error: Option<String>,
}

impl ExtractedContent {
    /// Builds the failure shape recorded for an item whose fetch failed.
    pub fn failed(err: &FetchError) -> Self {
        Self { http_status: err.status(), fetch_error: Some(err.to_string()), ..Default::default() }
    }

    pub fn is_failure(&self) -> bool {
        self.fetch_error.is_some()
    }
}

/// Cleans raw markup into `(cleaned_text, title)`.
///
/// Title lookup never fails; a missing or blank title yields `None`.
pub fn extract_from_html(html: &str) -> (String, Option<String>) {
    let mut doc = Document::parse(html);
    let title = doc.title();

    strip_noise(&mut doc);
    let text = element_to_text(doc.body());
    let cleaned = remove_boilerplate(&text).trim().to_string();

    debug!(chars = cleaned.chars().count(), has_title = title.is_some(), "content extracted");
    (cleaned, title)
}

/// Fetches a page through the guard and cleans it.
///
/// Used both for first-time extraction and for refetching a stored item.
pub async fn fetch_and_extract(url: &str, config: &FetchConfig) -> Result<ExtractedContent, FetchError> {
    let fetched = fetch_url(url, config).await?;
    let (cleaned_text, title) = extract_from_html(&fetched.raw_body);

    Ok(ExtractedContent {
        cleaned_text,
        title,
        http_status: Some(fetched.status_code),
        content_length: Some(fetched.byte_size),
        fetch_error: None,
    })
}
