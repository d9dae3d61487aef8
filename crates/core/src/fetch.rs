//! Fetch guard and local input helpers.
//!
//! [`fetch_url`] downloads a page under strict constraints: the final status
//! (after redirects) must be 2xx, the declared content type must be HTML when
//! present, and the body must stay under a fixed size ceiling. There are no
//! retries; one failed attempt fails the fetch.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::{FetchError, PagecraftError, Result};

/// Largest body accepted by the fetch guard (3 MiB).
pub const MAX_BODY_BYTES: u64 = 3 * 1024 * 1024;

const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Body size ceiling in bytes.
    pub max_body_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
                .to_string(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Raw result of a successful guarded fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status_code: u16,
    pub content_type: String,
    /// Declared length when the server sent one, otherwise the downloaded byte count.
    pub byte_size: u64,
    pub raw_body: String,
}

/// Checks the final status code.
pub fn check_status(status: u16) -> std::result::Result<(), FetchError> {
    if (200..300).contains(&status) { Ok(()) } else { Err(FetchError::Status { status }) }
}

/// Checks the declared content type. An empty header is accepted.
pub fn check_content_type(status: u16, content_type: &str) -> std::result::Result<(), FetchError> {
    let lowered = content_type.to_lowercase();
    if lowered.is_empty() || ACCEPTED_CONTENT_TYPES.iter().any(|accepted| lowered.contains(accepted)) {
        Ok(())
    } else {
        Err(FetchError::NotHtml { status, content_type: content_type.to_string() })
    }
}

/// Checks a body size (declared or observed) against the ceiling.
pub fn check_size(status: u16, size: u64, limit: u64) -> std::result::Result<(), FetchError> {
    if size > limit { Err(FetchError::TooLarge { status, size, limit }) } else { Ok(()) }
}

/// Fetches a page through the guard.
///
/// Redirects are followed transparently and count as the same logical fetch.
/// The body is streamed so an oversized page without a declared length is
/// abandoned as soon as it crosses the ceiling.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> std::result::Result<FetchResult, FetchError> {
    let parsed_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(
            "URL must use the http:// or https:// scheme".to_string(),
        ));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(|e| FetchError::Transport { status: None, message: e.to_string() })?;

    let mut response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .await
        .map_err(|e| transport_error(e, config.timeout))?;

    let status = response.status().as_u16();
    check_status(status)?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    check_content_type(status, &content_type)?;

    let declared = response.content_length();
    if let Some(size) = declared {
        check_size(status, size, config.max_body_bytes)?;
    }

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| transport_error(e, config.timeout))? {
        body.extend_from_slice(&chunk);
        check_size(status, body.len() as u64, config.max_body_bytes)?;
    }

    let byte_size = declared.unwrap_or(body.len() as u64);
    debug!(status, byte_size, content_type = %content_type, "page fetched");

    Ok(FetchResult {
        status_code: status,
        content_type,
        byte_size,
        raw_body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn transport_error(err: reqwest::Error, timeout: u64) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { timeout }
    } else {
        FetchError::Transport { status: err.status().map(|s| s.as_u16()), message: err.to_string() }
    }
}

/// Reads text content from a local file.
pub fn read_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(PagecraftError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(PagecraftError::from)
    }
}

/// Reads text content from standard input until EOF.
pub fn read_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}
