//! Chat-completion wire format and transport.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RewriteConfig;
use super::prompt::ChatMessage;
use crate::RewriteError;
use crate::error::{BACKEND_BODY_LIMIT, truncate_chars};

/// Request body for `POST {api_base}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting. Either count may be missing; missing is not zero.
#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
}

impl ChatResponse {
    /// Trimmed content of the first choice, if non-empty.
    pub fn first_content(&self) -> Option<String> {
        let content = self.choices.first()?.message.content.as_deref()?.trim();
        if content.is_empty() { None } else { Some(content.to_string()) }
    }
}

/// Endpoint URL for chat completions under `api_base`.
pub fn completions_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

/// Sends one chat-completion request. No retries.
pub async fn send(
    config: &RewriteConfig, api_key: &str, request: &ChatRequest<'_>,
) -> Result<ChatResponse, RewriteError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(|e| RewriteError::Transport(e.to_string()))?;

    let url = completions_url(&config.api_base);
    debug!(%url, model = request.model, max_tokens = request.max_tokens, "sending chat completion");

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                RewriteError::Timeout { timeout: config.timeout }
            } else {
                RewriteError::Transport(e.to_string())
            }
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| RewriteError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(RewriteError::BackendStatus {
            status: status.as_u16(),
            body: truncate_chars(body.trim(), BACKEND_BODY_LIMIT),
        });
    }

    serde_json::from_str(&body).map_err(|e| RewriteError::MalformedResponse(e.to_string()))
}
