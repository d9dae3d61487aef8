//! Rewrite engine.
//!
//! [`RewriteEngine::generate`] turns cleaned page text into layout-specific
//! markdown through a chat-completion backend. Input is truncated to the
//! configured token budget first; the response must carry non-empty content.
//!
//! # Example
//!
//! ```rust
//! use pagecraft_core::{Layout, RewriteConfig};
//!
//! let config = RewriteConfig::builder()
//!     .api_key("sk-test")
//!     .layout_max_output_tokens(Layout::Interstitial, 3000)
//!     .build();
//!
//! assert_eq!(config.max_output_tokens_for(Layout::Interstitial), 3000);
//! assert_eq!(config.max_output_tokens_for(Layout::Advertorial), 2200);
//! ```

pub mod client;
pub mod prompt;
pub mod truncate;

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::RewriteError;
use client::ChatRequest;
pub use prompt::{ChatMessage, PromptVersion, Role, SectionSchema, build_messages};
pub use truncate::truncate_to_token_budget;

/// The only backend the engine talks to.
pub const SUPPORTED_PROVIDER: &str = "openai";

/// Named output structure requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Interstitial,
    Advertorial,
    /// Any other layout name. Uses the generic prompt.
    Generic,
}

impl Layout {
    /// Parses a layout name, case-insensitively. Unknown names map to [`Layout::Generic`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "interstitial" => Layout::Interstitial,
            "advertorial" => Layout::Advertorial,
            _ => Layout::Generic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Interstitial => "interstitial",
            Layout::Advertorial => "advertorial",
            Layout::Generic => "generic",
        }
    }

    /// Phrase used in the system instruction.
    pub fn role_description(self) -> &'static str {
        match self {
            Layout::Interstitial => "interstitial page",
            Layout::Advertorial => "advertorial article",
            Layout::Generic => "landing page",
        }
    }
}

impl FromStr for Layout {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Layout::parse(s))
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-layout overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSettings {
    pub enabled: bool,
    /// Output cap for this layout; `None` falls back to the global cap.
    pub max_output_tokens: Option<u32>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self { enabled: true, max_output_tokens: None }
    }
}

/// Backend configuration for the rewrite engine.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Backend selector (default: "openai").
    pub provider: String,
    /// Bearer credential. Blank counts as missing.
    pub api_key: Option<String>,
    /// Base URL of the chat-completion API (default: "https://api.openai.com/v1").
    pub api_base: String,
    /// Model identifier (default: "gpt-4o-mini").
    pub model: String,
    /// Sampling temperature (default: 0.7).
    pub temperature: f64,
    /// Global output cap in tokens (default: 2200).
    pub max_output_tokens: u32,
    /// Input budget in tokens (default: 8000).
    pub input_token_budget: u32,
    /// Request timeout in seconds (default: 60).
    pub timeout: u64,
    /// Layout overrides. Layouts without an entry use [`LayoutSettings::default`].
    pub layouts: HashMap<Layout, LayoutSettings>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            provider: SUPPORTED_PROVIDER.to_string(),
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_output_tokens: 2200,
            input_token_budget: 8000,
            timeout: 60,
            layouts: HashMap::new(),
        }
    }
}

impl RewriteConfig {
    pub fn builder() -> RewriteConfigBuilder {
        RewriteConfigBuilder::new()
    }

    pub fn layout_settings(&self, layout: Layout) -> LayoutSettings {
        self.layouts.get(&layout).copied().unwrap_or_default()
    }

    pub fn is_enabled(&self, layout: Layout) -> bool {
        self.layout_settings(layout).enabled
    }

    /// Output cap for `layout`, resolved on every call.
    pub fn max_output_tokens_for(&self, layout: Layout) -> u32 {
        self.layout_settings(layout).max_output_tokens.unwrap_or(self.max_output_tokens)
    }

    /// The configured key, if present and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

/// Builder for RewriteConfig.
pub struct RewriteConfigBuilder {
    config: RewriteConfig,
}

impl RewriteConfigBuilder {
    pub fn new() -> Self {
        Self { config: RewriteConfig::default() }
    }

    pub fn provider(mut self, value: impl Into<String>) -> Self {
        self.config.provider = value.into();
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.config.api_key = Some(value.into());
        self
    }

    pub fn api_base(mut self, value: impl Into<String>) -> Self {
        self.config.api_base = value.into();
        self
    }

    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.config.model = value.into();
        self
    }

    pub fn temperature(mut self, value: f64) -> Self {
        self.config.temperature = value;
        self
    }

    pub fn max_output_tokens(mut self, value: u32) -> Self {
        self.config.max_output_tokens = value;
        self
    }

    pub fn input_token_budget(mut self, value: u32) -> Self {
        self.config.input_token_budget = value;
        self
    }

    pub fn timeout(mut self, value: u64) -> Self {
        self.config.timeout = value;
        self
    }

    pub fn layout_enabled(mut self, layout: Layout, enabled: bool) -> Self {
        self.config.layouts.entry(layout).or_default().enabled = enabled;
        self
    }

    pub fn layout_max_output_tokens(mut self, layout: Layout, value: u32) -> Self {
        self.config.layouts.entry(layout).or_default().max_output_tokens = Some(value);
        self
    }

    pub fn build(self) -> RewriteConfig {
        self.config
    }
}

impl Default for RewriteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated generation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub layout: Layout,
    pub source_text: String,
}

impl RewriteRequest {
    pub fn new(layout: Layout, source_text: impl Into<String>) -> Self {
        Self { layout, source_text: source_text.into() }
    }

    pub fn validate(&self) -> Result<(), RewriteError> {
        if self.source_text.trim().is_empty() { Err(RewriteError::EmptySource) } else { Ok(()) }
    }
}

/// Generated content and its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteResult {
    /// Markdown. The canonical stored form.
    pub content: String,
    pub model_id: String,
    pub tokens_input: Option<u32>,
    pub tokens_output: Option<u32>,
    pub temperature: f64,
    pub provider: String,
    /// Tag of the template that produced `content`; see [`PromptVersion`].
    pub prompt_version: String,
}

impl RewriteResult {
    pub fn version(&self) -> PromptVersion {
        PromptVersion::parse(&self.prompt_version)
    }
}

/// Stateless client for the generation backend.
#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    config: RewriteConfig,
}

impl RewriteEngine {
    pub fn new(config: RewriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Generates layout content from cleaned text.
    ///
    /// Configuration problems (unsupported provider, missing key, disabled
    /// layout) and empty input are rejected before any network traffic.
    pub async fn generate(&self, layout: Layout, source_text: &str) -> Result<RewriteResult, RewriteError> {
        self.generate_request(&RewriteRequest::new(layout, source_text)).await
    }

    /// Checks provider, credential and layout switch without touching the
    /// network. Returns the credential to send.
    pub fn preflight(&self, layout: Layout) -> Result<&str, RewriteError> {
        let config = &self.config;
        if config.provider.trim() != SUPPORTED_PROVIDER {
            return Err(RewriteError::UnsupportedProvider(config.provider.clone()));
        }
        let api_key = config.credential().ok_or(RewriteError::MissingCredential)?;
        if !config.is_enabled(layout) {
            return Err(RewriteError::LayoutDisabled(layout));
        }
        Ok(api_key)
    }

    pub async fn generate_request(&self, request: &RewriteRequest) -> Result<RewriteResult, RewriteError> {
        let config = &self.config;
        let api_key = self.preflight(request.layout)?;
        request.validate()?;

        let truncated = truncate_to_token_budget(&request.source_text, config.input_token_budget);
        if truncated != request.source_text {
            debug!(
                source_chars = request.source_text.chars().count(),
                truncated_chars = truncated.chars().count(),
                "source truncated to input budget"
            );
        }

        let (messages, version) = build_messages(request.layout, &truncated);
        let chat = ChatRequest {
            model: &config.model,
            temperature: config.temperature,
            max_tokens: config.max_output_tokens_for(request.layout),
            messages: &messages,
        };

        let response = client::send(config, api_key, &chat).await?;
        let content = response.first_content().ok_or(RewriteError::EmptyContent)?;
        let usage = response.usage.unwrap_or_default();

        debug!(layout = %request.layout, prompt_version = %version, chars = content.len(), "content generated");

        Ok(RewriteResult {
            content,
            model_id: config.model.clone(),
            tokens_input: usage.prompt_tokens,
            tokens_output: usage.completion_tokens,
            temperature: config.temperature,
            provider: config.provider.clone(),
            prompt_version: version.as_str().to_string(),
        })
    }
}
