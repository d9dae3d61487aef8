//! Pipeline configuration loaded from environment variables.
//!
//! # Example
//!
//! ```rust
//! use pagecraft_core::{Layout, PipelineConfig};
//!
//! let config = PipelineConfig::from_lookup(|name| match name {
//!     "OPENAI_API_KEY" => Some("sk-test".to_string()),
//!     "AI_LAYOUT_ADVERTORIAL_MAX_TOKENS" => Some("1200".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.rewrite.max_output_tokens_for(Layout::Advertorial), 1200);
//! assert_eq!(config.batch.requests_per_minute, 60);
//! ```

use std::str::FromStr;

use crate::fetch::FetchConfig;
use crate::rewrite::{Layout, RewriteConfig};
use crate::{PagecraftError, Result};

/// Worker pool and pacing for batch helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Concurrent items (default: 4). Zero is treated as one.
    pub workers: usize,
    /// Aggregate backend calls per minute across workers (default: 60). Zero disables pacing.
    pub requests_per_minute: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 4, requests_per_minute: 60 }
    }
}

/// Everything the pipeline needs, grouped by stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub rewrite: RewriteConfig,
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Unset or blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = PipelineConfig::default();

        if let Some(provider) = get("AI_PROVIDER") {
            config.rewrite.provider = provider.to_lowercase();
        }
        config.rewrite.api_key = get("OPENAI_API_KEY");
        if let Some(base) = get("OPENAI_BASE_URL") {
            config.rewrite.api_base = base;
        }
        if let Some(model) = get("AI_MODEL") {
            config.rewrite.model = model;
        }
        if let Some(value) = get("AI_TEMPERATURE") {
            config.rewrite.temperature = parse_number("AI_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("AI_MAX_OUTPUT_TOKENS") {
            config.rewrite.max_output_tokens = parse_number("AI_MAX_OUTPUT_TOKENS", &value)?;
        }
        if let Some(value) = get("AI_INPUT_TOKEN_BUDGET") {
            config.rewrite.input_token_budget = parse_number("AI_INPUT_TOKEN_BUDGET", &value)?;
        }

        for (layout, prefix) in
            [(Layout::Interstitial, "AI_LAYOUT_INTERSTITIAL"), (Layout::Advertorial, "AI_LAYOUT_ADVERTORIAL")]
        {
            let enabled_var = format!("{prefix}_ENABLED");
            let tokens_var = format!("{prefix}_MAX_TOKENS");
            let settings = config.rewrite.layouts.entry(layout).or_default();

            if let Some(value) = get(&enabled_var) {
                settings.enabled = parse_bool(&enabled_var, &value)?;
            }
            if let Some(value) = get(&tokens_var) {
                settings.max_output_tokens = Some(parse_number(&tokens_var, &value)?);
            }
        }

        if let Some(value) = get("AI_RATE_LIMIT_PER_MINUTE") {
            config.batch.requests_per_minute = parse_number("AI_RATE_LIMIT_PER_MINUTE", &value)?;
        }
        if let Some(value) = get("PAGECRAFT_WORKERS") {
            config.batch.workers = parse_number("PAGECRAFT_WORKERS", &value)?;
        }
        if let Some(value) = get("PAGECRAFT_FETCH_TIMEOUT") {
            config.fetch.timeout = parse_number("PAGECRAFT_FETCH_TIMEOUT", &value)?;
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| PagecraftError::Config(format!("{name} must be a number, got {value:?}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PagecraftError::Config(format!("{name} must be a boolean, got {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = PipelineConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.rewrite.provider, "openai");
        assert!(config.rewrite.api_key.is_none());
        assert_eq!(config.rewrite.model, "gpt-4o-mini");
        assert_eq!(config.rewrite.max_output_tokens, 2200);
        assert_eq!(config.rewrite.input_token_budget, 8000);
        assert!(config.rewrite.is_enabled(Layout::Interstitial));
        assert_eq!(config.batch, BatchConfig::default());
        assert_eq!(config.fetch.timeout, 20);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-live"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("AI_MODEL", "gpt-4.1"),
            ("AI_TEMPERATURE", "0.2"),
            ("AI_MAX_OUTPUT_TOKENS", "1500"),
            ("AI_INPUT_TOKEN_BUDGET", "6000"),
            ("AI_RATE_LIMIT_PER_MINUTE", "30"),
            ("AI_LAYOUT_INTERSTITIAL_ENABLED", "false"),
            ("AI_LAYOUT_ADVERTORIAL_MAX_TOKENS", "900"),
            ("PAGECRAFT_FETCH_TIMEOUT", "5"),
            ("PAGECRAFT_WORKERS", "8"),
        ]))
        .unwrap();

        assert_eq!(config.rewrite.provider, "openai");
        assert_eq!(config.rewrite.credential(), Some("sk-live"));
        assert_eq!(config.rewrite.api_base, "http://localhost:8080/v1");
        assert_eq!(config.rewrite.model, "gpt-4.1");
        assert_eq!(config.rewrite.temperature, 0.2);
        assert_eq!(config.rewrite.input_token_budget, 6000);
        assert!(!config.rewrite.is_enabled(Layout::Interstitial));
        assert_eq!(config.rewrite.max_output_tokens_for(Layout::Interstitial), 1500);
        assert_eq!(config.rewrite.max_output_tokens_for(Layout::Advertorial), 900);
        assert_eq!(config.batch, BatchConfig { workers: 8, requests_per_minute: 30 });
        assert_eq!(config.fetch.timeout, 5);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = PipelineConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(config.rewrite.api_key.is_none());
    }

    #[rstest]
    #[case("AI_TEMPERATURE", "warm")]
    #[case("AI_MAX_OUTPUT_TOKENS", "-5")]
    #[case("PAGECRAFT_WORKERS", "many")]
    #[case("AI_LAYOUT_ADVERTORIAL_ENABLED", "maybe")]
    fn test_invalid_values_name_the_variable(#[case] name: &str, #[case] value: &str) {
        let err = PipelineConfig::from_lookup(lookup(&[(name, value)])).unwrap_err();
        assert!(matches!(&err, PagecraftError::Config(msg) if msg.contains(name)), "{err}");
    }

    #[rstest]
    #[case("1", true)]
    #[case("TRUE", true)]
    #[case("off", false)]
    #[case("0", false)]
    fn test_parse_bool(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(parse_bool("X", value).unwrap(), expected);
    }
}
