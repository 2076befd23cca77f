//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`CHATFLOW_` prefix, `__` separator), e.g.
//! `CHATFLOW_COMPLETION__API_KEY=…`.

use serde::Deserialize;

/// Top-level server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Completion-provider settings.
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Completion-provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible chat completions API.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Bearer token; empty disables the provider and every AI node
    /// degrades to its local fallback.
    #[serde(default)]
    pub api_key: String,

    /// Default model for requests that do not override it.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_completion_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_completion_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_completion_timeout_seconds() -> u64 {
    30
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base_url(),
            api_key: String::new(),
            model: default_completion_model(),
            timeout_seconds: default_completion_timeout_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if present configuration values fail to parse.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CHATFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_environment() {
        let config: ServerConfig =
            serde_json::from_value(serde_json::json!({})).expect("defaults deserialize");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert!(config.completion.api_key.is_empty());
    }
}
