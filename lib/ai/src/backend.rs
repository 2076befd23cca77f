//! Completion backend abstraction.
//!
//! Provides a unified interface for chat-completion providers. The engine's
//! AI handlers build a [`CompletionRequest`], hand it to whatever backend
//! the host wired in, and interpret the free-text or JSON-constrained
//! response themselves.

use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A request to a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user-facing message or content to complete against.
    pub user_message: String,
    /// System prompt framing the task.
    pub system_prompt: Option<String>,
    /// Model identifier override; backends supply a default.
    pub model: Option<String>,
    /// Optional JSON schema constraining the output to a JSON object.
    pub output_schema: Option<JsonValue>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Creates a new simple request with just the user message.
    #[must_use]
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            system_prompt: None,
            model: None,
            output_schema: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Overrides the model for this request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Adds an output schema for structured output.
    #[must_use]
    pub fn with_output_schema(mut self, schema: JsonValue) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A response from a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub content: String,
    /// Structured output, present when an output schema was supplied and
    /// the provider honored it.
    pub structured_output: Option<JsonValue>,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that produced the response.
    pub model: String,
}

impl CompletionResponse {
    /// Creates a plain-text response with no usage accounting.
    ///
    /// Convenient for test doubles and deterministic backends.
    #[must_use]
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured_output: None,
            usage: TokenUsage::default(),
            model: model.into(),
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for completion backends.
///
/// Implemented by the host process (HTTP provider client in production,
/// in-memory fakes in tests). Failures are surfaced as [`CompletionError`];
/// callers are expected to degrade locally, never to abort a workflow run.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    async fn complete(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, CompletionError>;

    /// Returns the default model name for this backend.
    fn model(&self) -> &str;
}
