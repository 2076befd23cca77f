//! Production boundary implementations.
//!
//! The engine only sees the traits from `chatflow-ai` and
//! `chatflow-integration`; this module provides the reqwest-backed sides
//! plus logging-only sinks for the channels (messaging, notifications)
//! that run outside this process.

use std::time::Duration;

use async_trait::async_trait;
use chatflow_ai::{
    CompletionBackend, CompletionError, CompletionRequest, CompletionResponse, TokenUsage,
};
use chatflow_integration::{
    HttpMethod, HttpRequestSpec, HttpResult, HttpSink, HttpSinkError, MessagingTransport,
    Notification, NotificationSink, NotifyError, Recipient, TransportError,
};
use serde_json::{Value as JsonValue, json};
use tracing::{info, warn};

use crate::config::CompletionConfig;

/// OpenAI-compatible chat-completions client.
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl HttpCompletionBackend {
    /// Builds the client, or fails if the TLS backend cannot initialize.
    pub fn new(config: CompletionConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if self.config.api_key.is_empty() {
            return Err(CompletionError::InvalidConfig {
                reason: "no api key configured".to_string(),
            });
        }

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user_message}));

        let mut body = json!({"model": model, "messages": messages});
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if request.output_schema.is_some() {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::ProviderUnavailable {
                        provider: self.config.base_url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(CompletionError::RateLimited {
                retry_after_secs: None,
            });
        }
        if !status.is_success() {
            return Err(CompletionError::RequestFailed {
                status: Some(status.as_u16()),
                reason: response.text().await.unwrap_or_default(),
            });
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| CompletionError::ResponseParseFailed {
                reason: e.to_string(),
            })?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CompletionError::ResponseParseFailed {
                reason: "missing choices[0].message.content".to_string(),
            })?
            .to_string();
        let structured_output = if request.output_schema.is_some() {
            serde_json::from_str(&content).ok()
        } else {
            None
        };
        let usage = TokenUsage {
            input_tokens: payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(CompletionResponse {
            content,
            structured_output,
            usage,
            model,
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Generic outbound HTTP sink over reqwest.
pub struct ReqwestHttpSink {
    client: reqwest::Client,
}

impl ReqwestHttpSink {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()?,
        })
    }
}

#[async_trait]
impl HttpSink for ReqwestHttpSink {
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResult, HttpSinkError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Patch => self.client.patch(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpSinkError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                HttpSinkError::SendFailed {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));
        Ok(HttpResult { status, body })
    }
}

/// Messaging transport that logs deliveries instead of sending them.
///
/// The real bridge runs as a separate process; this keeps run results
/// observable when the server runs standalone.
pub struct LoggingTransport;

#[async_trait]
impl MessagingTransport for LoggingTransport {
    async fn deliver(
        &self,
        recipient: &Recipient,
        effects: &[JsonValue],
    ) -> Result<Vec<bool>, TransportError> {
        for effect in effects {
            info!(recipient = %recipient.address, %effect, "would deliver effect");
        }
        Ok(vec![true; effects.len()])
    }
}

/// Notification sink that logs instead of delivering.
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSink for LoggingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        warn!(channel = %notification.channel_label(), "notification (logging sink)");
        Ok(())
    }
}
