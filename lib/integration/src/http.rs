//! Generic HTTP/webhook sink.
//!
//! Consumed by the engine's `http_request`, `notify_webhook`, and data
//! gathering handlers. The response status and body are opaque to the
//! engine beyond success/failure classification.

use crate::error::HttpSinkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// HTTP methods the sink accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// A fully described outbound HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequestSpec {
    /// The request method.
    pub method: HttpMethod,
    /// The target URL.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Optional JSON body.
    pub body: Option<JsonValue>,
}

impl HttpRequestSpec {
    /// Creates a GET request for the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: HashMap::new(),
            body: Some(body),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// The outcome of an HTTP call, as far as the engine cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResult {
    /// HTTP status code.
    pub status: u16,
    /// Response body parsed as JSON when possible, raw text otherwise.
    pub body: JsonValue,
}

impl HttpResult {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the generic HTTP boundary.
#[async_trait]
pub trait HttpSink: Send + Sync {
    /// Executes the request and returns the classified result.
    ///
    /// # Errors
    ///
    /// Returns an error when the request could not be completed at the
    /// transport level; non-2xx responses are an `Ok` result with the
    /// status preserved.
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResult, HttpSinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_builder() {
        let spec = HttpRequestSpec::get("https://api.example.com/ping")
            .with_header("authorization", "Bearer token");
        assert_eq!(spec.method, HttpMethod::Get);
        assert!(spec.body.is_none());
        assert_eq!(
            spec.headers.get("authorization"),
            Some(&"Bearer token".to_string())
        );
    }

    #[test]
    fn method_serde_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Post).expect("serialize");
        assert_eq!(json, "\"POST\"");
        let parsed: HttpMethod = serde_json::from_str("\"DELETE\"").expect("deserialize");
        assert_eq!(parsed, HttpMethod::Delete);
    }

    #[test]
    fn result_success_classification() {
        let ok = HttpResult {
            status: 204,
            body: JsonValue::Null,
        };
        let not_found = HttpResult {
            status: 404,
            body: JsonValue::Null,
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }
}
