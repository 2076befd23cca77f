//! Handler trait, outcome type, and the tag → handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatflow_ai::CompletionBackend;
use chatflow_integration::{HttpSink, NotificationSink};

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::log::LogStatus;
use crate::node::Node;

/// What the walker should do after this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlSignal {
    #[default]
    Continue,
    /// Stop walking; remaining nodes are logged as skipped.
    Halt,
}

/// Result of one successfully executed handler.
///
/// `Err(HandlerError)` covers the failure side; an outcome is always a
/// node that ran to completion, even if the outcome class is a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub status: LogStatus,
    pub message: String,
    /// Pause the messaging bridge should apply, for delay-family nodes.
    pub wait_ms: Option<u64>,
    pub signal: ControlSignal,
}

impl HandlerOutcome {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Success,
            message: message.into(),
            wait_ms: None,
            signal: ControlSignal::Continue,
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Warning,
            message: message.into(),
            wait_ms: None,
            signal: ControlSignal::Continue,
        }
    }

    #[must_use]
    pub fn halting(mut self) -> Self {
        self.signal = ControlSignal::Halt;
        self
    }

    #[must_use]
    pub fn with_wait(mut self, wait_ms: u64) -> Self {
        self.wait_ms = Some(wait_ms);
        self
    }
}

/// One node-type implementation.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError>;
}

/// Outbound boundaries shared by every handler that leaves the process.
#[derive(Clone)]
pub struct Boundaries {
    pub completion: Arc<dyn CompletionBackend>,
    pub http: Arc<dyn HttpSink>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Tag → handler lookup, built once and shared across runs.
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    /// Empty registry; use [`HandlerRegistry::builtin`] for the full set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry populated with every built-in handler.
    #[must_use]
    pub fn builtin(boundaries: Boundaries) -> Self {
        let mut registry = Self::new();
        for (tag, handler) in crate::handlers::builtin(&boundaries) {
            registry.register(tag, handler);
        }
        registry
    }

    pub fn register(&mut self, tag: &'static str, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(tag, handler);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fake_boundaries;

    #[test]
    fn builtin_covers_every_tag() {
        let registry = HandlerRegistry::builtin(fake_boundaries());
        for tag in [
            "whatsapp_message",
            "keyword",
            "gpt_respond",
            "send_text",
            "condition",
            "set_variable",
            "http_request",
            "add_to_cart",
            "checkout",
            "book_appointment",
            "block_spam",
            "web_email_extract",
        ] {
            assert!(registry.get(tag).is_some(), "missing handler for {tag}");
        }
        assert!(registry.get("nonexistent_type").is_none());
    }

    #[test]
    fn outcome_builders() {
        let outcome = HandlerOutcome::warning("Mot-clé non détecté").halting();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert_eq!(outcome.signal, ControlSignal::Halt);

        let outcome = HandlerOutcome::success("Délai appliqué").with_wait(3000);
        assert_eq!(outcome.wait_ms, Some(3000));
    }
}
