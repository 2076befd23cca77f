//! Trigger-family handlers.
//!
//! Triggers start a run but execute like any other node: the coordinator
//! has already decided to run the flow, so a channel trigger is mostly a
//! log marker. The keyword trigger is the exception — it gates the rest of
//! the flow on the inbound message.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};

/// Channel trigger: records the entry point and sets the channel variable.
pub struct MessageTrigger {
    channel: &'static str,
}

impl MessageTrigger {
    #[must_use]
    pub fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NodeHandler for MessageTrigger {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        ctx.variables.set("channel", JsonValue::String(self.channel.to_string()));
        Ok(HandlerOutcome::success(format!(
            "Déclencheur {} activé",
            self.channel
        )))
    }
}

#[derive(Debug, Deserialize, Default)]
struct KeywordConfig {
    #[serde(default)]
    keywords: JsonValue,
}

/// Keyword gate: halts the flow when no configured keyword matches.
pub struct KeywordTrigger;

impl KeywordTrigger {
    /// Accepts keywords as an array of strings or as one comma- or
    /// newline-delimited string (both authoring formats exist).
    fn keywords(config: &KeywordConfig) -> Vec<String> {
        match &config.keywords {
            JsonValue::Array(items) => items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            JsonValue::String(raw) => raw
                .split([',', '\n'])
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl NodeHandler for KeywordTrigger {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: KeywordConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let keywords = Self::keywords(&config);
        if keywords.is_empty() {
            return Ok(HandlerOutcome::warning("Aucun mot-clé configuré").halting());
        }

        let message = ctx.message.to_lowercase();
        match keywords.iter().find(|k| message.contains(k.as_str())) {
            Some(matched) => {
                ctx.variables
                    .set("matched_keyword", JsonValue::String(matched.clone()));
                Ok(HandlerOutcome::success(format!("Mot-clé détecté: {matched}")))
            }
            None => Ok(HandlerOutcome::warning("Aucun mot-clé correspondant").halting()),
        }
    }
}
