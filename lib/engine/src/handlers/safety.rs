//! Safety-family handlers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::context::ExecutionContext;
use crate::effect::{Button, OutboundEffect};
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};

const DEFAULT_SPAM_KEYWORDS: &[&str] = &[
    "viagra",
    "casino",
    "crypto gratuit",
    "gagner de l'argent facilement",
    "cliquez ici",
];

#[derive(Debug, Deserialize, Default)]
struct SpamConfig {
    #[serde(default)]
    keywords: Vec<String>,
}

/// Drops the conversation when the message matches a spam lexicon.
pub struct BlockSpam;

#[async_trait]
impl NodeHandler for BlockSpam {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: SpamConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let keywords: Vec<String> = if config.keywords.is_empty() {
            DEFAULT_SPAM_KEYWORDS.iter().map(|s| (*s).to_string()).collect()
        } else {
            config.keywords
        };
        let message = ctx.message.to_lowercase();
        if let Some(matched) = keywords.iter().find(|k| message.contains(&k.to_lowercase())) {
            ctx.should_continue = false;
            ctx.variables.set("spam_detected", json!(true));
            return Ok(HandlerOutcome::warning(format!(
                "Message bloqué (spam: {matched})"
            ))
            .halting());
        }
        Ok(HandlerOutcome::success("Aucun spam détecté"))
    }
}

#[derive(Debug, Deserialize)]
struct VerifyConfig {
    #[serde(default = "default_challenge")]
    question: String,
}

fn default_challenge() -> String {
    "Pour continuer, confirmez que vous êtes bien humain :".to_string()
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            question: default_challenge(),
        }
    }
}

/// Sends a humanity-check challenge before continuing the flow.
pub struct VerifyHuman;

#[async_trait]
impl NodeHandler for VerifyHuman {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: VerifyConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        ctx.push_effect(OutboundEffect::Buttons {
            text: config.question,
            buttons: vec![Button::new("human_yes", "Je suis humain")],
        });
        ctx.variables.set("verification_pending", json!(true));
        Ok(HandlerOutcome::success("Vérification humaine demandée"))
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitConfig {
    #[serde(default = "default_rate_limit")]
    max_per_hour: u32,
}

fn default_rate_limit() -> u32 {
    30
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_hour: default_rate_limit(),
        }
    }
}

/// Records the authored rate limit for the messaging bridge to enforce.
///
/// The engine is stateless across runs, so the count itself is kept by
/// the bridge; this node only surfaces the configured cap.
pub struct RateLimit;

#[async_trait]
impl NodeHandler for RateLimit {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: RateLimitConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        ctx.variables.set("rate_limit", json!(config.max_per_hour));
        Ok(HandlerOutcome::success(format!(
            "Limite configurée: {} messages/heure",
            config.max_per_hour
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogStatus;
    use crate::registry::ControlSignal;

    #[tokio::test]
    async fn spam_match_halts_with_flag() {
        let node = Node::new(1, "block_spam", json!({}));
        let mut ctx = ExecutionContext::new("CLIQUEZ ICI pour gagner un iPhone");
        let outcome = BlockSpam.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert_eq!(outcome.signal, ControlSignal::Halt);
        assert!(!ctx.should_continue);
    }

    #[tokio::test]
    async fn clean_message_passes() {
        let node = Node::new(1, "block_spam", json!({}));
        let mut ctx = ExecutionContext::new("bonjour, je cherche un produit");
        let outcome = BlockSpam.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert!(ctx.should_continue);
    }

    #[tokio::test]
    async fn custom_spam_keywords_override_defaults() {
        let node = Node::new(1, "block_spam", json!({"keywords": ["concours"]}));
        let mut ctx = ExecutionContext::new("participez au grand CONCOURS");
        let outcome = BlockSpam.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.signal, ControlSignal::Halt);
    }

    #[tokio::test]
    async fn verify_human_emits_challenge() {
        let node = Node::new(1, "verify_human", json!({}));
        let mut ctx = ExecutionContext::new("");
        VerifyHuman.handle(&node, &mut ctx).await.unwrap();
        assert!(matches!(&ctx.effects[0], OutboundEffect::Buttons { .. }));
        assert_eq!(ctx.variables.get("verification_pending"), Some(&json!(true)));
    }
}
