//! AI-family handlers backed by the completion boundary.
//!
//! Shared degradation policy: when the provider call fails, each handler
//! falls back to the local heuristics in `chatflow_ai::fallback` and the
//! run keeps going. A failing provider therefore changes reply quality,
//! never run shape — response-generating nodes emit exactly one reply
//! either way.

use std::sync::Arc;

use async_trait::async_trait;
use chatflow_ai::fallback::{
    canned_response, classify_intent, estimate_sentiment, truncate_summary,
};
use chatflow_ai::{CompletionBackend, CompletionRequest};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::effect::OutboundEffect;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};

const INTENT_TAXONOMY: &[&str] = &[
    "salutation",
    "question_prix",
    "demande_produit",
    "plainte",
    "remerciement",
    "confirmation",
    "annulation",
    "demande_aide",
    "autre",
];

/// Classifies the inbound message's intent into the `intent` variable.
pub struct IntentAnalyze {
    completion: Arc<dyn CompletionBackend>,
}

impl IntentAnalyze {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for IntentAnalyze {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(format!(
                "Classifie l'intention du message client dans exactement une de ces \
                 catégories: {}. Réponds uniquement par le nom de la catégorie.",
                INTENT_TAXONOMY.join(", ")
            ))
            .with_temperature(0.0)
            .with_max_tokens(10);

        let (intent, message) = match self.completion.complete(&request).await {
            Ok(response) => {
                let label = response.content.trim().to_lowercase();
                if INTENT_TAXONOMY.contains(&label.as_str()) {
                    (label.clone(), format!("Intention détectée: {label}"))
                } else {
                    // Off-taxonomy answer from the provider; reclassify locally.
                    let local = classify_intent(&ctx.message);
                    (local.to_string(), format!("Intention détectée: {local}"))
                }
            }
            Err(err) => {
                debug!(error = %err, "intent classification degraded to local lexicon");
                let local = classify_intent(&ctx.message);
                (
                    local.to_string(),
                    format!("Intention détectée (analyse locale): {local}"),
                )
            }
        };

        ctx.variables.set("intent", JsonValue::String(intent));
        Ok(HandlerOutcome::success(message))
    }
}

#[derive(Debug, Deserialize, Default)]
struct RespondConfig {
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    tone: Option<String>,
}

/// Generates one outbound reply to the inbound message.
pub struct Respond {
    completion: Arc<dyn CompletionBackend>,
}

impl Respond {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    fn system_prompt(config: &RespondConfig, ctx: &ExecutionContext) -> String {
        let mut prompt = config.system_prompt.clone().unwrap_or_else(|| {
            "Tu es un assistant client chaleureux et professionnel. Réponds en français, \
             de façon brève et utile."
                .to_string()
        });
        if let Some(tone) = &config.tone {
            prompt.push_str(&format!(" Ton attendu: {tone}."));
        }
        if let Some(intent) = ctx.variables.get_text("intent") {
            prompt.push_str(&format!(" Intention détectée du client: {intent}."));
        }
        if let Some(sentiment) = ctx.variables.get_text("sentiment") {
            prompt.push_str(&format!(" Sentiment du client: {sentiment}."));
        }
        prompt
    }
}

#[async_trait]
impl NodeHandler for Respond {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: RespondConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(Self::system_prompt(&config, ctx))
            .with_temperature(0.7)
            .with_max_tokens(300);

        match self.completion.complete(&request).await {
            Ok(response) => {
                ctx.push_effect(OutboundEffect::text(response.content));
                Ok(HandlerOutcome::success("Réponse générée"))
            }
            Err(err) => {
                debug!(error = %err, "response generation degraded to canned reply");
                let intent = ctx.variables.get_text("intent");
                ctx.push_effect(OutboundEffect::text(canned_response(intent.as_deref())));
                Ok(HandlerOutcome::warning("Réponse de secours utilisée"))
            }
        }
    }
}

/// Scores the inbound message's sentiment into context variables.
pub struct SentimentAnalyze {
    completion: Arc<dyn CompletionBackend>,
}

impl SentimentAnalyze {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    fn store(ctx: &mut ExecutionContext, label: &str, score: u8, emotion: &str) {
        ctx.variables.set("sentiment", JsonValue::String(label.to_string()));
        ctx.variables.set("sentiment_score", json!(score));
        ctx.variables.set("emotion", JsonValue::String(emotion.to_string()));
    }
}

#[async_trait]
impl NodeHandler for SentimentAnalyze {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let schema = json!({
            "type": "object",
            "properties": {
                "label": {"enum": ["positive", "neutral", "negative"]},
                "score": {"type": "integer", "minimum": 0, "maximum": 100},
                "emotion": {"type": "string"}
            },
            "required": ["label", "score"]
        });
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(
                "Évalue le sentiment de ce message client (0 = très négatif, 100 = très \
                 positif). Réponds en JSON.",
            )
            .with_output_schema(schema)
            .with_temperature(0.0);

        let parsed = match self.completion.complete(&request).await {
            Ok(response) => response
                .structured_output
                .or_else(|| serde_json::from_str(&response.content).ok()),
            Err(err) => {
                debug!(error = %err, "sentiment scoring degraded to local lexicon");
                None
            }
        };

        let message = match parsed {
            Some(output) => {
                let label = output["label"].as_str().unwrap_or("neutral").to_string();
                let score = output["score"].as_u64().unwrap_or(50).min(100) as u8;
                let emotion = output["emotion"].as_str().unwrap_or("neutre").to_string();
                Self::store(ctx, &label, score, &emotion);
                format!("Sentiment: {label} ({score}/100)")
            }
            None => {
                let estimate = estimate_sentiment(&ctx.message);
                Self::store(ctx, &estimate.label, estimate.score, &estimate.emotion);
                ctx.variables
                    .set("urgency", JsonValue::String(estimate.urgency.clone()));
                format!(
                    "Sentiment (analyse locale): {} ({}/100)",
                    estimate.label, estimate.score
                )
            }
        };
        Ok(HandlerOutcome::success(message))
    }
}

#[derive(Debug, Deserialize, Default)]
struct AgentConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
}

/// Persona-driven reply: a configured agent identity answers the message.
pub struct Agent {
    completion: Arc<dyn CompletionBackend>,
}

impl Agent {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for Agent {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AgentConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let name = config.name.unwrap_or_else(|| "Assistant".to_string());
        let role = config
            .role
            .unwrap_or_else(|| "conseiller clientèle".to_string());
        let mut prompt = format!(
            "Tu es {name}, {role}. Tu réponds en français, avec précision et empathie."
        );
        if let Some(instructions) = &config.instructions {
            prompt.push_str(&format!(" Instructions: {instructions}"));
        }

        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(prompt)
            .with_temperature(0.7)
            .with_max_tokens(400);

        match self.completion.complete(&request).await {
            Ok(response) => {
                ctx.push_effect(OutboundEffect::text(response.content));
                Ok(HandlerOutcome::success(format!("Agent {name} a répondu")))
            }
            Err(err) => {
                debug!(error = %err, "agent reply degraded to canned response");
                let intent = ctx.variables.get_text("intent");
                ctx.push_effect(OutboundEffect::text(canned_response(intent.as_deref())));
                Ok(HandlerOutcome::warning(format!(
                    "Agent {name} indisponible, réponse de secours utilisée"
                )))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslateConfig {
    #[serde(default = "default_language")]
    target_language: String,
}

fn default_language() -> String {
    "français".to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_language: default_language(),
        }
    }
}

/// Silently rewrites the trigger message into the target language.
///
/// No outbound effect: downstream AI and condition nodes see the rewritten
/// text. The original is preserved in `original_message`.
pub struct Translate {
    completion: Arc<dyn CompletionBackend>,
}

impl Translate {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for Translate {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: TranslateConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(format!(
                "Traduis ce message en {}. Réponds uniquement par la traduction.",
                config.target_language
            ))
            .with_temperature(0.0);

        match self.completion.complete(&request).await {
            Ok(response) => {
                ctx.variables
                    .set("original_message", JsonValue::String(ctx.message.clone()));
                ctx.variables.set(
                    "translated_message",
                    JsonValue::String(response.content.clone()),
                );
                ctx.message = response.content;
                Ok(HandlerOutcome::success(format!(
                    "Message traduit en {}",
                    config.target_language
                )))
            }
            Err(err) => {
                debug!(error = %err, "translation unavailable, keeping original message");
                Ok(HandlerOutcome::warning("Traduction indisponible, message original conservé"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummarizeConfig {
    #[serde(default = "default_summary_chars")]
    max_length: usize,
    #[serde(default)]
    send_to_chat: bool,
}

fn default_summary_chars() -> usize {
    100
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            max_length: default_summary_chars(),
            send_to_chat: false,
        }
    }
}

/// Summarizes the inbound message into the `summary` variable.
pub struct Summarize {
    completion: Arc<dyn CompletionBackend>,
}

impl Summarize {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for Summarize {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: SummarizeConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(format!(
                "Résume ce message client en {} caractères maximum.",
                config.max_length
            ))
            .with_temperature(0.3);

        let (summary, message) = match self.completion.complete(&request).await {
            Ok(response) => (response.content, "Résumé généré".to_string()),
            Err(err) => {
                debug!(error = %err, "summary degraded to truncation");
                (
                    truncate_summary(&ctx.message, config.max_length),
                    "Résumé local (troncature)".to_string(),
                )
            }
        };

        ctx.variables
            .set("summary", JsonValue::String(summary.clone()));
        if config.send_to_chat {
            ctx.push_effect(OutboundEffect::text(format!("Résumé: {summary}")));
        }
        Ok(HandlerOutcome::success(message))
    }
}

const MODERATION_BLOCK_THRESHOLD: f64 = 0.8;

/// Flags abusive content; blocks the conversation at high scores.
pub struct Moderation {
    completion: Arc<dyn CompletionBackend>,
}

impl Moderation {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for Moderation {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let schema = json!({
            "type": "object",
            "properties": {
                "flagged": {"type": "boolean"},
                "score": {"type": "number", "minimum": 0.0, "maximum": 1.0}
            },
            "required": ["flagged", "score"]
        });
        let request = CompletionRequest::new(ctx.message.clone())
            .with_system_prompt(
                "Évalue si ce message contient du contenu abusif, haineux ou frauduleux. \
                 Réponds en JSON avec flagged et score.",
            )
            .with_output_schema(schema)
            .with_temperature(0.0);

        let (flagged, score) = match self.completion.complete(&request).await {
            Ok(response) => {
                let output = response
                    .structured_output
                    .or_else(|| serde_json::from_str(&response.content).ok())
                    .unwrap_or(JsonValue::Null);
                (
                    output["flagged"].as_bool().unwrap_or(false),
                    output["score"].as_f64().unwrap_or(0.0),
                )
            }
            Err(err) => {
                // Unreachable moderation never blocks a legitimate message.
                debug!(error = %err, "moderation unavailable, passing message through");
                (false, 0.0)
            }
        };

        ctx.variables.set("moderation_flagged", json!(flagged));
        ctx.variables.set("moderation_score", json!(score));

        if flagged && score >= MODERATION_BLOCK_THRESHOLD {
            ctx.push_effect(OutboundEffect::text(
                "Votre message ne respecte pas nos conditions d'utilisation. \
                 Cette conversation est suspendue.",
            ));
            return Ok(HandlerOutcome::warning(format!(
                "Contenu bloqué (score {score:.2})"
            ))
            .halting());
        }
        Ok(HandlerOutcome::success(if flagged {
            format!("Contenu signalé (score {score:.2})")
        } else {
            "Contenu conforme".to_string()
        }))
    }
}

#[derive(Debug, Deserialize)]
struct TranscribeConfig {
    #[serde(default = "default_transcribe_endpoint")]
    endpoint: String,
}

fn default_transcribe_endpoint() -> String {
    "https://bridge.internal/transcribe".to_string()
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcribe_endpoint(),
        }
    }
}

/// Transcribes the inbound voice note and rewrites the trigger message.
///
/// Goes through the HTTP boundary rather than the completion one: the
/// bridge exposes transcription as a plain endpoint.
pub struct Transcribe {
    http: Arc<dyn chatflow_integration::HttpSink>,
}

impl Transcribe {
    #[must_use]
    pub fn new(http: Arc<dyn chatflow_integration::HttpSink>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeHandler for Transcribe {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let Some(media_url) = ctx.media_url.clone() else {
            return Ok(HandlerOutcome::warning("Aucun média à transcrire"));
        };
        let config: TranscribeConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();

        let request = chatflow_integration::HttpRequestSpec::post(
            config.endpoint,
            json!({"mediaUrl": media_url}),
        );
        match self.http.execute(request).await {
            Ok(result) if result.is_success() => {
                match result.body["text"].as_str() {
                    Some(text) if !text.is_empty() => {
                        ctx.variables
                            .set("transcription", JsonValue::String(text.to_string()));
                        ctx.message = text.to_string();
                        Ok(HandlerOutcome::success("Message vocal transcrit"))
                    }
                    _ => Ok(HandlerOutcome::warning("Transcription vide")),
                }
            }
            Ok(result) => Ok(HandlerOutcome::warning(format!(
                "Transcription refusée (HTTP {})",
                result.status
            ))),
            Err(err) => {
                debug!(error = %err, "transcription endpoint unreachable");
                Ok(HandlerOutcome::warning("Service de transcription indisponible"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogStatus;
    use crate::registry::ControlSignal;
    use crate::testing::{FakeCompletion, FakeHttpSink};
    use chatflow_ai::CompletionResponse;

    fn scripted(content: &str) -> Arc<FakeCompletion> {
        Arc::new(FakeCompletion::scripted(vec![CompletionResponse::text(
            content, "fake",
        )]))
    }

    #[tokio::test]
    async fn intent_stored_from_provider() {
        let node = Node::new(1, "gpt_analyze", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("combien ça coûte ?");
        let handler = IntentAnalyze::new(scripted("question_prix"));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(ctx.variables.get_text("intent").as_deref(), Some("question_prix"));
    }

    #[tokio::test]
    async fn intent_degrades_to_local_lexicon() {
        let node = Node::new(1, "gpt_analyze", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("quel est le prix ?");
        let handler = IntentAnalyze::new(Arc::new(FakeCompletion::failing()));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(ctx.variables.get_text("intent").as_deref(), Some("question_prix"));
    }

    #[tokio::test]
    async fn respond_failure_emits_exactly_one_fallback_reply() {
        let node = Node::new(1, "gpt_respond", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("bonjour");
        ctx.variables
            .set("intent", JsonValue::String("salutation".into()));
        let handler = Respond::new(Arc::new(FakeCompletion::failing()));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert_eq!(ctx.effects.len(), 1);
        match &ctx.effects[0] {
            OutboundEffect::Text { text } => assert!(text.contains("Bonjour")),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[tokio::test]
    async fn sentiment_falls_back_to_lexicon_scoring() {
        let node = Node::new(1, "sentiment", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("merci c'est parfait, excellent");
        let handler = SentimentAnalyze::new(Arc::new(FakeCompletion::failing()));
        handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get_text("sentiment").as_deref(), Some("positive"));
        assert!(ctx.variables.get("sentiment_score").is_some());
    }

    #[tokio::test]
    async fn translate_rewrites_message_and_keeps_original() {
        let node = Node::new(1, "ai_translate", serde_json::json!({"target_language": "anglais"}));
        let mut ctx = ExecutionContext::new("bonjour");
        let handler = Translate::new(scripted("hello"));
        handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.message, "hello");
        assert_eq!(ctx.variables.get_text("original_message").as_deref(), Some("bonjour"));
        assert!(ctx.effects.is_empty());
    }

    #[tokio::test]
    async fn translate_failure_keeps_message_untouched() {
        let node = Node::new(1, "ai_translate", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("bonjour");
        let handler = Translate::new(Arc::new(FakeCompletion::failing()));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        assert_eq!(ctx.message, "bonjour");
    }

    #[tokio::test]
    async fn moderation_blocks_at_high_score() {
        let node = Node::new(1, "ai_moderation", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("contenu abusif");
        let response = CompletionResponse {
            content: String::new(),
            structured_output: Some(serde_json::json!({"flagged": true, "score": 0.95})),
            usage: Default::default(),
            model: "fake".into(),
        };
        let handler = Moderation::new(Arc::new(FakeCompletion::scripted(vec![response])));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.signal, ControlSignal::Halt);
        assert_eq!(ctx.effects.len(), 1);
        assert_eq!(ctx.variables.get("moderation_flagged"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn transcribe_without_media_warns() {
        let node = Node::new(1, "ai_transcribe", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("");
        let handler = Transcribe::new(Arc::new(FakeHttpSink::responding(200, json!({}))));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
    }

    #[tokio::test]
    async fn transcribe_rewrites_message() {
        let node = Node::new(1, "ai_transcribe", serde_json::json!({}));
        let mut ctx = ExecutionContext::new("");
        ctx.media_url = Some("https://cdn/audio.ogg".into());
        let handler = Transcribe::new(Arc::new(FakeHttpSink::responding(
            200,
            json!({"text": "je veux commander"}),
        )));
        let outcome = handler.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(ctx.message, "je veux commander");
    }
}
