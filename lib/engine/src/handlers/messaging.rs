//! Messaging-family handlers.
//!
//! Each one resolves `{{path}}` placeholders in its config and appends one
//! effect to the outbound buffer. Nothing is delivered here; the transport
//! honors buffer order (and any recorded waits) after the run.

use async_trait::async_trait;
use serde::Deserialize;

use crate::context::ExecutionContext;
use crate::effect::{Button, OutboundEffect};
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

#[derive(Debug, Deserialize, Default)]
struct TextConfig {
    #[serde(default)]
    text: Option<String>,
    // Older flows store the body under `message`.
    #[serde(default)]
    message: Option<String>,
}

/// Sends a plain text message.
pub struct SendText;

#[async_trait]
impl NodeHandler for SendText {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let text = if let Some(bare) = node.config_text() {
            bare.to_string()
        } else {
            let config: TextConfig = serde_json::from_value(node.config_value())
                .map_err(|e| HandlerError::invalid_config(e.to_string()))?;
            config
                .text
                .or(config.message)
                .ok_or(HandlerError::missing_field("text"))?
        };
        let resolved = template::resolve(&text, ctx);
        ctx.push_effect(OutboundEffect::text(resolved));
        Ok(HandlerOutcome::success("Message envoyé"))
    }
}

#[derive(Debug, Deserialize)]
struct ImageConfig {
    url: String,
    #[serde(default)]
    caption: Option<String>,
}

/// Sends an image by URL.
pub struct SendImage;

#[async_trait]
impl NodeHandler for SendImage {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ImageConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;
        let caption = config.caption.map(|c| template::resolve(&c, ctx));
        ctx.push_effect(OutboundEffect::Image {
            url: template::resolve(&config.url, ctx),
            caption,
        });
        Ok(HandlerOutcome::success("Image envoyée"))
    }
}

#[derive(Debug, Deserialize)]
struct DocumentConfig {
    url: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    caption: Option<String>,
}

/// Sends a document attachment.
pub struct SendDocument;

#[async_trait]
impl NodeHandler for SendDocument {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: DocumentConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;
        ctx.push_effect(OutboundEffect::Document {
            url: template::resolve(&config.url, ctx),
            filename: config.filename,
            caption: config.caption.map(|c| template::resolve(&c, ctx)),
        });
        Ok(HandlerOutcome::success("Document envoyé"))
    }
}

#[derive(Debug, Deserialize)]
struct LocationConfig {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// Sends a location pin.
pub struct SendLocation;

#[async_trait]
impl NodeHandler for SendLocation {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: LocationConfig = serde_json::from_value(node.config_value())
            .map_err(|e| HandlerError::invalid_config(e.to_string()))?;
        ctx.push_effect(OutboundEffect::Location {
            name: config.name,
            address: config.address,
            lat: config.latitude,
            lon: config.longitude,
        });
        Ok(HandlerOutcome::success("Position envoyée"))
    }
}

#[derive(Debug, Deserialize)]
struct ContactConfig {
    name: String,
    phone: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    organization: Option<String>,
}

/// Sends a contact card.
pub struct SendContact;

#[async_trait]
impl NodeHandler for SendContact {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ContactConfig = serde_json::from_value(node.config_value())
            .map_err(|e| HandlerError::invalid_config(e.to_string()))?;
        ctx.push_effect(OutboundEffect::Contact {
            name: config.name,
            phone: config.phone,
            email: config.email,
            organization: config.organization,
        });
        Ok(HandlerOutcome::success("Fiche contact envoyée"))
    }
}

#[derive(Debug, Deserialize)]
struct AudioConfig {
    url: String,
    #[serde(default)]
    voice_note: bool,
}

/// Sends an audio clip or voice note.
pub struct SendAudio;

#[async_trait]
impl NodeHandler for SendAudio {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AudioConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;
        ctx.push_effect(OutboundEffect::Audio {
            url: template::resolve(&config.url, ctx),
            voice_note: config.voice_note,
        });
        Ok(HandlerOutcome::success("Audio envoyé"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ButtonSpec {
    // `["Oui", "Non"]` shorthand; ids are derived from position.
    Label(String),
    Full { id: String, title: String },
}

#[derive(Debug, Deserialize)]
struct ButtonsConfig {
    text: String,
    buttons: Vec<ButtonSpec>,
}

/// Sends an interactive message with quick-reply buttons.
pub struct SendButtons;

#[async_trait]
impl NodeHandler for SendButtons {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ButtonsConfig = serde_json::from_value(node.config_value())
            .map_err(|e| HandlerError::invalid_config(e.to_string()))?;
        if config.buttons.is_empty() {
            return Err(HandlerError::missing_field("buttons"));
        }
        let buttons: Vec<Button> = config
            .buttons
            .into_iter()
            .enumerate()
            .map(|(i, spec)| match spec {
                ButtonSpec::Label(title) => Button::new(format!("btn_{i}"), title),
                ButtonSpec::Full { id, title } => Button::new(id, title),
            })
            .collect();
        let count = buttons.len();
        ctx.push_effect(OutboundEffect::Buttons {
            text: template::resolve(&config.text, ctx),
            buttons,
        });
        Ok(HandlerOutcome::success(format!(
            "Message interactif envoyé ({count} boutons)"
        )))
    }
}
