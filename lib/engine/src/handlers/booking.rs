//! Booking-family handlers.
//!
//! Scheduling truth lives outside the engine; these handlers drive the
//! conversation side of a booking (offer slots, confirm, cancel, remind)
//! and leave the reference in `booking_ref` for the rest of the flow.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::context::ExecutionContext;
use crate::effect::OutboundEffect;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

#[derive(Debug, Deserialize, Default)]
struct AvailabilityConfig {
    #[serde(default)]
    slots: Vec<String>,
}

/// Offers available appointment slots.
pub struct CheckAvailability;

#[async_trait]
impl NodeHandler for CheckAvailability {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AvailabilityConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        if config.slots.is_empty() {
            ctx.push_effect(OutboundEffect::text(
                "Aucun créneau disponible pour le moment. Nous revenons vers vous dès \
                 qu'une place se libère.",
            ));
            return Ok(HandlerOutcome::warning("Aucun créneau configuré"));
        }
        let mut lines = vec!["Créneaux disponibles :".to_string()];
        for (i, slot) in config.slots.iter().enumerate() {
            lines.push(format!("{}. {slot}", i + 1));
        }
        ctx.variables.set("available_slots", json!(config.slots));
        ctx.push_effect(OutboundEffect::text(lines.join("\n")));
        Ok(HandlerOutcome::success(format!(
            "{} créneaux proposés",
            config.slots.len()
        )))
    }
}

#[derive(Debug, Deserialize, Default)]
struct BookConfig {
    #[serde(default)]
    slot: Option<String>,
}

/// Confirms an appointment and records its reference.
pub struct BookAppointment;

#[async_trait]
impl NodeHandler for BookAppointment {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: BookConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let slot = config
            .slot
            .map(|s| template::resolve(&s, ctx))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ctx.message.clone());
        let reference = format!("RDV-{}", Utc::now().timestamp_millis());
        ctx.variables
            .set("booking_ref", JsonValue::String(reference.clone()));
        ctx.variables
            .set("booking_slot", JsonValue::String(slot.clone()));
        ctx.push_effect(OutboundEffect::text(format!(
            "Rendez-vous confirmé ({slot}). Référence: {reference}."
        )));
        Ok(HandlerOutcome::success(format!(
            "Rendez-vous {reference} confirmé"
        )))
    }
}

/// Cancels the appointment referenced in the run.
pub struct CancelAppointment;

#[async_trait]
impl NodeHandler for CancelAppointment {
    async fn handle(
        &self,
        _node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let Some(reference) = ctx.variables.get_text("booking_ref") else {
            ctx.push_effect(OutboundEffect::text(
                "Je ne trouve pas de rendez-vous à annuler. Pouvez-vous me donner votre \
                 référence ?",
            ));
            return Ok(HandlerOutcome::warning("Aucun rendez-vous référencé"));
        };
        ctx.variables.set("booking_ref", JsonValue::Null);
        ctx.push_effect(OutboundEffect::text(format!(
            "Votre rendez-vous {reference} est annulé."
        )));
        Ok(HandlerOutcome::success(format!(
            "Rendez-vous {reference} annulé"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct ReminderConfig {
    #[serde(default = "default_reminder")]
    text: String,
}

fn default_reminder() -> String {
    "Rappel: vous avez un rendez-vous prévu prochainement.".to_string()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            text: default_reminder(),
        }
    }
}

/// Sends an appointment reminder message.
pub struct SendReminder;

#[async_trait]
impl NodeHandler for SendReminder {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ReminderConfig =
            serde_json::from_value(node.config_value()).unwrap_or_default();
        let text = template::resolve(&config.text, ctx);
        ctx.push_effect(OutboundEffect::text(text));
        Ok(HandlerOutcome::success("Rappel envoyé"))
    }
}
