//! Built-in node handlers, one module per block family.
//!
//! Every handler is registered from the table in [`builtin`]; the traversal
//! layer never knows which family a tag belongs to. Handlers that leave the
//! process take their boundary as an `Arc` at construction; everything else
//! is a stateless unit struct.

pub mod ai;
pub mod booking;
pub mod commerce;
pub mod crm;
pub mod data;
pub mod integrations;
pub mod logic;
pub mod messaging;
pub mod safety;
pub mod triggers;

use std::sync::Arc;

use crate::registry::{Boundaries, NodeHandler};

/// The full tag → handler table.
#[must_use]
pub fn builtin(boundaries: &Boundaries) -> Vec<(&'static str, Arc<dyn NodeHandler>)> {
    let completion = &boundaries.completion;
    let http = &boundaries.http;
    let notifier = &boundaries.notifier;

    vec![
        // Triggers
        ("whatsapp_message", Arc::new(triggers::MessageTrigger::new("WhatsApp")) as _),
        ("telegram_message", Arc::new(triggers::MessageTrigger::new("Telegram")) as _),
        ("new_contact", Arc::new(triggers::MessageTrigger::new("nouveau contact")) as _),
        ("webhook_trigger", Arc::new(triggers::MessageTrigger::new("webhook")) as _),
        ("scheduled", Arc::new(triggers::MessageTrigger::new("planification")) as _),
        ("keyword", Arc::new(triggers::KeywordTrigger) as _),
        // AI
        ("gpt_analyze", Arc::new(ai::IntentAnalyze::new(completion.clone())) as _),
        ("gpt_respond", Arc::new(ai::Respond::new(completion.clone())) as _),
        ("sentiment", Arc::new(ai::SentimentAnalyze::new(completion.clone())) as _),
        ("ai_agent", Arc::new(ai::Agent::new(completion.clone())) as _),
        ("ai_translate", Arc::new(ai::Translate::new(completion.clone())) as _),
        ("ai_summarize", Arc::new(ai::Summarize::new(completion.clone())) as _),
        ("ai_moderation", Arc::new(ai::Moderation::new(completion.clone())) as _),
        ("ai_transcribe", Arc::new(ai::Transcribe::new(http.clone())) as _),
        // Messaging
        ("send_text", Arc::new(messaging::SendText) as _),
        ("send_image", Arc::new(messaging::SendImage) as _),
        ("send_document", Arc::new(messaging::SendDocument) as _),
        ("send_location", Arc::new(messaging::SendLocation) as _),
        ("send_contact", Arc::new(messaging::SendContact) as _),
        ("send_audio", Arc::new(messaging::SendAudio) as _),
        ("send_buttons", Arc::new(messaging::SendButtons) as _),
        // Logic
        ("condition", Arc::new(logic::Condition) as _),
        ("set_variable", Arc::new(logic::SetVariable) as _),
        ("random_choice", Arc::new(logic::RandomChoice) as _),
        ("loop", Arc::new(logic::LoopMarker) as _),
        ("delay", Arc::new(logic::Delay) as _),
        ("anti_ban", Arc::new(logic::AntiBan) as _),
        ("end_flow", Arc::new(logic::EndFlow) as _),
        // Integrations
        ("http_request", Arc::new(integrations::HttpRequest::new(http.clone())) as _),
        ("notify_webhook", Arc::new(integrations::NotifyWebhook::new(http.clone())) as _),
        ("notify_slack", Arc::new(integrations::NotifyChannel::new(notifier.clone())) as _),
        ("notify_email", Arc::new(integrations::NotifyEmail::new(notifier.clone())) as _),
        ("notify_internal", Arc::new(integrations::NotifyInternal::new(notifier.clone())) as _),
        ("google_sheets", Arc::new(integrations::GoogleSheets::new(http.clone())) as _),
        ("database_query", Arc::new(integrations::DatabaseQuery::new(http.clone())) as _),
        // CRM
        ("save_contact", Arc::new(crm::SaveContact) as _),
        ("add_tag", Arc::new(crm::AddTag) as _),
        ("remove_tag", Arc::new(crm::RemoveTag) as _),
        ("update_contact", Arc::new(crm::UpdateContact) as _),
        ("assign_agent", Arc::new(crm::AssignAgent) as _),
        ("add_note", Arc::new(crm::AddNote) as _),
        // Commerce
        ("show_catalog", Arc::new(commerce::ShowCatalog) as _),
        ("add_to_cart", Arc::new(commerce::AddToCart) as _),
        ("show_cart", Arc::new(commerce::ShowCart) as _),
        ("checkout", Arc::new(commerce::Checkout) as _),
        ("apply_promo", Arc::new(commerce::ApplyPromo) as _),
        ("order_status", Arc::new(commerce::OrderStatus) as _),
        // Booking
        ("check_availability", Arc::new(booking::CheckAvailability) as _),
        ("book_appointment", Arc::new(booking::BookAppointment) as _),
        ("cancel_appointment", Arc::new(booking::CancelAppointment) as _),
        ("send_reminder", Arc::new(booking::SendReminder) as _),
        // Safety
        ("block_spam", Arc::new(safety::BlockSpam) as _),
        ("verify_human", Arc::new(safety::VerifyHuman) as _),
        ("rate_limit", Arc::new(safety::RateLimit) as _),
        // Data gathering
        ("web_email_extract", Arc::new(data::WebEmailExtract::new(http.clone())) as _),
    ]
}
