//! CRM-family handlers.
//!
//! Contact storage lives outside this process, so these handlers record
//! fire-and-forget intents: the contact profile and the `tags` / `notes`
//! variables are updated in-run, and the log entry is what the CRM sync
//! picks up afterwards.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

#[derive(Debug, Deserialize, Default)]
struct ContactFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn apply_contact_fields(fields: ContactFields, ctx: &mut ExecutionContext) -> Vec<&'static str> {
    let name = fields.name.map(|v| template::resolve(&v, ctx));
    let first_name = fields.first_name.map(|v| template::resolve(&v, ctx));
    let email = fields.email.map(|v| template::resolve(&v, ctx));

    let mut changed = Vec::new();
    if let Some(name) = name {
        ctx.contact.name = name;
        changed.push("name");
    }
    if let Some(first_name) = first_name {
        ctx.contact.first_name = first_name;
        changed.push("first_name");
    }
    if let Some(email) = email {
        ctx.contact.email = email;
        changed.push("email");
    }
    changed
}

/// Registers the contact with whatever profile fields are configured.
pub struct SaveContact;

#[async_trait]
impl NodeHandler for SaveContact {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let fields: ContactFields = serde_json::from_value(node.config_value()).unwrap_or_default();
        apply_contact_fields(fields, ctx);
        ctx.variables.set("contact_saved", json!(true));
        Ok(HandlerOutcome::success(format!(
            "Contact enregistré: {}",
            if ctx.contact.name.is_empty() {
                "profil anonyme"
            } else {
                &ctx.contact.name
            }
        )))
    }
}

/// Overwrites configured profile fields on the existing contact.
pub struct UpdateContact;

#[async_trait]
impl NodeHandler for UpdateContact {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let fields: ContactFields = serde_json::from_value(node.config_value()).unwrap_or_default();
        let changed = apply_contact_fields(fields, ctx);
        if changed.is_empty() {
            return Ok(HandlerOutcome::warning("Aucun champ à mettre à jour"));
        }
        Ok(HandlerOutcome::success(format!(
            "Contact mis à jour: {}",
            changed.join(", ")
        )))
    }
}

#[derive(Debug, Deserialize)]
struct TagConfig {
    tag: String,
}

fn current_tags(ctx: &ExecutionContext) -> Vec<String> {
    ctx.variables
        .get("tags")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Adds a tag to the contact (idempotent within the run).
pub struct AddTag;

#[async_trait]
impl NodeHandler for AddTag {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: TagConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("tag"))?;
        let tag = template::resolve(&config.tag, ctx);
        let mut tags = current_tags(ctx);
        if !tags.contains(&tag) {
            tags.push(tag.clone());
        }
        ctx.variables.set("tags", json!(tags));
        Ok(HandlerOutcome::success(format!("Tag ajouté: {tag}")))
    }
}

/// Removes a tag from the contact.
pub struct RemoveTag;

#[async_trait]
impl NodeHandler for RemoveTag {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: TagConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("tag"))?;
        let tag = template::resolve(&config.tag, ctx);
        let mut tags = current_tags(ctx);
        let before = tags.len();
        tags.retain(|t| t != &tag);
        let removed = tags.len() < before;
        ctx.variables.set("tags", json!(tags));
        if removed {
            Ok(HandlerOutcome::success(format!("Tag retiré: {tag}")))
        } else {
            Ok(HandlerOutcome::warning(format!("Tag absent: {tag}")))
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct AssignConfig {
    #[serde(default = "default_agent")]
    agent: String,
}

fn default_agent() -> String {
    "support".to_string()
}

/// Hands the conversation to a human agent (or team queue).
pub struct AssignAgent;

#[async_trait]
impl NodeHandler for AssignAgent {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: AssignConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        ctx.variables
            .set("assigned_agent", JsonValue::String(config.agent.clone()));
        Ok(HandlerOutcome::success(format!(
            "Conversation assignée à {}",
            config.agent
        )))
    }
}

#[derive(Debug, Deserialize)]
struct NoteConfig {
    text: String,
}

/// Appends a note to the contact's timeline.
pub struct AddNote;

#[async_trait]
impl NodeHandler for AddNote {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: NoteConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("text"))?;
        let note = template::resolve(&config.text, ctx);
        let mut notes: Vec<JsonValue> = ctx
            .variables
            .get("notes")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        notes.push(json!(note));
        ctx.variables.set("notes", JsonValue::Array(notes));
        Ok(HandlerOutcome::success("Note ajoutée"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogStatus;

    #[tokio::test]
    async fn add_tag_is_idempotent() {
        let node = Node::new(1, "add_tag", json!({"tag": "vip"}));
        let mut ctx = ExecutionContext::new("");
        AddTag.handle(&node, &mut ctx).await.unwrap();
        AddTag.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get("tags"), Some(&json!(["vip"])));
    }

    #[tokio::test]
    async fn remove_missing_tag_warns() {
        let node = Node::new(1, "remove_tag", json!({"tag": "vip"}));
        let mut ctx = ExecutionContext::new("");
        let outcome = RemoveTag.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
    }

    #[tokio::test]
    async fn update_contact_reports_changed_fields() {
        let node = Node::new(1, "update_contact", json!({"email": "new@example.ci"}));
        let mut ctx = ExecutionContext::new("");
        let outcome = UpdateContact.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.contact.email, "new@example.ci");
        assert!(outcome.message.contains("email"));
    }

    #[tokio::test]
    async fn notes_accumulate() {
        let mut ctx = ExecutionContext::new("je rappelle demain");
        let node = Node::new(1, "add_note", json!({"text": "Client dit: {{message}}"}));
        AddNote.handle(&node, &mut ctx).await.unwrap();
        assert_eq!(
            ctx.variables.get("notes"),
            Some(&json!(["Client dit: je rappelle demain"]))
        );
    }
}
