//! Workflow node model.
//!
//! Nodes arrive from the visual authoring canvas, so the shape is fixed by
//! that boundary: `{id, type, name, config, position: {x, y}, connectedTo?}`.
//! The `config` record is opaque here; each handler deserializes and
//! validates its own subset. The position exists only because the graph is
//! drawn, not declared: ascending `x` is the deterministic fallback order
//! when the author never wired an explicit link.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Identifier of a node, unique within one run.
///
/// Canvas-assigned plain integer, stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// An explicit successor link, as authored.
///
/// On the wire this is the `connectedTo` integer: `-1` is the terminate
/// sentinel (distinct from the field being absent), anything else is the
/// id of the next node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum NodeLink {
    /// Explicitly end the flow after this node.
    Terminate,
    /// Continue to the node with this id.
    Next(NodeId),
}

impl From<i64> for NodeLink {
    fn from(raw: i64) -> Self {
        if raw == -1 {
            Self::Terminate
        } else {
            Self::Next(NodeId(raw))
        }
    }
}

impl From<NodeLink> for i64 {
    fn from(link: NodeLink) -> Self {
        match link {
            NodeLink::Terminate => -1,
            NodeLink::Next(id) => id.0,
        }
    }
}

/// Canvas coordinates. Only `x` ever affects execution (fallback ordering).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// The node types eligible to start a run.
pub const TRIGGER_TYPES: &[&str] = &[
    "whatsapp_message",
    "telegram_message",
    "keyword",
    "new_contact",
    "webhook_trigger",
    "scheduled",
];

/// One vertex of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the run.
    pub id: NodeId,
    /// Tag selecting the handler (open-ended set).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display name; never affects execution.
    #[serde(default)]
    pub name: String,
    /// Opaque, type-specific configuration. Objects are the normal form;
    /// legacy authoring sometimes ships a JSON-encoded string or a bare
    /// text payload, both of which handlers tolerate.
    #[serde(default)]
    pub config: JsonValue,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Explicit successor, if the author wired one.
    #[serde(
        rename = "connectedTo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_to: Option<NodeLink>,
}

impl Node {
    /// Creates a node with the given id, type tag, and config.
    #[must_use]
    pub fn new(id: i64, node_type: impl Into<String>, config: JsonValue) -> Self {
        Self {
            id: NodeId(id),
            node_type: node_type.into(),
            name: String::new(),
            config,
            position: Position::default(),
            connected_to: None,
        }
    }

    /// Sets the canvas x position (builder form for tests and tooling).
    #[must_use]
    pub fn at_x(mut self, x: f64) -> Self {
        self.position.x = x;
        self
    }

    /// Sets the explicit successor link.
    #[must_use]
    pub fn linked_to(mut self, link: NodeLink) -> Self {
        self.connected_to = Some(link);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns true when this node belongs to the trigger family.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        TRIGGER_TYPES.contains(&self.node_type.as_str())
    }

    /// Returns the config normalized to a JSON object.
    ///
    /// Accepts the object form directly, parses the JSON-encoded string
    /// form, and treats everything else (including unparsable strings,
    /// which legacy authoring produced) as an empty object.
    #[must_use]
    pub fn config_value(&self) -> JsonValue {
        match &self.config {
            JsonValue::Object(_) => self.config.clone(),
            JsonValue::String(raw) => match serde_json::from_str::<JsonValue>(raw) {
                Ok(JsonValue::Object(map)) => JsonValue::Object(map),
                _ => JsonValue::Object(serde_json::Map::new()),
            },
            _ => JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Returns the config as a bare text payload, when it is one.
    ///
    /// Legacy `send_text`-style nodes store their message directly in
    /// `config` as a plain string.
    #[must_use]
    pub fn config_text(&self) -> Option<&str> {
        match &self.config {
            JsonValue::String(raw) if serde_json::from_str::<JsonValue>(raw).is_err() => Some(raw),
            _ => None,
        }
    }
}
