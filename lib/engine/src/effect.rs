//! Outbound effects produced by a run.
//!
//! Effects are ordered side-effect descriptions; the engine never delivers
//! anything itself. Handlers append in execution order and the caller hands
//! the finished list to a messaging transport afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A quick-reply button attached to an interactive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub title: String,
}

impl Button {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// One outbound side effect, in the order it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundEffect {
    /// Plain text message to the contact.
    Text { text: String },
    /// Image by URL with an optional caption.
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Document attachment by URL.
    Document {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Audio clip by URL; `voice_note` renders as a recorded voice
    /// message on channels that distinguish the two.
    Audio {
        url: String,
        #[serde(default)]
        voice_note: bool,
    },
    /// Geographic location pin.
    Location {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        lat: f64,
        lon: f64,
    },
    /// Contact card.
    Contact {
        name: String,
        phone: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        organization: Option<String>,
    },
    /// Interactive message with quick-reply buttons.
    Buttons { text: String, buttons: Vec<Button> },
    /// Typed payload for channels the engine does not model directly
    /// (catalog renders, checkout links, booking confirmations).
    Payload { label: String, data: JsonValue },
}

impl OutboundEffect {
    /// Convenience constructor for the common text case.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_effect_wire_shape() {
        let wire = serde_json::to_value(OutboundEffect::text("Bonjour")).expect("serialize");
        assert_eq!(wire, json!({"kind": "text", "text": "Bonjour"}));
    }

    #[test]
    fn buttons_effect_roundtrip() {
        let effect = OutboundEffect::Buttons {
            text: "Choisissez".into(),
            buttons: vec![Button::new("b1", "Oui"), Button::new("b2", "Non")],
        };
        let wire = serde_json::to_value(&effect).expect("serialize");
        let back: OutboundEffect = serde_json::from_value(wire).expect("deserialize");
        assert_eq!(back, effect);
    }

    #[test]
    fn optional_fields_omitted() {
        let wire = serde_json::to_value(OutboundEffect::Image {
            url: "https://x/y.png".into(),
            caption: None,
        })
        .expect("serialize");
        assert!(wire.get("caption").is_none());

        let wire = serde_json::to_value(OutboundEffect::Location {
            name: None,
            address: None,
            lat: 5.36,
            lon: -4.0083,
        })
        .expect("serialize");
        assert!(wire.get("name").is_none());
        assert_eq!(wire["lat"], json!(5.36));
    }
}
