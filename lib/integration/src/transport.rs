//! Messaging transport boundary.
//!
//! The bridge process that actually speaks WhatsApp/Telegram lives outside
//! this codebase. The engine produces an ordered list of effects; the
//! transport delivers them to a recipient and reports one boolean per send.
//! Effects cross this boundary as JSON so the transport crate stays
//! independent of the engine's effect enum.

use crate::error::TransportError;
use async_trait::async_trait;
use chatflow_core::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The addressee of an outbound delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Transport-level identifier (phone number, chat id).
    pub address: String,
    /// Optional session to thread the delivery into.
    pub session_id: Option<SessionId>,
}

impl Recipient {
    /// Creates a recipient with no session affinity.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            session_id: None,
        }
    }

    /// Attaches a session identifier.
    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Trait for ordered effect delivery.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Delivers the effects in order and returns one success flag per
    /// effect, in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport itself is unusable;
    /// individual send failures are reported through the boolean list.
    async fn deliver(
        &self,
        recipient: &Recipient,
        effects: &[JsonValue],
    ) -> Result<Vec<bool>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_builder() {
        let session = SessionId::new();
        let recipient = Recipient::new("+22501020304").with_session(session);
        assert_eq!(recipient.address, "+22501020304");
        assert_eq!(recipient.session_id, Some(session));
    }

    #[test]
    fn recipient_serde_roundtrip() {
        let recipient = Recipient::new("chat_42");
        let json = serde_json::to_string(&recipient).expect("serialize");
        let parsed: Recipient = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recipient, parsed);
    }
}
