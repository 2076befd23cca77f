//! Notification sinks (email, chat channel, internal alert).
//!
//! Fire-and-forget from the engine's perspective: the engine records the
//! intent to notify and the outcome, never the sink's internal state.

use crate::error::NotifyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A notification to be delivered out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Email to a team address.
    Email {
        to: String,
        subject: String,
        body: String,
    },
    /// Message to a chat channel (e.g. a Slack channel name).
    Channel { channel: String, text: String },
    /// Internal dashboard alert.
    Internal { title: String, priority: String },
}

impl Notification {
    /// Returns the channel label used in logs.
    #[must_use]
    pub fn channel_label(&self) -> String {
        match self {
            Self::Email { to, .. } => format!("email:{to}"),
            Self::Channel { channel, .. } => format!("channel:{channel}"),
            Self::Internal { .. } => "internal".to_string(),
        }
    }
}

/// Trait for notification delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery failed; callers log and move on.
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}
