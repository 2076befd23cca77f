//! Per-node execution log.
//!
//! Every node the walker touches gets exactly one entry, including nodes
//! that errored, were gated out, or were never reached at all (those are
//! recorded as skipped in a final pass). Serialized field names match the
//! dashboard's camelCase contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeId};

/// Outcome class of one node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
    Warning,
    Skipped,
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// One row of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub node_id: NodeId,
    pub node_type: String,
    pub node_name: String,
    pub status: LogStatus,
    /// Human-readable outcome detail.
    pub message: String,
    /// Wall time spent executing the handler, in milliseconds.
    pub duration_ms: u64,
    /// Pause the caller should apply before delivering subsequent
    /// effects; only delay-family nodes set this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Builds an entry for `node` with the given outcome.
    #[must_use]
    pub fn for_node(node: &Node, status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            node_id: node.id,
            node_type: node.node_type.clone(),
            node_name: node.name.clone(),
            status,
            message: message.into(),
            duration_ms: 0,
            wait_ms: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_wait(mut self, wait_ms: u64) -> Self {
        self.wait_ms = Some(wait_ms);
        self
    }
}
