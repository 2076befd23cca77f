//! Run coordinator.
//!
//! Owns the precondition checks around one traversal and shapes the
//! boundary-facing result. A run always "succeeds" in the transport sense
//! once it reaches the walker; authoring problems surface as warning or
//! error entries in the log, and a run that produced no outbound effect
//! carries a top-level warning so operators notice silent flows.

use chatflow_core::RunId;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::{ContactProfile, ExecutionContext, Product};
use crate::effect::OutboundEffect;
use crate::log::{LogEntry, LogStatus};
use crate::node::Node;
use crate::registry::{Boundaries, HandlerRegistry};
use crate::traversal::{find_start, positional_order, walk};

/// One inbound event plus the graph that should react to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// The inbound chat message text.
    pub message: String,
    /// The workflow graph, as authored.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Contact profile for placeholder substitution.
    #[serde(default)]
    pub contact: ContactProfile,
    /// Media attached to the inbound message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Product catalog for commerce handlers.
    #[serde(default)]
    pub products: Vec<Product>,
}

impl RunRequest {
    #[must_use]
    pub fn new(message: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            message: message.into(),
            nodes,
            contact: ContactProfile::default(),
            media_url: None,
            products: Vec::new(),
        }
    }
}

/// The result of one run: ordered effects plus the full execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub effects: Vec<OutboundEffect>,
    pub executed_nodes: Vec<LogEntry>,
    /// Set for no-op runs and runs that produced no outbound effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Drives runs against one shared handler registry.
pub struct FlowRunner {
    registry: HandlerRegistry,
}

impl FlowRunner {
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Runner with the full built-in handler set over `boundaries`.
    #[must_use]
    pub fn with_boundaries(boundaries: Boundaries) -> Self {
        Self::new(HandlerRegistry::builtin(boundaries))
    }

    /// Executes one run to completion. Never fails: every problem is
    /// reported inside the returned log.
    pub async fn run(&self, request: RunRequest) -> RunReport {
        let run_id = RunId::new();
        let RunRequest {
            message,
            nodes,
            contact,
            media_url,
            products,
        } = request;

        let mut ctx = ExecutionContext::new(message)
            .with_contact(contact)
            .with_catalog(products);
        ctx.media_url = media_url;

        if nodes.is_empty() {
            return RunReport {
                success: true,
                effects: Vec::new(),
                executed_nodes: Vec::new(),
                warning: Some("Aucun nœud dans le flux".to_string()),
            };
        }

        let order = positional_order(&nodes);
        let Some(start) = find_start(&nodes, &order) else {
            let executed_nodes = order
                .iter()
                .map(|&i| {
                    LogEntry::for_node(&nodes[i], LogStatus::Skipped, "Aucun déclencheur dans le flux")
                })
                .collect();
            return RunReport {
                success: true,
                effects: Vec::new(),
                executed_nodes,
                warning: Some("Aucun déclencheur trouvé".to_string()),
            };
        };

        walk(&nodes, start, &self.registry, &mut ctx).await;

        info!(
            run_id = %run_id,
            nodes = nodes.len(),
            effects = ctx.effects.len(),
            "workflow run completed"
        );

        let warning = if ctx.effects.is_empty() {
            Some("Exécution terminée sans effet sortant".to_string())
        } else {
            None
        };

        RunReport {
            success: true,
            effects: ctx.effects,
            executed_nodes: ctx.log,
            warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failing_boundaries, fake_boundaries};
    use serde_json::json;

    fn runner() -> FlowRunner {
        FlowRunner::with_boundaries(fake_boundaries())
    }

    #[tokio::test]
    async fn empty_graph_is_a_successful_no_op() {
        let report = runner().run(RunRequest::new("bonjour", vec![])).await;
        assert!(report.success);
        assert!(report.effects.is_empty());
        assert!(report.executed_nodes.is_empty());
        assert!(report.warning.is_some());
    }

    #[tokio::test]
    async fn graph_without_trigger_skips_everything() {
        let nodes = vec![
            Node::new(1, "send_text", json!({"text": "perdu"})).at_x(0.0),
            Node::new(2, "condition", json!({})).at_x(100.0),
        ];
        let report = runner().run(RunRequest::new("bonjour", nodes)).await;
        assert!(report.success);
        assert!(report.effects.is_empty());
        assert_eq!(report.executed_nodes.len(), 2);
        assert!(report
            .executed_nodes
            .iter()
            .all(|e| e.status == LogStatus::Skipped));
    }

    #[tokio::test]
    async fn report_wire_shape() {
        let nodes = vec![
            Node::new(1, "whatsapp_message", json!({})).at_x(0.0),
            Node::new(2, "send_text", json!({"text": "Bonjour !"})).at_x(100.0),
        ];
        let report = runner().run(RunRequest::new("salut", nodes)).await;
        let wire = serde_json::to_value(&report).expect("serialize");
        assert_eq!(wire["success"], json!(true));
        assert_eq!(wire["effects"][0]["kind"], json!("text"));
        assert_eq!(wire["executedNodes"][0]["nodeId"], json!(1));
        assert!(wire.get("warning").is_none());
    }

    #[tokio::test]
    async fn failing_boundaries_degrade_without_changing_run_shape() {
        let nodes = vec![
            Node::new(1, "whatsapp_message", json!({})).at_x(0.0),
            Node::new(2, "gpt_respond", json!({})).at_x(100.0),
        ];
        let runner = FlowRunner::with_boundaries(failing_boundaries());
        let report = runner.run(RunRequest::new("bonjour", nodes)).await;
        assert!(report.success);
        // The fallback reply is still exactly one outbound effect.
        assert_eq!(report.effects.len(), 1);
        assert_eq!(report.executed_nodes[1].status, LogStatus::Warning);
    }

    #[tokio::test]
    async fn zero_effect_run_carries_warning() {
        let nodes = vec![Node::new(1, "whatsapp_message", json!({})).at_x(0.0)];
        let report = runner().run(RunRequest::new("salut", nodes)).await;
        assert!(report.success);
        assert!(report.warning.is_some());
    }
}
