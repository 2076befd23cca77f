//! Single-pointer graph walker.
//!
//! One pointer moves through the node list: explicit `connectedTo` links
//! take precedence, otherwise the next node in ascending-x order runs. A
//! visited set guards against authored cycles, the context's
//! `should_continue` flag and handler halt signals end the walk early, and
//! a final pass records every untouched node as skipped. There is no
//! branching: a condition node records its verdict and the pointer moves
//! on regardless.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::log::{LogEntry, LogStatus};
use crate::node::{Node, NodeId, NodeLink};
use crate::registry::{ControlSignal, HandlerRegistry};

/// Returns indices into `nodes` sorted by ascending canvas x.
///
/// The sort is stable, so equal-x nodes keep their authored order.
#[must_use]
pub fn positional_order(nodes: &[Node]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        nodes[a]
            .position
            .x
            .partial_cmp(&nodes[b].position.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Finds the leftmost trigger node, if any.
#[must_use]
pub fn find_start(nodes: &[Node], order: &[usize]) -> Option<usize> {
    order.iter().copied().find(|&i| nodes[i].is_trigger())
}

/// Walks the graph from `start`, executing handlers and filling the
/// context's log and effect buffer. Returns when the flow ends for any
/// reason; the skipped post-pass runs before returning.
pub async fn walk(
    nodes: &[Node],
    start: usize,
    registry: &HandlerRegistry,
    ctx: &mut ExecutionContext,
) {
    let order = positional_order(nodes);
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut current = Some(start);

    while let Some(index) = current {
        let node = &nodes[index];
        if !visited.insert(node.id) {
            debug!(node_id = node.id.0, "cycle detected, stopping walk");
            break;
        }

        let halt = execute_node(node, registry, ctx).await;
        if halt || !ctx.should_continue {
            break;
        }

        current = match successor(node, nodes, &order, index, ctx) {
            Successor::Goto(next) => Some(next),
            Successor::End => None,
        };
    }

    record_skipped(nodes, &order, &visited, ctx);
}

/// Runs one node's handler, appends its log entry, and reports whether
/// the walk must halt.
async fn execute_node(node: &Node, registry: &HandlerRegistry, ctx: &mut ExecutionContext) -> bool {
    let Some(handler) = registry.get(&node.node_type) else {
        warn!(node_type = %node.node_type, "unknown node type");
        ctx.log.push(LogEntry::for_node(
            node,
            LogStatus::Error,
            format!("Type de nœud inconnu: {}", node.node_type),
        ));
        return false;
    };

    let started = Instant::now();
    let result = handler.handle(node, ctx).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(outcome) => {
            let mut entry =
                LogEntry::for_node(node, outcome.status, outcome.message).with_duration(duration_ms);
            if let Some(wait_ms) = outcome.wait_ms {
                entry = entry.with_wait(wait_ms);
            }
            ctx.log.push(entry);
            outcome.signal == ControlSignal::Halt
        }
        Err(err) => {
            warn!(node_id = node.id.0, error = %err, "node handler failed");
            ctx.log.push(
                LogEntry::for_node(node, LogStatus::Error, err.to_string())
                    .with_duration(duration_ms),
            );
            false
        }
    }
}

enum Successor {
    Goto(usize),
    End,
}

fn successor(
    node: &Node,
    nodes: &[Node],
    order: &[usize],
    index: usize,
    ctx: &mut ExecutionContext,
) -> Successor {
    match node.connected_to {
        Some(NodeLink::Terminate) => Successor::End,
        Some(NodeLink::Next(target)) => match nodes.iter().position(|n| n.id == target) {
            Some(next) => Successor::Goto(next),
            None => {
                // Authored link points at a deleted node. No positional
                // recovery: the author's intent is unknowable here.
                ctx.log.push(LogEntry::for_node(
                    node,
                    LogStatus::Warning,
                    format!("Lien brisé: nœud {} introuvable", target.0),
                ));
                Successor::End
            }
        },
        None => {
            let rank = order
                .iter()
                .position(|&i| i == index)
                .unwrap_or(order.len());
            match order.get(rank + 1) {
                Some(&next) => Successor::Goto(next),
                None => Successor::End,
            }
        }
    }
}

fn record_skipped(
    nodes: &[Node],
    order: &[usize],
    visited: &HashSet<NodeId>,
    ctx: &mut ExecutionContext,
) {
    for &i in order {
        let node = &nodes[i];
        if !visited.contains(&node.id) {
            ctx.log.push(LogEntry::for_node(
                node,
                LogStatus::Skipped,
                "Non exécuté (flux interrompu ou non atteint)",
            ));
        }
    }
}
