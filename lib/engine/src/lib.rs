//! Workflow interpreter for the chatflow automation platform.
//!
//! One inbound chat message drives one pass through a user-authored graph
//! of typed blocks and produces an ordered list of outbound effects plus a
//! structured execution log. The pieces:
//!
//! - [`node`]: the wire-exact node shape (id, type tag, opaque config,
//!   canvas position, optional explicit link).
//! - [`context`]: the per-run mutable state threaded through traversal
//!   (trigger message, variables, outbound buffer, cart, control flag).
//! - [`template`]: `{{path.to.value}}` substitution against the context.
//! - [`registry`]: the `NodeHandler` contract and the table-driven handler
//!   registry covering every block type.
//! - [`traversal`]: the single-pointer scheduler (explicit link, positional
//!   fallback, cycle guard, stop signal, skipped post-pass).
//! - [`runner`]: the run coordinator checking preconditions and assembling
//!   the boundary-facing result.
//!
//! Traversal never branches: a condition block records its verdict in the
//! context and the log, and the single current-node pointer moves on. This
//! mirrors the authoring surface's contract and is deliberate.

pub mod context;
pub mod effect;
pub mod error;
pub mod handlers;
pub mod log;
pub mod node;
pub mod registry;
pub mod runner;
pub mod template;
pub mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{CartLine, ContactProfile, ExecutionContext, Product, Variables};
pub use effect::{Button, OutboundEffect};
pub use error::HandlerError;
pub use log::{LogEntry, LogStatus};
pub use node::{Node, NodeId, NodeLink, Position};
pub use registry::{Boundaries, ControlSignal, HandlerOutcome, HandlerRegistry, NodeHandler};
pub use runner::{FlowRunner, RunReport, RunRequest};
