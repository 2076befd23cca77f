//! Completion-service boundary for the chatflow platform.
//!
//! The workflow engine never talks to an LLM provider directly. It goes
//! through the [`CompletionBackend`] trait defined here, and when that
//! boundary fails (rate limit, auth, network) it degrades to the local
//! deterministic heuristics in [`fallback`] rather than aborting the run.

pub mod backend;
pub mod error;
pub mod fallback;

pub use backend::{CompletionBackend, CompletionRequest, CompletionResponse, TokenUsage};
pub use error::CompletionError;
