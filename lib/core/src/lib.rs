//! Core domain types for the chatflow automation platform.
//!
//! This crate provides the foundational id types shared by the chatflow
//! workflow engine and its boundary crates.

pub mod id;

pub use id::{RunId, SessionId};
