//! Outbound boundary traits for the chatflow platform.
//!
//! The workflow engine records intent and outcome; the actual delivery of
//! HTTP calls, chat messages, and notifications happens behind the traits
//! defined here. Every sink follows the same non-fatal policy: a failed
//! call is logged by the caller and the run keeps going.

pub mod error;
pub mod http;
pub mod notify;
pub mod transport;

pub use error::{HttpSinkError, NotifyError, TransportError};
pub use http::{HttpMethod, HttpRequestSpec, HttpResult, HttpSink};
pub use notify::{Notification, NotificationSink};
pub use transport::{MessagingTransport, Recipient};
