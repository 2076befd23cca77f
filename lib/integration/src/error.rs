//! Error types for the integration boundaries.

use std::fmt;

/// Errors from the generic HTTP sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpSinkError {
    /// The request could not be sent at all.
    SendFailed { url: String, reason: String },
    /// The sink refused the request before sending (bad URL, bad method).
    InvalidRequest { reason: String },
    /// Timeout waiting for a response.
    Timeout { url: String },
}

impl fmt::Display for HttpSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { url, reason } => {
                write!(f, "http request to {url} failed: {reason}")
            }
            Self::InvalidRequest { reason } => write!(f, "invalid http request: {reason}"),
            Self::Timeout { url } => write!(f, "http request to {url} timed out"),
        }
    }
}

impl std::error::Error for HttpSinkError {}

/// Errors from the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport is not connected to the messaging bridge.
    NotConnected { reason: String },
    /// A send was rejected for this recipient.
    SendRejected { recipient: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { reason } => {
                write!(f, "messaging transport not connected: {reason}")
            }
            Self::SendRejected { recipient, reason } => {
                write!(f, "send to {recipient} rejected: {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors from notification sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Delivery to the named channel failed.
    DeliveryFailed { channel: String, reason: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeliveryFailed { channel, reason } => {
                write!(f, "notification to {channel} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}
