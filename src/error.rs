//! Error types for btvitals.
//!
//! Strongly typed with thiserror so callers can match on the exact
//! failure instead of parsing messages. Nothing in here retries;
//! retry policy belongs to whoever runs the session.

use thiserror::Error;
use uuid::Uuid;

/// Failures of the transport lifecycle operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter found")]
    NoAdapter,

    #[error("scan failed: {reason}")]
    Scan { reason: String },

    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("no notify characteristic for channel {channel}")]
    ChannelNotFound { channel: Uuid },

    #[error("subscription to {channel} rejected: {reason}")]
    Subscribe { channel: Uuid, reason: String },

    #[error("unsubscribe from {channel} failed: {reason}")]
    Unsubscribe { channel: Uuid, reason: String },

    #[error("disconnect failed: {reason}")]
    Disconnect { reason: String },

    #[error("operation requires an active connection")]
    NotConnected,
}

/// A notification payload the frame decoder cannot accept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("vitals frame too short: {len} bytes, need at least 2")]
    TooShort { len: usize },
}

/// An alert sink refused a delivery. Never fatal to the session.
#[derive(Debug, Error)]
#[error("alert delivery failed: {reason}")]
pub struct SinkError {
    pub reason: String,
}

/// Failures that abort a monitoring session before its window runs.
///
/// Link loss mid-window is deliberately not in here; it is a
/// [`SessionOutcome`](crate::session::SessionOutcome), not an error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session connect failed: {0}")]
    Connect(TransportError),

    #[error("session subscribe failed: {0}")]
    Subscribe(TransportError),
}
