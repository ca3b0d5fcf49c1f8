//! Error types for the lobby client.

use thiserror::Error;

use crate::operation::Operation;

/// Errors that can occur when using the lobby client.
#[derive(Debug, Error)]
pub enum LobbyError {
    /// A correlated operation is already outstanding; the call was not forwarded.
    #[error("operation {0:?} is still pending")]
    OperationPending(Operation),

    /// Attempted a room operation but the client is not in a room.
    #[error("not in a room")]
    NotInRoom,

    /// `connect` was called without a region.
    #[error("a region must be specified to connect")]
    MissingRegion,

    /// Custom event codes are restricted to `1..=199`.
    #[error("event code {0} is outside 1..=199")]
    InvalidEventCode(u8),

    /// Interest group ids are restricted to `1..=255`.
    #[error("interest group {0} is outside 1..=255")]
    InvalidInterestGroup(u8),

    /// The network client refused to issue the request.
    #[error("request rejected by network client: {0}")]
    Rejected(String),

    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for lobby client operations.
pub type Result<T> = std::result::Result<T, LobbyError>;
