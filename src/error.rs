use std::io;
use thiserror::Error;

/// Errors that can occur while negotiating or transferring over the link
#[derive(Debug, Error)]
pub enum DpofError {
    // ===== Request Errors =====
    /// Transaction id does not fit in the 5-bit handshake field
    #[error("invalid transaction id {id}: must be in 0..=31")]
    InvalidTransactionId {
        /// The rejected id
        id: u8,
    },

    /// Channel index is not part of the configuration
    #[error("unknown channel {channel} ({count} configured)")]
    UnknownChannel {
        /// The requested channel index
        channel: usize,
        /// Number of configured channels
        count: usize,
    },

    /// Payload does not fit in the transfer buffer
    #[error("payload of {len} bytes exceeds transfer buffer capacity of {capacity}")]
    PayloadTooLarge {
        /// Length of the rejected payload
        len: usize,
        /// Buffer capacity in bytes
        capacity: usize,
    },

    // ===== Register Errors =====
    /// Register access on the physical layer failed
    #[error("register access failed: {message}")]
    RegisterAccess {
        /// Description of the failure
        message: String,
        /// The underlying source of the error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Bus I/O error
    #[error("bus error: {0}")]
    Bus(#[from] io::Error),

    // ===== Payload Errors =====
    /// Payload encoding/decoding failed
    #[error("codec error: {message}")]
    CodecError {
        /// Description of the error
        message: String,
    },

    // ===== Configuration Errors =====
    /// Configuration is not usable
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Configuration could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl DpofError {
    /// Check if this error came from the physical register layer
    ///
    /// Such failures are transient from the state machine's point of view:
    /// the step is retried on the next tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RegisterAccess { .. } | Self::Bus(_))
    }

    /// Shorthand for a register failure without an underlying source
    pub fn register(message: impl Into<String>) -> Self {
        Self::RegisterAccess {
            message: message.into(),
            source: None,
        }
    }
}
