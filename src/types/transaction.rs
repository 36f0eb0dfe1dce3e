use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DpofError;

/// Identifier of a requested operation, carried in the 5-bit handshake field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TransactionId(u8);

impl TransactionId {
    /// Largest id representable in the handshake field.
    pub const MAX: u8 = 0x1f;

    /// Read the chip status block of the peer.
    pub const QUERY_STATUS: Self = Self(0);

    /// Write outputs / follow request to the peer.
    pub const WRITE_COMMAND: Self = Self(1);

    /// Create a transaction id, rejecting values outside `0..=31`.
    ///
    /// # Errors
    /// Returns [`DpofError::InvalidTransactionId`] if `id > 31`.
    pub fn new(id: u8) -> Result<Self, DpofError> {
        if id > Self::MAX {
            return Err(DpofError::InvalidTransactionId { id });
        }
        Ok(Self(id))
    }

    /// Build from the low five bits of a handshake byte.
    #[must_use]
    pub(crate) fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MAX)
    }

    /// Raw value
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Which side ends up transmitting on the transfer buffer.
    #[must_use]
    pub fn kind(self) -> TransactionKind {
        if self.0 == 0 {
            TransactionKind::Query
        } else {
            TransactionKind::Write
        }
    }

    /// Whether this id has a defined payload schema
    #[must_use]
    pub fn is_defined(self) -> bool {
        self.0 <= 1
    }
}

impl TryFrom<u8> for TransactionId {
    type Error = DpofError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransactionId> for u8 {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Direction of the bulk exchange a transaction implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Requester receives, responder transmits.
    Query,
    /// Requester transmits, responder receives.
    Write,
}

/// Index of a channel within the arbiter's configuration.
pub type ChannelId = usize;
