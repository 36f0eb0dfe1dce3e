//! Completion events surfaced to the application

use bytes::Bytes;

use crate::types::{ChannelId, TransactionId};

/// Something the application may want to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Our query finished; `payload` is what the peer sent
    QueryCompleted {
        /// Channel the query ran on
        channel: ChannelId,
        /// Query id
        transaction_id: TransactionId,
        /// Response bytes as received
        payload: Bytes,
    },
    /// Our write was acknowledged by the peer's End
    WriteCompleted {
        /// Channel the write ran on
        channel: ChannelId,
        /// Write id
        transaction_id: TransactionId,
        /// Buffer status byte the peer reported with End
        peer_status: u8,
    },
    /// The peer wrote to us
    WriteReceived {
        /// Channel the write arrived on
        channel: ChannelId,
        /// Write id
        transaction_id: TransactionId,
        /// Bytes as received
        payload: Bytes,
    },
}

impl LinkEvent {
    /// Channel the event belongs to
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::QueryCompleted { channel, .. }
            | Self::WriteCompleted { channel, .. }
            | Self::WriteReceived { channel, .. } => *channel,
        }
    }
}
