//! Protocol states of a channel.

use std::fmt;

use bytes::Bytes;

use crate::types::{TransactionId, TransactionKind};

/// A locally requested transaction waiting to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTransaction {
    /// Read from the peer
    Query {
        /// Requested operation
        transaction_id: TransactionId,
    },
    /// Send `payload` to the peer
    Write {
        /// Requested operation
        transaction_id: TransactionId,
        /// Bytes to transmit once the buffer is ours
        payload: Bytes,
    },
}

impl PendingTransaction {
    /// Classify a request by its id; queries carry no payload.
    #[must_use]
    pub fn new(transaction_id: TransactionId, payload: Bytes) -> Self {
        match transaction_id.kind() {
            TransactionKind::Query => Self::Query { transaction_id },
            TransactionKind::Write => Self::Write {
                transaction_id,
                payload,
            },
        }
    }

    /// Requested operation
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Query { transaction_id } | Self::Write { transaction_id, .. } => *transaction_id,
        }
    }
}

/// Channel protocol state.
///
/// `RxSlave*` states belong to the responder that lost (or never entered)
/// negotiation; `Tx*` states belong to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Nothing in flight, watching for a peer request
    #[default]
    Idle,
    /// Peer request recorded, waiting for the transfer buffer
    RxSlave {
        /// Peer's requested operation
        request: TransactionId,
    },
    /// Accept sent for a query, waiting for the peer's Accept
    RxSlaveRespondQuery {
        /// Peer's requested operation
        request: TransactionId,
    },
    /// Response size declared, waiting for the buffer to accept bytes
    RxSlaveAwaitBufferArmed {
        /// Peer's requested operation
        request: TransactionId,
        /// Response to load
        response: Bytes,
    },
    /// Response loaded and started, waiting for transmit completion
    RxSlaveAwaitBufferSent {
        /// Peer's requested operation
        request: TransactionId,
    },
    /// Buffer armed for reception of the peer's write
    RxSlaveAwaitIncomingWrite {
        /// Peer's requested operation
        request: TransactionId,
    },
    /// End sent, waiting for the peer to drop the data flag or start again
    RxSlaveDone {
        /// Peer's requested operation
        request: TransactionId,
    },
    /// Init sent, waiting for Accept or a competing Init
    TxNegotiating {
        /// Our request
        pending: PendingTransaction,
    },
    /// Negotiation won, waiting for the transfer buffer
    TxWon {
        /// Our request
        pending: PendingTransaction,
    },
    /// Transmit requested, waiting for the buffer to accept bytes
    TxWriting {
        /// Our request
        transaction_id: TransactionId,
        /// Bytes to load
        payload: Bytes,
    },
    /// Buffer armed for reception of the peer's response
    TxQuerying {
        /// Our request
        transaction_id: TransactionId,
    },
    /// Our part is done, waiting for the peer's End
    TxAwaitPeerDone {
        /// Our request
        transaction_id: TransactionId,
        /// A write is still in flight until End arrives
        holds_buffer: bool,
    },
}

impl ChannelState {
    /// Short state name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::RxSlave { .. } => "RxSlave",
            Self::RxSlaveRespondQuery { .. } => "RxSlaveRespondQuery",
            Self::RxSlaveAwaitBufferArmed { .. } => "RxSlaveAwaitBufferArmed",
            Self::RxSlaveAwaitBufferSent { .. } => "RxSlaveAwaitBufferSent",
            Self::RxSlaveAwaitIncomingWrite { .. } => "RxSlaveAwaitIncomingWrite",
            Self::RxSlaveDone { .. } => "RxSlaveDone",
            Self::TxNegotiating { .. } => "TxNegotiating",
            Self::TxWon { .. } => "TxWon",
            Self::TxWriting { .. } => "TxWriting",
            Self::TxQuerying { .. } => "TxQuerying",
            Self::TxAwaitPeerDone { .. } => "TxAwaitPeerDone",
        }
    }

    /// True in `Idle`
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
