//! Per-channel negotiation and transfer state machine.
//!
//! A channel pairs one encoder (our frames) with one decoder (the peer's
//! frames). Negotiation runs entirely in the handshake bits of the
//! timestamp field; once a side wins and the arbiter grants it the
//! transfer buffer, the payload moves through the buffer.
//!
//! ```text
//! Requester (lower nonce)                Responder
//!   |--- Init(id, nonce) ------------------->|  Idle -> RxSlave
//!   |<-- Accept -----------------------------|  (buffer granted)
//!   |   TxWon, buffer granted                |
//!   |                                        |
//!   | query: arm rx, Accept ---------------->|  load response, transmit
//!   | write: load payload, transmit -------->|  armed for rx
//!   |                                        |
//!   |<-- End(status) ------------------------|  RxSlaveDone
//!   |--- data flag cleared ----------------->|  Idle
//! ```
//!
//! Every step is non-blocking: waiting means staying in the same state
//! and checking again on the next tick.

mod events;
mod machine;
mod receiver;
mod state;
mod transmitter;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::time::Instant;

use bytes::Bytes;

pub use events::LinkEvent;
pub use receiver::Receiver;
pub use state::{ChannelState, PendingTransaction};
pub use transmitter::Transmitter;

use crate::error::DpofError;
use crate::protocol::handshake::{HandshakeFrame, HandshakeState};
use crate::transport::{LinkRegisters, NonceSource, StatusSource};
use crate::types::{ChannelConfig, ChannelId, TimeSlicePolicy, TransactionId};

/// What a step needs from the arbiter next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// The decoder is still enabled and should stay so
    pub keep_receive_path: bool,
    /// The channel wants (or wants to keep) the transfer buffer
    pub needs_buffer: bool,
}

/// Shared inputs for one step
pub struct StepContext<'a> {
    /// Time of the current tick
    pub now: Instant,
    /// Whether this channel holds the transfer buffer grant
    pub buffer_granted: bool,
    /// Nonces for renegotiation and outgoing frames
    pub nonces: &'a mut dyn NonceSource,
    /// Local status for query responses
    pub status: &'a mut dyn StatusSource,
    /// Completion events
    pub events: &'a mut VecDeque<LinkEvent>,
}

/// One logical link to the peer
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    config: ChannelConfig,
    policy: TimeSlicePolicy,
    transmitter: Transmitter,
    receiver: Receiver,
    state: ChannelState,
}

impl Channel {
    /// Create an idle channel with its decoder considered disabled
    #[must_use]
    pub fn new(id: ChannelId, config: ChannelConfig, policy: TimeSlicePolicy) -> Self {
        Self {
            id,
            transmitter: Transmitter::new(config.encoder, config.tod),
            receiver: Receiver::new(config.decoder, config.time_slice),
            config,
            policy,
            state: ChannelState::Idle,
        }
    }

    /// Channel index
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Static wiring
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Current protocol state
    #[must_use]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Whether this channel's decoder is enabled
    #[must_use]
    pub fn receive_enabled(&self) -> bool {
        self.receiver.is_enabled()
    }

    /// Frame currently being transmitted, if any
    #[must_use]
    pub fn transmitting(&self) -> Option<HandshakeFrame> {
        self.transmitter.current()
    }

    /// A new request is only accepted while idle
    #[must_use]
    pub fn can_transmit(&self) -> bool {
        self.state.is_idle()
    }

    /// Enable this channel's decoder.
    ///
    /// # Errors
    /// Returns an error if a register access fails.
    pub fn start_receive<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        now: Instant,
    ) -> Result<(), DpofError> {
        self.receiver.start(registers, now)
    }

    /// Send Init for a new local request.
    ///
    /// Returns `Ok(false)` without touching anything if the channel is busy.
    ///
    /// # Errors
    /// Returns an error if the Init frame could not be written; the channel
    /// stays idle.
    pub fn begin<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        transaction_id: TransactionId,
        payload: Bytes,
        nonce: u8,
    ) -> Result<bool, DpofError> {
        if !self.can_transmit() {
            return Ok(false);
        }

        let frame = HandshakeFrame::new(HandshakeState::Init, transaction_id, nonce);
        self.transmitter.send(registers, frame)?;
        self.transition(ChannelState::TxNegotiating {
            pending: PendingTransaction::new(transaction_id, payload),
        });
        tracing::info!(
            channel = self.id,
            %transaction_id,
            nonce,
            "negotiation started"
        );
        Ok(true)
    }

    /// Run one step of the state machine.
    ///
    /// The time-slice rule is applied first (subject to the policy), then
    /// the current state's handler. The state only changes once all
    /// register accesses for the transition succeeded.
    ///
    /// # Errors
    /// Returns an error if a register access fails.
    pub fn step<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
    ) -> Result<StepReport, DpofError> {
        if self.time_slice_applies() {
            self.receiver.enforce_time_slice(registers, ctx.now)?;
        }

        let needs_buffer = self.advance(registers, ctx)?;
        Ok(StepReport {
            keep_receive_path: self.receiver.is_enabled(),
            needs_buffer,
        })
    }

    fn time_slice_applies(&self) -> bool {
        match self.policy {
            TimeSlicePolicy::Unconditional => true,
            TimeSlicePolicy::IdleOrNegotiating => matches!(
                self.state,
                ChannelState::Idle | ChannelState::TxNegotiating { .. }
            ),
        }
    }

    fn transition(&mut self, next: ChannelState) {
        tracing::debug!(
            channel = self.id,
            from = self.state.name(),
            to = next.name(),
            "state transition"
        );
        self.state = next;
    }
}
