//! Top-level arbiter over all channels of one device.
//!
//! The arbiter owns the two resources only one channel may use at a time:
//! the receive path (one enabled decoder system-wide) and the transfer
//! buffer. Each [`Arbiter::tick`] steps every channel once, in order, and
//! applies the channels' reports:
//!
//! - a channel holding the receive path that reports it is no longer
//!   enabled hands the path to the next channel (round-robin);
//! - a channel that needs the buffer gets it if nobody holds it;
//! - a channel that no longer needs the buffer loses its grant.
//!
//! Grants made during a tick are seen by the channels on the next tick.

mod resources;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::time::Instant;

use bytes::Bytes;

pub use resources::{ReceivePath, TransferBuffer};

use crate::channel::{Channel, ChannelState, LinkEvent, StepContext, StepReport};
use crate::error::DpofError;
use crate::protocol::buffer::BUFFER_CAPACITY;
use crate::transport::{
    Clock, LinkRegisters, NonceSource, RandomNonces, StaticStatus, StatusSource, SystemClock,
};
use crate::types::{ChannelId, DpofConfig, TransactionId};

/// Multiplexes the receive path and the transfer buffer across channels
pub struct Arbiter<R: LinkRegisters> {
    registers: R,
    channels: Vec<Channel>,
    receive_path: ReceivePath,
    transfer_buffer: TransferBuffer,
    clock: Box<dyn Clock>,
    nonces: Box<dyn NonceSource>,
    status: Box<dyn StatusSource>,
    events: VecDeque<LinkEvent>,
}

impl<R: LinkRegisters> Arbiter<R> {
    /// Build an arbiter with the system clock, random nonces and a status
    /// block named after the host.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the decoders
    /// cannot be initialized.
    pub fn new(registers: R, config: DpofConfig) -> Result<Self, DpofError> {
        Self::builder(registers, config).build()
    }

    /// Start building an arbiter with custom collaborators
    #[must_use]
    pub fn builder(registers: R, config: DpofConfig) -> ArbiterBuilder<R> {
        ArbiterBuilder {
            registers,
            config,
            clock: None,
            nonces: None,
            status: None,
        }
    }

    /// Run one polling tick over all channels. Never fails: a channel whose
    /// step hit a register error is logged and retried on the next tick.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        for index in 0..self.channels.len() {
            let granted = self.transfer_buffer.is_granted(index);
            let mut ctx = StepContext {
                now,
                buffer_granted: granted,
                nonces: self.nonces.as_mut(),
                status: self.status.as_mut(),
                events: &mut self.events,
            };

            let channel = &mut self.channels[index];
            let report = match channel.step(&mut self.registers, &mut ctx) {
                Ok(report) => report,
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(
                            channel = index,
                            state = channel.state().name(),
                            error = %e,
                            "channel step failed, retrying next tick"
                        );
                    } else {
                        tracing::error!(
                            channel = index,
                            state = channel.state().name(),
                            error = %e,
                            "channel step failed"
                        );
                    }
                    StepReport {
                        keep_receive_path: channel.receive_enabled(),
                        needs_buffer: granted,
                    }
                }
            };

            if !report.keep_receive_path && self.receive_path.holder() == Some(index) {
                self.rotate_receive_path(index, now);
            }

            if report.needs_buffer {
                if self.transfer_buffer.owner().is_none() && self.transfer_buffer.try_acquire(index)
                {
                    tracing::debug!(channel = index, "transfer buffer granted");
                }
            } else if self.transfer_buffer.release(index) {
                tracing::debug!(channel = index, "transfer buffer released");
            }
        }
    }

    /// Start a query on `channel`.
    ///
    /// Returns `Ok(false)` if the channel is not idle; nothing changes.
    ///
    /// # Errors
    /// Returns an error for an unknown channel or if the Init frame could
    /// not be written.
    pub fn request_query(
        &mut self,
        channel: ChannelId,
        transaction_id: TransactionId,
    ) -> Result<bool, DpofError> {
        self.request(channel, transaction_id, Bytes::new())
    }

    /// Start a write of `payload` on `channel`.
    ///
    /// Returns `Ok(false)` if the channel is not idle; nothing changes.
    ///
    /// # Errors
    /// Returns an error for an unknown channel, a payload larger than the
    /// transfer buffer, or if the Init frame could not be written.
    pub fn request_write(
        &mut self,
        channel: ChannelId,
        transaction_id: TransactionId,
        payload: impl Into<Bytes>,
    ) -> Result<bool, DpofError> {
        let payload = payload.into();
        if payload.len() > BUFFER_CAPACITY {
            return Err(DpofError::PayloadTooLarge {
                len: payload.len(),
                capacity: BUFFER_CAPACITY,
            });
        }
        self.request(channel, transaction_id, payload)
    }

    fn request(
        &mut self,
        channel: ChannelId,
        transaction_id: TransactionId,
        payload: Bytes,
    ) -> Result<bool, DpofError> {
        let count = self.channels.len();
        let target = self
            .channels
            .get_mut(channel)
            .ok_or(DpofError::UnknownChannel { channel, count })?;

        if !target.can_transmit() {
            tracing::debug!(
                channel,
                state = target.state().name(),
                "request rejected, channel busy"
            );
            return Ok(false);
        }

        let nonce = self.nonces.next_nonce();
        target.begin(&mut self.registers, transaction_id, payload, nonce)
    }

    fn rotate_receive_path(&mut self, from: ChannelId, now: Instant) {
        let Some(next) = self.receive_path.rotate_from(from) else {
            return;
        };
        tracing::info!(from, to = next, "rotating receive path");
        if let Err(e) = self.channels[next].start_receive(&mut self.registers, now) {
            // The holder stays `next`; its next report rotates again
            tracing::warn!(channel = next, error = %e, "failed to enable receive path");
        }
    }

    /// Next queued completion event
    pub fn poll_event(&mut self) -> Option<LinkEvent> {
        self.events.pop_front()
    }

    /// Take all queued completion events
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        self.events.drain(..).collect()
    }

    /// Protocol state of a channel
    #[must_use]
    pub fn channel_state(&self, channel: ChannelId) -> Option<&ChannelState> {
        self.channels.get(channel).map(Channel::state)
    }

    /// All channels in polling order
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Number of channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel holding the receive path
    #[must_use]
    pub fn active_receive_path(&self) -> Option<ChannelId> {
        self.receive_path.holder()
    }

    /// Channel holding the transfer buffer grant
    #[must_use]
    pub fn buffer_owner(&self) -> Option<ChannelId> {
        self.transfer_buffer.owner()
    }

    /// Underlying register interface
    #[must_use]
    pub fn registers(&self) -> &R {
        &self.registers
    }

    /// Underlying register interface, mutably
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }
}

/// Builder for [`Arbiter`]
pub struct ArbiterBuilder<R: LinkRegisters> {
    registers: R,
    config: DpofConfig,
    clock: Option<Box<dyn Clock>>,
    nonces: Option<Box<dyn NonceSource>>,
    status: Option<Box<dyn StatusSource>>,
}

impl<R: LinkRegisters> ArbiterBuilder<R> {
    /// Use a custom clock
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Use a custom nonce source
    #[must_use]
    pub fn nonces(mut self, nonces: impl NonceSource + 'static) -> Self {
        self.nonces = Some(Box::new(nonces));
        self
    }

    /// Use a custom status source for query responses
    #[must_use]
    pub fn status(mut self, status: impl StatusSource + 'static) -> Self {
        self.status = Some(Box::new(status));
        self
    }

    /// Validate the config, disable every configured decoder and hand the
    /// receive path to channel 0.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a register
    /// access fails during initialization.
    pub fn build(self) -> Result<Arbiter<R>, DpofError> {
        self.config.validate()?;

        let mut registers = self.registers;
        for channel in &self.config.channels {
            registers.set_decoder_enabled(channel.decoder, false)?;
        }

        let policy = self.config.time_slice_policy;
        let channels: Vec<Channel> = self
            .config
            .channels
            .into_iter()
            .enumerate()
            .map(|(id, config)| Channel::new(id, config, policy))
            .collect();

        let mut arbiter = Arbiter {
            receive_path: ReceivePath::new(channels.len()),
            transfer_buffer: TransferBuffer::new(),
            registers,
            channels,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            nonces: self
                .nonces
                .unwrap_or_else(|| Box::new(RandomNonces::from_entropy())),
            status: self
                .status
                .unwrap_or_else(|| Box::new(StaticStatus::from_hostname())),
            events: VecDeque::new(),
        };

        let now = arbiter.clock.now();
        arbiter.receive_path.try_acquire(0);
        arbiter.channels[0].start_receive(&mut arbiter.registers, now)?;
        tracing::info!(
            channels = arbiter.channels.len(),
            ?policy,
            "arbiter initialized"
        );
        Ok(arbiter)
    }
}
