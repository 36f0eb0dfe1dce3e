//! State handlers. Each returns whether the transfer buffer is needed.

use std::cmp::Ordering;

use bytes::Bytes;

use super::events::LinkEvent;
use super::state::{ChannelState, PendingTransaction};
use super::{Channel, StepContext};
use crate::error::DpofError;
use crate::protocol::buffer::{BUFFER_CAPACITY, BufferCommand, BufferStatus};
use crate::protocol::handshake::{HandshakeFrame, HandshakeState};
use crate::transport::LinkRegisters;
use crate::types::{TransactionId, TransactionKind};

impl Channel {
    pub(super) fn advance<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
    ) -> Result<bool, DpofError> {
        // Bytes clones are reference counted
        match self.state.clone() {
            ChannelState::Idle => self.on_idle(registers),
            ChannelState::RxSlave { request } => self.on_rx_slave(registers, ctx, request),
            ChannelState::RxSlaveRespondQuery { request } => {
                self.on_respond_query(registers, ctx, request)
            }
            ChannelState::RxSlaveAwaitBufferArmed { request, response } => {
                self.on_await_buffer_armed(registers, request, &response)
            }
            ChannelState::RxSlaveAwaitBufferSent { request } => {
                self.on_await_buffer_sent(registers, request)
            }
            ChannelState::RxSlaveAwaitIncomingWrite { request } => {
                self.on_await_incoming_write(registers, ctx, request)
            }
            ChannelState::RxSlaveDone { .. } => self.on_rx_slave_done(registers),
            ChannelState::TxNegotiating { pending } => self.on_negotiating(registers, ctx, pending),
            ChannelState::TxWon { pending } => self.on_won(registers, ctx, pending),
            ChannelState::TxWriting {
                transaction_id,
                payload,
            } => self.on_writing(registers, transaction_id, &payload),
            ChannelState::TxQuerying { transaction_id } => {
                self.on_querying(registers, ctx, transaction_id)
            }
            ChannelState::TxAwaitPeerDone {
                transaction_id,
                holds_buffer,
            } => self.on_await_peer_done(registers, ctx, transaction_id, holds_buffer),
        }
    }

    // ===== Responder =====

    fn on_idle<R: LinkRegisters + ?Sized>(&mut self, registers: &mut R) -> Result<bool, DpofError> {
        match self.receiver.poll(registers)? {
            Some(frame) if frame.data_flag => {
                tracing::info!(
                    channel = self.id,
                    request = %frame.transaction_id,
                    "peer request observed"
                );
                self.transition(ChannelState::RxSlave {
                    request: frame.transaction_id,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn on_rx_slave<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        request: TransactionId,
    ) -> Result<bool, DpofError> {
        if !ctx.buffer_granted {
            return Ok(true);
        }

        let accept = HandshakeFrame::new(HandshakeState::Accept, request, ctx.nonces.next_nonce());
        match request.kind() {
            TransactionKind::Query => {
                self.transmitter.send(registers, accept)?;
                self.transition(ChannelState::RxSlaveRespondQuery { request });
            }
            TransactionKind::Write => {
                // Armed before Accept so the requester never transmits into a busy buffer
                registers.write_buffer_command(BufferCommand::ArmReceive)?;
                self.transmitter.send(registers, accept)?;
                self.transition(ChannelState::RxSlaveAwaitIncomingWrite { request });
            }
        }
        Ok(true)
    }

    fn on_respond_query<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        request: TransactionId,
    ) -> Result<bool, DpofError> {
        let Some(frame) = self.receiver.poll(registers)? else {
            return Ok(true);
        };
        if frame.state != HandshakeState::Accept {
            return Ok(true);
        }

        let response = if request == TransactionId::QUERY_STATUS {
            ctx.status.query_response().encode()
        } else {
            tracing::warn!(channel = self.id, %request, "no response defined for query");
            Bytes::new()
        };
        registers.write_buffer_size(response.len())?;
        registers.write_buffer_command(BufferCommand::ArmTransmit)?;
        tracing::debug!(channel = self.id, len = response.len(), "query response armed");
        self.transition(ChannelState::RxSlaveAwaitBufferArmed { request, response });
        Ok(true)
    }

    fn on_await_buffer_armed<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        request: TransactionId,
        response: &[u8],
    ) -> Result<bool, DpofError> {
        let status = BufferStatus::from_raw(registers.read_buffer_status()?);
        if status == BufferStatus::TxAckReady {
            registers.write_buffer_bytes(response)?;
            registers.write_buffer_command(BufferCommand::StartTransmit)?;
            self.transition(ChannelState::RxSlaveAwaitBufferSent { request });
        } else if !matches!(
            status,
            BufferStatus::Idle | BufferStatus::TxArmed | BufferStatus::TxStarted
        ) {
            self.report_anomaly(status);
        }
        Ok(true)
    }

    fn on_await_buffer_sent<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        request: TransactionId,
    ) -> Result<bool, DpofError> {
        let status = BufferStatus::from_raw(registers.read_buffer_status()?);
        match status {
            BufferStatus::TxComplete => {
                let end = HandshakeFrame::new(HandshakeState::End, request, status.raw());
                self.transmitter.send(registers, end)?;
                tracing::info!(channel = self.id, %request, "query response sent");
                self.transition(ChannelState::RxSlaveDone { request });
                Ok(false)
            }
            BufferStatus::Error(_) => {
                self.report_anomaly(status);
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn on_await_incoming_write<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        request: TransactionId,
    ) -> Result<bool, DpofError> {
        let status = BufferStatus::from_raw(registers.read_buffer_status()?);
        match status {
            BufferStatus::RxComplete => {
                let payload = read_payload(registers)?;
                let end = HandshakeFrame::new(HandshakeState::End, request, status.raw());
                self.transmitter.send(registers, end)?;
                tracing::info!(
                    channel = self.id,
                    %request,
                    len = payload.len(),
                    "write received"
                );
                ctx.events.push_back(LinkEvent::WriteReceived {
                    channel: self.id,
                    transaction_id: request,
                    payload,
                });
                self.transition(ChannelState::RxSlaveDone { request });
                Ok(false)
            }
            BufferStatus::Error(_) => {
                self.report_anomaly(status);
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn on_rx_slave_done<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
    ) -> Result<bool, DpofError> {
        match self.receiver.poll(registers)? {
            Some(frame) if !frame.data_flag => {
                self.transmitter.stop(registers)?;
                self.transition(ChannelState::Idle);
                Ok(false)
            }
            Some(frame) if frame.state == HandshakeState::Init => {
                tracing::info!(
                    channel = self.id,
                    request = %frame.transaction_id,
                    "pipelined peer request"
                );
                self.transition(ChannelState::RxSlave {
                    request: frame.transaction_id,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ===== Requester =====

    /// Nonces are only compared when a fresh Init arrives from the peer.
    /// After a collision both sides redraw, so the Init that collided says
    /// nothing about the peer's new nonce.
    fn on_negotiating<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        pending: PendingTransaction,
    ) -> Result<bool, DpofError> {
        let theirs = match self.receiver.poll(registers)? {
            Some(frame) if frame.data_flag => match frame.state {
                HandshakeState::Accept => {
                    tracing::info!(channel = self.id, "peer accepted, negotiation won");
                    self.transition(ChannelState::TxWon { pending });
                    return Ok(true);
                }
                HandshakeState::Init => frame,
                HandshakeState::End | HandshakeState::Reserved => return Ok(false),
            },
            _ => return Ok(false),
        };

        let ours = self.transmitter.nonce().unwrap_or_default();
        match ours.cmp(&theirs.nonce) {
            Ordering::Less => {
                tracing::info!(
                    channel = self.id,
                    ours,
                    theirs = theirs.nonce,
                    "negotiation won on nonce"
                );
                self.transition(ChannelState::TxWon { pending });
                Ok(true)
            }
            Ordering::Greater => {
                self.transmitter.stop(registers)?;
                tracing::warn!(
                    channel = self.id,
                    ours,
                    theirs = theirs.nonce,
                    discarded = %pending.transaction_id(),
                    "negotiation lost, local request discarded"
                );
                self.transition(ChannelState::RxSlave {
                    request: theirs.transaction_id,
                });
                Ok(true)
            }
            Ordering::Equal => {
                // A repeat of the collided value would leave our frame
                // unchanged and the peer could never see the redraw
                let mut nonce = ctx.nonces.next_nonce();
                if nonce == ours {
                    nonce = nonce.wrapping_add(1);
                }
                let init = HandshakeFrame::new(HandshakeState::Init, pending.transaction_id(), nonce);
                self.transmitter.send(registers, init)?;
                tracing::debug!(channel = self.id, collided = ours, nonce, "nonce collision, redrawn");
                Ok(false)
            }
        }
    }

    fn on_won<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        pending: PendingTransaction,
    ) -> Result<bool, DpofError> {
        if !ctx.buffer_granted {
            return Ok(true);
        }

        match pending {
            PendingTransaction::Query { transaction_id } => {
                registers.write_buffer_command(BufferCommand::ArmReceive)?;
                let accept =
                    HandshakeFrame::new(HandshakeState::Accept, transaction_id, ctx.nonces.next_nonce());
                self.transmitter.send(registers, accept)?;
                self.transition(ChannelState::TxQuerying { transaction_id });
            }
            PendingTransaction::Write {
                transaction_id,
                payload,
            } => {
                registers.write_buffer_size(payload.len())?;
                registers.write_buffer_command(BufferCommand::ArmTransmit)?;
                self.transition(ChannelState::TxWriting {
                    transaction_id,
                    payload,
                });
            }
        }
        Ok(true)
    }

    fn on_writing<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        transaction_id: TransactionId,
        payload: &[u8],
    ) -> Result<bool, DpofError> {
        let status = BufferStatus::from_raw(registers.read_buffer_status()?);
        if status == BufferStatus::TxAckReady {
            registers.write_buffer_bytes(payload)?;
            registers.write_buffer_command(BufferCommand::StartTransmit)?;
            self.transition(ChannelState::TxAwaitPeerDone {
                transaction_id,
                holds_buffer: true,
            });
        } else if status.is_anomaly() {
            self.report_anomaly(status);
        }
        Ok(true)
    }

    fn on_querying<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        transaction_id: TransactionId,
    ) -> Result<bool, DpofError> {
        let status = BufferStatus::from_raw(registers.read_buffer_status()?);
        if status != BufferStatus::RxComplete {
            if status.is_anomaly() {
                self.report_anomaly(status);
            }
            return Ok(true);
        }

        let payload = read_payload(registers)?;
        let peer_done = self
            .receiver
            .poll(registers)?
            .is_some_and(|frame| frame.state == HandshakeState::End);
        if peer_done {
            self.transmitter.stop(registers)?;
        }

        tracing::info!(
            channel = self.id,
            %transaction_id,
            len = payload.len(),
            "query response received"
        );
        ctx.events.push_back(LinkEvent::QueryCompleted {
            channel: self.id,
            transaction_id,
            payload,
        });
        if peer_done {
            self.transition(ChannelState::Idle);
        } else {
            self.transition(ChannelState::TxAwaitPeerDone {
                transaction_id,
                holds_buffer: false,
            });
        }
        Ok(false)
    }

    fn on_await_peer_done<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        ctx: &mut StepContext<'_>,
        transaction_id: TransactionId,
        holds_buffer: bool,
    ) -> Result<bool, DpofError> {
        match self.receiver.poll(registers)? {
            Some(frame) if frame.state == HandshakeState::End => {
                self.transmitter.stop(registers)?;
                tracing::info!(
                    channel = self.id,
                    %transaction_id,
                    peer_status = frame.nonce,
                    "peer signalled end"
                );
                if transaction_id.kind() == TransactionKind::Write {
                    ctx.events.push_back(LinkEvent::WriteCompleted {
                        channel: self.id,
                        transaction_id,
                        peer_status: frame.nonce,
                    });
                }
                self.transition(ChannelState::Idle);
                Ok(false)
            }
            _ => Ok(holds_buffer),
        }
    }

    fn report_anomaly(&self, status: BufferStatus) {
        tracing::warn!(
            channel = self.id,
            state = self.state.name(),
            status = format_args!("0x{:02x}", status.raw()),
            "unexpected transfer buffer status"
        );
    }
}

/// Read the declared size and that many bytes, clamped to the buffer.
fn read_payload<R: LinkRegisters + ?Sized>(registers: &mut R) -> Result<Bytes, DpofError> {
    let declared = registers.read_buffer_size()?;
    if declared > BUFFER_CAPACITY {
        tracing::warn!(declared, "declared size exceeds buffer capacity, clamping");
    }
    let bytes = registers.read_buffer_bytes(declared.min(BUFFER_CAPACITY))?;
    Ok(Bytes::from(bytes))
}
