//! Transmit role: frames written into one encoder's timestamp field.

use crate::error::DpofError;
use crate::protocol::handshake::{HANDSHAKE_SHIFT, HandshakeFrame};
use crate::transport::{JumpDirection, LinkRegisters};

const DATA_FLAG_RAW: u16 = 0x8000;

/// Encoder bookkeeping for one channel
#[derive(Debug, Clone)]
pub struct Transmitter {
    encoder: u8,
    tod: u8,
    current: Option<HandshakeFrame>,
}

impl Transmitter {
    /// Idle transmitter
    #[must_use]
    pub fn new(encoder: u8, tod: u8) -> Self {
        Self {
            encoder,
            tod,
            current: None,
        }
    }

    /// Frame currently being transmitted
    #[must_use]
    pub fn current(&self) -> Option<HandshakeFrame> {
        self.current
    }

    /// Our nonce, if a frame is active
    #[must_use]
    pub fn nonce(&self) -> Option<u8> {
        self.current.map(|frame| frame.nonce)
    }

    /// Replace whatever is being sent with `frame`.
    ///
    /// # Errors
    /// Returns an error if a register access fails.
    pub fn send<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        frame: HandshakeFrame,
    ) -> Result<(), DpofError> {
        if self.current.is_some() {
            self.clear(registers)?;
        }
        registers.jump_transmit_seconds(
            self.encoder,
            frame.seconds_offset(),
            JumpDirection::Forward,
        )?;
        self.current = Some(frame);
        tracing::trace!(encoder = self.encoder, ?frame, "frame sent");
        Ok(())
    }

    /// Return the timestamp field to normal use.
    ///
    /// # Errors
    /// Returns an error if a register access fails.
    pub fn stop<R: LinkRegisters + ?Sized>(&mut self, registers: &mut R) -> Result<(), DpofError> {
        if self.current.is_none() {
            return Ok(());
        }
        self.clear(registers)?;
        self.current = None;
        tracing::trace!(encoder = self.encoder, "transmit stopped");
        Ok(())
    }

    /// Jump back by whatever handshake bytes the counter holds now.
    fn clear<R: LinkRegisters + ?Sized>(&mut self, registers: &mut R) -> Result<(), DpofError> {
        let raw = HandshakeFrame::raw_from_seconds(registers.read_transmit_seconds(self.tod)?);
        if raw & DATA_FLAG_RAW != 0 {
            registers.jump_transmit_seconds(
                self.encoder,
                u64::from(raw) << HANDSHAKE_SHIFT,
                JumpDirection::Backward,
            )?;
        }
        Ok(())
    }
}
