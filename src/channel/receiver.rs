//! Receive role: one decoder watching the peer's frames.

use std::time::{Duration, Instant};

use crate::error::DpofError;
use crate::protocol::handshake::HandshakeFrame;
use crate::transport::LinkRegisters;

/// Decoder bookkeeping for one channel
#[derive(Debug, Clone)]
pub struct Receiver {
    decoder: u8,
    time_slice: Duration,
    enabled_at: Option<Instant>,
    /// Snapshot taken before enabling; stale until something new shows up
    baseline: Option<u16>,
    last_seen: Option<u16>,
}

impl Receiver {
    /// Disabled receiver for `decoder`
    #[must_use]
    pub fn new(decoder: u8, time_slice: Duration) -> Self {
        Self {
            decoder,
            time_slice,
            enabled_at: None,
            baseline: None,
            last_seen: None,
        }
    }

    /// Decoder index
    #[must_use]
    pub fn decoder(&self) -> u8 {
        self.decoder
    }

    /// Whether the decoder is currently enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled_at.is_some()
    }

    /// How long the decoder has been enabled
    #[must_use]
    pub fn enabled_for(&self, now: Instant) -> Duration {
        self.enabled_at
            .map_or(Duration::ZERO, |at| now.saturating_duration_since(at))
    }

    /// Enable the decoder, remembering the stale snapshot it starts from.
    ///
    /// # Errors
    /// Returns an error if a register access fails; the receiver stays disabled.
    pub fn start<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        now: Instant,
    ) -> Result<(), DpofError> {
        let snapshot = HandshakeFrame::raw_from_seconds(registers.read_receive_seconds()?);
        registers.set_decoder_enabled(self.decoder, true)?;
        self.baseline = Some(snapshot);
        self.enabled_at = Some(now);
        tracing::debug!(decoder = self.decoder, "receive path enabled");
        Ok(())
    }

    /// Disable the decoder.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    pub fn stop<R: LinkRegisters + ?Sized>(&mut self, registers: &mut R) -> Result<(), DpofError> {
        registers.set_decoder_enabled(self.decoder, false)?;
        self.enabled_at = None;
        tracing::debug!(decoder = self.decoder, "receive path disabled");
        Ok(())
    }

    /// Disable the decoder once its time slice is used up.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    pub fn enforce_time_slice<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
        now: Instant,
    ) -> Result<(), DpofError> {
        let elapsed = self.enabled_for(now);
        if self.is_enabled() && elapsed >= self.time_slice {
            tracing::debug!(
                decoder = self.decoder,
                elapsed_ms = elapsed.as_millis(),
                slice_ms = self.time_slice.as_millis(),
                "time slice elapsed"
            );
            self.stop(registers)?;
        }
        Ok(())
    }

    /// Return the peer's frame if it changed since last observed.
    ///
    /// # Errors
    /// Returns an error if the snapshot read fails.
    pub fn poll<R: LinkRegisters + ?Sized>(
        &mut self,
        registers: &mut R,
    ) -> Result<Option<HandshakeFrame>, DpofError> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let raw = HandshakeFrame::raw_from_seconds(registers.read_receive_seconds()?);
        if self.last_seen == Some(raw) || self.baseline == Some(raw) {
            return Ok(None);
        }

        self.baseline = None;
        self.last_seen = Some(raw);
        let frame = HandshakeFrame::decode(raw);
        tracing::trace!(decoder = self.decoder, raw = format_args!("0x{raw:04x}"), ?frame, "new frame");
        Ok(Some(frame))
    }
}
