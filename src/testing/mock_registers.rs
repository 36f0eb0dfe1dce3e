//! Single-device register fake with directly settable inputs.
//!
//! Tests set the peer's frame and the buffer status by hand, then inspect
//! what the code under test wrote.

use std::collections::BTreeMap;

use crate::error::DpofError;
use crate::protocol::buffer::{BUFFER_CAPACITY, BufferCommand};
use crate::protocol::handshake::HandshakeFrame;
use crate::transport::{JumpDirection, LinkRegisters};

/// Seconds value every counter starts from; the handshake bytes are clear
pub const BASE_SECONDS: u64 = 0x0000_6543_2109;

/// Recording fake for one device
#[derive(Debug, Clone)]
pub struct MockRegisters {
    /// Value returned by the receive snapshot
    pub receive_seconds: u64,
    /// Seconds per TOD counter; encoder `n` drives counter `n`
    pub transmit_seconds: BTreeMap<u8, u64>,
    /// Decoder enable flags as last written
    pub decoders: BTreeMap<u8, bool>,
    /// Raw buffer status returned on read
    pub buffer_status: u8,
    /// Buffer size register
    pub buffer_size: usize,
    /// Buffer contents
    pub buffer_bytes: Vec<u8>,
    /// Every buffer command written, in order
    pub commands: Vec<BufferCommand>,
    fail_after: Option<usize>,
}

impl MockRegisters {
    /// Quiet device: no peer frame, idle buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            receive_seconds: BASE_SECONDS,
            transmit_seconds: BTreeMap::new(),
            decoders: BTreeMap::new(),
            buffer_status: 0,
            buffer_size: 0,
            buffer_bytes: vec![0; BUFFER_CAPACITY],
            commands: Vec::new(),
            fail_after: None,
        }
    }

    /// Make the snapshot show `frame` from the peer
    pub fn set_peer_frame(&mut self, frame: HandshakeFrame) {
        self.receive_seconds = BASE_SECONDS + frame.seconds_offset();
    }

    /// Make the snapshot show a peer with no handshake data
    pub fn clear_peer_frame(&mut self) {
        self.receive_seconds = BASE_SECONDS;
    }

    /// Frame currently carried by `encoder`, if its data flag is set
    #[must_use]
    pub fn transmitted(&self, encoder: u8) -> Option<HandshakeFrame> {
        let frame = HandshakeFrame::from_seconds(self.seconds(encoder));
        frame.data_flag.then_some(frame)
    }

    /// Raw seconds of the counter driven by `encoder`
    #[must_use]
    pub fn seconds(&self, encoder: u8) -> u64 {
        self.transmit_seconds
            .get(&encoder)
            .copied()
            .unwrap_or(BASE_SECONDS)
    }

    /// Decoders currently enabled
    #[must_use]
    pub fn enabled_decoders(&self) -> Vec<u8> {
        self.decoders
            .iter()
            .filter_map(|(decoder, enabled)| enabled.then_some(*decoder))
            .collect()
    }

    /// Let `accesses` more register calls succeed, then fail every call
    /// until [`MockRegisters::heal`].
    pub fn fail_after(&mut self, accesses: usize) {
        self.fail_after = Some(accesses);
    }

    /// Stop injecting failures
    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    fn access(&mut self, what: &str) -> Result<(), DpofError> {
        match self.fail_after {
            Some(0) => Err(DpofError::register(format!("injected failure on {what}"))),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for MockRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRegisters for MockRegisters {
    fn set_decoder_enabled(&mut self, decoder: u8, enabled: bool) -> Result<(), DpofError> {
        self.access("decoder enable")?;
        self.decoders.insert(decoder, enabled);
        Ok(())
    }

    fn read_receive_seconds(&mut self) -> Result<u64, DpofError> {
        self.access("receive snapshot")?;
        Ok(self.receive_seconds)
    }

    fn jump_transmit_seconds(
        &mut self,
        encoder: u8,
        delta: u64,
        direction: JumpDirection,
    ) -> Result<(), DpofError> {
        self.access("transmit jump")?;
        let current = self.seconds(encoder);
        let next = match direction {
            JumpDirection::Forward => current.wrapping_add(delta),
            JumpDirection::Backward => current.wrapping_sub(delta),
        };
        self.transmit_seconds.insert(encoder, next);
        Ok(())
    }

    fn read_transmit_seconds(&mut self, tod: u8) -> Result<u64, DpofError> {
        self.access("transmit readback")?;
        Ok(self.seconds(tod))
    }

    fn read_buffer_status(&mut self) -> Result<u8, DpofError> {
        self.access("buffer status")?;
        Ok(self.buffer_status)
    }

    fn write_buffer_command(&mut self, command: BufferCommand) -> Result<(), DpofError> {
        self.access("buffer command")?;
        self.commands.push(command);
        Ok(())
    }

    fn read_buffer_size(&mut self) -> Result<usize, DpofError> {
        self.access("buffer size read")?;
        Ok(self.buffer_size)
    }

    fn write_buffer_size(&mut self, size: usize) -> Result<(), DpofError> {
        self.access("buffer size write")?;
        self.buffer_size = size;
        Ok(())
    }

    fn read_buffer_bytes(&mut self, len: usize) -> Result<Vec<u8>, DpofError> {
        self.access("buffer read")?;
        Ok(self.buffer_bytes[..len.min(BUFFER_CAPACITY)].to_vec())
    }

    fn write_buffer_bytes(&mut self, data: &[u8]) -> Result<(), DpofError> {
        self.access("buffer write")?;
        if data.len() > BUFFER_CAPACITY {
            return Err(DpofError::PayloadTooLarge {
                len: data.len(),
                capacity: BUFFER_CAPACITY,
            });
        }
        self.buffer_bytes[..data.len()].copy_from_slice(data);
        Ok(())
    }
}
