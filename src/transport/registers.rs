//! Register-level access to one device.

use crate::error::DpofError;
use crate::protocol::buffer::BufferCommand;

/// Direction of a relative time-of-day jump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDirection {
    /// Add the delta to the seconds field
    Forward,
    /// Subtract the delta from the seconds field
    Backward,
}

/// Physical register interface of one device.
///
/// There is a single receive snapshot shared by all decoders and a single
/// transfer buffer; the arbiter guarantees only one channel touches each
/// at a time.
pub trait LinkRegisters {
    /// Enable or disable a decoder (receive path).
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    fn set_decoder_enabled(&mut self, decoder: u8, enabled: bool) -> Result<(), DpofError>;

    /// Read the 48-bit seconds field of the shared receive snapshot.
    ///
    /// # Errors
    /// Returns an error if the register read fails.
    fn read_receive_seconds(&mut self) -> Result<u64, DpofError>;

    /// Apply a relative jump to an encoder's transmitted seconds.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    fn jump_transmit_seconds(
        &mut self,
        encoder: u8,
        delta: u64,
        direction: JumpDirection,
    ) -> Result<(), DpofError>;

    /// Read back the 48-bit seconds currently held by a TOD counter.
    ///
    /// # Errors
    /// Returns an error if the register read fails.
    fn read_transmit_seconds(&mut self, tod: u8) -> Result<u64, DpofError>;

    /// Read the raw transfer-buffer status register.
    ///
    /// # Errors
    /// Returns an error if the register read fails.
    fn read_buffer_status(&mut self) -> Result<u8, DpofError>;

    /// Write a command to the transfer-buffer command register.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    fn write_buffer_command(&mut self, command: BufferCommand) -> Result<(), DpofError>;

    /// Read the declared payload size.
    ///
    /// # Errors
    /// Returns an error if the register read fails.
    fn read_buffer_size(&mut self) -> Result<usize, DpofError>;

    /// Declare the payload size before arming for transmit.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    fn write_buffer_size(&mut self, size: usize) -> Result<(), DpofError>;

    /// Read `len` payload bytes from the start of the buffer.
    ///
    /// # Errors
    /// Returns an error if the register read fails.
    fn read_buffer_bytes(&mut self, len: usize) -> Result<Vec<u8>, DpofError>;

    /// Load payload bytes at the start of the buffer.
    ///
    /// # Errors
    /// Returns an error if the register write fails.
    fn write_buffer_bytes(&mut self, data: &[u8]) -> Result<(), DpofError>;
}

impl<T: LinkRegisters + ?Sized> LinkRegisters for Box<T> {
    fn set_decoder_enabled(&mut self, decoder: u8, enabled: bool) -> Result<(), DpofError> {
        (**self).set_decoder_enabled(decoder, enabled)
    }

    fn read_receive_seconds(&mut self) -> Result<u64, DpofError> {
        (**self).read_receive_seconds()
    }

    fn jump_transmit_seconds(
        &mut self,
        encoder: u8,
        delta: u64,
        direction: JumpDirection,
    ) -> Result<(), DpofError> {
        (**self).jump_transmit_seconds(encoder, delta, direction)
    }

    fn read_transmit_seconds(&mut self, tod: u8) -> Result<u64, DpofError> {
        (**self).read_transmit_seconds(tod)
    }

    fn read_buffer_status(&mut self) -> Result<u8, DpofError> {
        (**self).read_buffer_status()
    }

    fn write_buffer_command(&mut self, command: BufferCommand) -> Result<(), DpofError> {
        (**self).write_buffer_command(command)
    }

    fn read_buffer_size(&mut self) -> Result<usize, DpofError> {
        (**self).read_buffer_size()
    }

    fn write_buffer_size(&mut self, size: usize) -> Result<(), DpofError> {
        (**self).write_buffer_size(size)
    }

    fn read_buffer_bytes(&mut self, len: usize) -> Result<Vec<u8>, DpofError> {
        (**self).read_buffer_bytes(len)
    }

    fn write_buffer_bytes(&mut self, data: &[u8]) -> Result<(), DpofError> {
        (**self).write_buffer_bytes(data)
    }
}
