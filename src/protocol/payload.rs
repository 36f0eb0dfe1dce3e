//! Application payload schemas carried over the transfer buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::DpofError;

/// Encoded length of a [`QueryResponse`].
pub const QUERY_RESPONSE_LEN: usize = 83;

/// Byte 1 of a [`WriteRequest`] must hold this to request force-follow.
pub const FORCE_FOLLOW_SENTINEL: u8 = 0xa5;

const NAME_LEN: usize = 16;

/// Chip status block returned for transaction 0.
///
/// Layout (83 bytes):
///
/// | Offset | Size | Field                                  |
/// |--------|------|----------------------------------------|
/// | 0      | 16   | per-input monitor status               |
/// | 16     | 4    | per-DPLL status                        |
/// | 20     | 32   | per-input frequency monitor status     |
/// | 52     | 16   | NUL-padded name                        |
/// | 68     | 11   | TOD delta for round-trip calculations  |
/// | 79     | 4    | reserved, zero                         |
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResponse {
    /// Input monitor status, inputs 0-15
    pub input_status: [u8; 16],
    /// DPLL status, DPLLs 0-3
    pub dpll_status: [u8; 4],
    /// Frequency monitor status, two bytes per input
    pub freq_monitor: [u8; 32],
    /// Board name, at most 15 bytes on the wire
    pub name: String,
    /// Delta between the received TOD frame and the local TOD counter
    pub tod_delta: [u8; 11],
}

impl QueryResponse {
    /// Encode to the fixed 83-byte layout.
    ///
    /// Names longer than 15 bytes are cut at a character boundary so the
    /// field always ends with a NUL.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(QUERY_RESPONSE_LEN);
        buf.put_slice(&self.input_status);
        buf.put_slice(&self.dpll_status);
        buf.put_slice(&self.freq_monitor);

        let mut end = self.name.len().min(NAME_LEN - 1);
        while !self.name.is_char_boundary(end) {
            end -= 1;
        }
        let mut name = [0u8; NAME_LEN];
        name[..end].copy_from_slice(&self.name.as_bytes()[..end]);
        buf.put_slice(&name);

        buf.put_slice(&self.tod_delta);
        buf.put_bytes(0, QUERY_RESPONSE_LEN - buf.len());
        buf.freeze()
    }

    /// Decode from the fixed layout. Trailing bytes are ignored.
    ///
    /// # Errors
    /// Returns [`DpofError::CodecError`] if fewer than 83 bytes are given.
    pub fn decode(data: &[u8]) -> Result<Self, DpofError> {
        if data.len() < QUERY_RESPONSE_LEN {
            return Err(DpofError::CodecError {
                message: format!(
                    "query response needs {QUERY_RESPONSE_LEN} bytes, got {}",
                    data.len()
                ),
            });
        }

        let mut response = Self::default();
        response.input_status.copy_from_slice(&data[0..16]);
        response.dpll_status.copy_from_slice(&data[16..20]);
        response.freq_monitor.copy_from_slice(&data[20..52]);

        let name = &data[52..68];
        let end = name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        response.name = String::from_utf8_lossy(&name[..end]).into_owned();

        response.tod_delta.copy_from_slice(&data[68..79]);
        Ok(response)
    }
}

/// Output / follow request sent with transaction 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteRequest {
    /// One bit per output indicator
    pub output_mask: u8,
    /// Ask the peer to follow this requester's frequency, TOD and PPS
    pub force_follow: bool,
}

impl WriteRequest {
    /// Encode to two bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let follow = if self.force_follow {
            FORCE_FOLLOW_SENTINEL
        } else {
            0
        };
        Bytes::copy_from_slice(&[self.output_mask, follow])
    }

    /// Decode a write payload.
    ///
    /// Force-follow is only honored when byte 1 equals the sentinel; a
    /// missing byte 1 means no follow request.
    ///
    /// # Errors
    /// Returns [`DpofError::CodecError`] on an empty payload.
    pub fn decode(data: &[u8]) -> Result<Self, DpofError> {
        let Some(&output_mask) = data.first() else {
            return Err(DpofError::CodecError {
                message: "write request is empty".to_string(),
            });
        };
        Ok(Self {
            output_mask,
            force_follow: data.get(1) == Some(&FORCE_FOLLOW_SENTINEL),
        })
    }
}
