//! Handshake frame codec.

use crate::types::TransactionId;

/// Bit position of the handshake bytes inside the seconds field.
pub const HANDSHAKE_SHIFT: u32 = 32;

const DATA_FLAG: u8 = 0x80;
const STATE_SHIFT: u8 = 5;
const STATE_MASK: u8 = 0x3;

/// Handshake phase announced by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Request with a tie-break nonce
    Init,
    /// Ready for the bulk exchange
    Accept,
    /// Bulk exchange finished; nonce carries the sender's buffer status
    End,
    /// Value 3, never sent by this implementation
    Reserved,
}

impl HandshakeState {
    /// Decode from the two state bits
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & STATE_MASK {
            0 => Self::Init,
            1 => Self::Accept,
            2 => Self::End,
            _ => Self::Reserved,
        }
    }

    /// Encode to the two state bits
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Accept => 1,
            Self::End => 2,
            Self::Reserved => 3,
        }
    }
}

/// Negotiation unit carried in the top two bytes of the timestamp seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandshakeFrame {
    /// Set while the field is aliased for negotiation
    pub data_flag: bool,
    /// Handshake phase
    pub state: HandshakeState,
    /// Requested operation
    pub transaction_id: TransactionId,
    /// Tie-break value, or status byte on `End`
    pub nonce: u8,
}

impl HandshakeFrame {
    /// A negotiation frame (data flag set).
    #[must_use]
    pub fn new(state: HandshakeState, transaction_id: TransactionId, nonce: u8) -> Self {
        Self {
            data_flag: true,
            state,
            transaction_id,
            nonce,
        }
    }

    /// Pack into `[byte5, byte4]` as a big-endian `u16`.
    #[must_use]
    pub fn encode(&self) -> u16 {
        let mut top = (self.state.bits() << STATE_SHIFT) | self.transaction_id.value();
        if self.data_flag {
            top |= DATA_FLAG;
        }
        u16::from_be_bytes([top, self.nonce])
    }

    /// Unpack from `[byte5, byte4]`. Every bit pattern decodes.
    #[must_use]
    pub fn decode(raw: u16) -> Self {
        let [top, nonce] = raw.to_be_bytes();
        Self {
            data_flag: top & DATA_FLAG != 0,
            state: HandshakeState::from_bits(top >> STATE_SHIFT),
            transaction_id: TransactionId::from_bits(top),
            nonce,
        }
    }

    /// Offset to add to the seconds field to transmit this frame.
    #[must_use]
    pub fn seconds_offset(&self) -> u64 {
        u64::from(self.encode()) << HANDSHAKE_SHIFT
    }

    /// Extract the raw handshake bytes from a 48-bit seconds value.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Masked to 16 bits before the cast"
    )]
    pub fn raw_from_seconds(seconds: u64) -> u16 {
        ((seconds >> HANDSHAKE_SHIFT) & 0xffff) as u16
    }

    /// Decode the frame carried by a seconds value.
    #[must_use]
    pub fn from_seconds(seconds: u64) -> Self {
        Self::decode(Self::raw_from_seconds(seconds))
    }
}
