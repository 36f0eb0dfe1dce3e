//! Transfer-buffer command/status vocabulary.

/// Bytes the transfer buffer holds.
pub const BUFFER_CAPACITY: usize = 128;

/// Status read back from the command/status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferStatus {
    /// 0x0: idle, or armed for reception
    Idle,
    /// 0x1: transmit requested, waiting for the peer
    TxArmed,
    /// 0x2: start command written, transmission in flight
    TxStarted,
    /// 0x3: peer acknowledged, bytes may be loaded
    TxAckReady,
    /// 0x5: transmission complete
    TxComplete,
    /// 0xb: reception complete, size and bytes are valid
    RxComplete,
    /// Anything else
    Error(u8),
}

impl BufferStatus {
    /// Decode a raw status register value
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x0 => Self::Idle,
            0x1 => Self::TxArmed,
            0x2 => Self::TxStarted,
            0x3 => Self::TxAckReady,
            0x5 => Self::TxComplete,
            0xb => Self::RxComplete,
            other => Self::Error(other),
        }
    }

    /// Raw register value
    #[must_use]
    pub fn raw(self) -> u8 {
        match self {
            Self::Idle => 0x0,
            Self::TxArmed => 0x1,
            Self::TxStarted => 0x2,
            Self::TxAckReady => 0x3,
            Self::TxComplete => 0x5,
            Self::RxComplete => 0xb,
            Self::Error(raw) => raw,
        }
    }

    /// Code outside the vocabulary
    #[must_use]
    pub fn is_anomaly(self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Commands written to the command/status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferCommand {
    /// Reset to idle, which also arms the buffer for reception
    ArmReceive,
    /// Request transmission of `size` bytes
    ArmTransmit,
    /// Bytes are loaded, start sending
    StartTransmit,
}

impl BufferCommand {
    /// Raw register value
    #[must_use]
    pub fn raw(self) -> u8 {
        match self {
            Self::ArmReceive => 0x0,
            Self::ArmTransmit => 0x1,
            Self::StartTransmit => 0x2,
        }
    }

    /// Decode a raw command, if it is one
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x0 => Some(Self::ArmReceive),
            0x1 => Some(Self::ArmTransmit),
            0x2 => Some(Self::StartTransmit),
            _ => None,
        }
    }
}
