//! Two devices wired back to back over simulated fiber.
//!
//! By default propagation is instant: a jump on one side's encoder is
//! visible on the next snapshot read by the other side's connected decoder.
//! With [`SimLink::hold_delivery`] the snapshots only move on
//! [`SimLink::deliver`], which models frames that cross the fiber once per
//! second while both ends keep polling. The receive snapshot only latches
//! new data while some decoder is enabled, so a freshly enabled decoder
//! first sees whatever was latched before.
//!
//! Transfer buffer model:
//!
//! | Command / event                | Effect                                      |
//! |--------------------------------|---------------------------------------------|
//! | `ArmReceive`                   | armed for rx, status `0x00`                 |
//! | `ArmTransmit`                  | status `0x01`                               |
//! | status read while peer armed   | `0x01` becomes `0x03` (ack ready)           |
//! | `StartTransmit` after ack      | bytes copied, peer `0x0b`, own `0x05`       |
//! | `StartTransmit` without ack    | status `0x02`, nothing moves                |

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::DpofError;
use crate::protocol::buffer::{BUFFER_CAPACITY, BufferCommand, BufferStatus};
use crate::protocol::handshake::HandshakeFrame;
use crate::transport::{JumpDirection, LinkRegisters};
use crate::types::DpofConfig;

use super::mock_registers::BASE_SECONDS;

/// One end of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// First device
    A,
    /// Second device
    B,
}

impl Side {
    /// The other end
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

#[derive(Debug, Clone)]
struct SimBuffer {
    status: u8,
    size: usize,
    bytes: Vec<u8>,
    rx_armed: bool,
}

#[derive(Debug, Clone)]
struct SimDevice {
    counters: BTreeMap<u8, u64>,
    enabled: BTreeSet<u8>,
    max_enabled: usize,
    latched: u64,
    buffer: SimBuffer,
    failures: usize,
}

impl SimDevice {
    fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
            enabled: BTreeSet::new(),
            max_enabled: 0,
            latched: BASE_SECONDS,
            buffer: SimBuffer {
                status: BufferStatus::Idle.raw(),
                size: 0,
                bytes: vec![0; BUFFER_CAPACITY],
                rx_armed: false,
            },
            failures: 0,
        }
    }

    fn counter(&self, tod: u8) -> u64 {
        self.counters.get(&tod).copied().unwrap_or(BASE_SECONDS)
    }
}

#[derive(Debug)]
struct SimState {
    devices: [SimDevice; 2],
    /// Local decoder -> the peer encoder it listens to
    decoder_source: BTreeMap<u8, u8>,
    /// Encoder -> TOD counter it modifies
    encoder_tod: BTreeMap<u8, u8>,
    /// Snapshots only update on an explicit delivery
    held: bool,
}

impl SimState {
    fn check_fault(&mut self, side: Side, what: &str) -> Result<(), DpofError> {
        let device = &mut self.devices[side.index()];
        if device.failures > 0 {
            device.failures -= 1;
            return Err(DpofError::register(format!("simulated fault on {what}")));
        }
        Ok(())
    }

    fn tod_for(&self, encoder: u8) -> u8 {
        self.encoder_tod.get(&encoder).copied().unwrap_or(encoder)
    }

    /// Copy the peer counter heard by `side`'s enabled decoder into its
    /// snapshot. Nothing moves while no decoder is enabled.
    fn latch(&mut self, side: Side) {
        let source = self.devices[side.index()]
            .enabled
            .iter()
            .next()
            .and_then(|decoder| self.decoder_source.get(decoder).copied());
        if let Some(encoder) = source {
            let tod = self.tod_for(encoder);
            let live = self.devices[side.peer().index()].counter(tod);
            self.devices[side.index()].latched = live;
        }
    }
}

/// Handle over both simulated devices
#[derive(Debug, Clone)]
pub struct SimLink {
    shared: Rc<RefCell<SimState>>,
}

impl SimLink {
    /// Wire two devices that both use `config`: each channel's decoder
    /// hears the peer's encoder of the same channel.
    #[must_use]
    pub fn new(config: &DpofConfig) -> Self {
        let decoder_source = config
            .channels
            .iter()
            .map(|channel| (channel.decoder, channel.encoder))
            .collect();
        let encoder_tod = config
            .channels
            .iter()
            .map(|channel| (channel.encoder, channel.tod))
            .collect();
        Self {
            shared: Rc::new(RefCell::new(SimState {
                devices: [SimDevice::new(), SimDevice::new()],
                decoder_source,
                encoder_tod,
                held: false,
            })),
        }
    }

    /// Register interface of one side
    #[must_use]
    pub fn board(&self, side: Side) -> SimBoard {
        SimBoard {
            shared: Rc::clone(&self.shared),
            side,
        }
    }

    /// Decoders currently enabled on `side`
    #[must_use]
    pub fn enabled_decoders(&self, side: Side) -> Vec<u8> {
        self.shared.borrow().devices[side.index()]
            .enabled
            .iter()
            .copied()
            .collect()
    }

    /// Most decoders ever enabled at once on `side`
    #[must_use]
    pub fn max_enabled_decoders(&self, side: Side) -> usize {
        self.shared.borrow().devices[side.index()].max_enabled
    }

    /// Frame carried by `encoder` on `side`, if its data flag is set
    #[must_use]
    pub fn transmitted(&self, side: Side, encoder: u8) -> Option<HandshakeFrame> {
        let frame = HandshakeFrame::from_seconds(self.transmit_seconds(side, encoder));
        frame.data_flag.then_some(frame)
    }

    /// Raw seconds of the counter driven by `encoder` on `side`
    #[must_use]
    pub fn transmit_seconds(&self, side: Side, encoder: u8) -> u64 {
        let state = self.shared.borrow();
        let tod = state.tod_for(encoder);
        state.devices[side.index()].counter(tod)
    }

    /// Raw transfer-buffer status on `side`
    #[must_use]
    pub fn buffer_status(&self, side: Side) -> u8 {
        self.shared.borrow().devices[side.index()].buffer.status
    }

    /// Stop (or resume) instant propagation. While held, each side keeps
    /// reading its last snapshot until [`SimLink::deliver`].
    pub fn hold_delivery(&self, held: bool) {
        self.shared.borrow_mut().held = held;
    }

    /// Update both sides' snapshots at once
    pub fn deliver(&self) {
        let mut state = self.shared.borrow_mut();
        state.latch(Side::A);
        state.latch(Side::B);
    }

    /// Fail the next `count` register accesses on `side`
    pub fn inject_faults(&self, side: Side, count: usize) {
        self.shared.borrow_mut().devices[side.index()].failures = count;
    }
}

/// [`LinkRegisters`] for one side of a [`SimLink`]
#[derive(Debug, Clone)]
pub struct SimBoard {
    shared: Rc<RefCell<SimState>>,
    side: Side,
}

impl SimBoard {
    /// Which end this board is
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }
}

impl LinkRegisters for SimBoard {
    fn set_decoder_enabled(&mut self, decoder: u8, enabled: bool) -> Result<(), DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "decoder enable")?;
        let device = &mut state.devices[self.side.index()];
        if enabled {
            device.enabled.insert(decoder);
            device.max_enabled = device.max_enabled.max(device.enabled.len());
        } else {
            device.enabled.remove(&decoder);
        }
        Ok(())
    }

    fn read_receive_seconds(&mut self) -> Result<u64, DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "receive snapshot")?;
        if !state.held {
            state.latch(self.side);
        }
        Ok(state.devices[self.side.index()].latched)
    }

    fn jump_transmit_seconds(
        &mut self,
        encoder: u8,
        delta: u64,
        direction: JumpDirection,
    ) -> Result<(), DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "transmit jump")?;
        let tod = state.tod_for(encoder);
        let device = &mut state.devices[self.side.index()];
        let current = device.counter(tod);
        let next = match direction {
            JumpDirection::Forward => current.wrapping_add(delta),
            JumpDirection::Backward => current.wrapping_sub(delta),
        };
        device.counters.insert(tod, next);
        Ok(())
    }

    fn read_transmit_seconds(&mut self, tod: u8) -> Result<u64, DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "transmit readback")?;
        Ok(state.devices[self.side.index()].counter(tod))
    }

    fn read_buffer_status(&mut self) -> Result<u8, DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer status")?;
        let peer_armed = state.devices[self.side.peer().index()].buffer.rx_armed;
        let buffer = &mut state.devices[self.side.index()].buffer;
        if buffer.status == BufferStatus::TxArmed.raw() && peer_armed {
            buffer.status = BufferStatus::TxAckReady.raw();
        }
        Ok(buffer.status)
    }

    fn write_buffer_command(&mut self, command: BufferCommand) -> Result<(), DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer command")?;
        let (local, peer) = (self.side.index(), self.side.peer().index());

        match command {
            BufferCommand::ArmReceive => {
                let buffer = &mut state.devices[local].buffer;
                buffer.rx_armed = true;
                buffer.status = BufferStatus::Idle.raw();
            }
            BufferCommand::ArmTransmit => {
                state.devices[local].buffer.status = BufferStatus::TxArmed.raw();
            }
            BufferCommand::StartTransmit => {
                let ready = state.devices[local].buffer.status == BufferStatus::TxAckReady.raw()
                    && state.devices[peer].buffer.rx_armed;
                if !ready {
                    state.devices[local].buffer.status = BufferStatus::TxStarted.raw();
                    return Ok(());
                }

                let size = state.devices[local].buffer.size.min(BUFFER_CAPACITY);
                let data = state.devices[local].buffer.bytes[..size].to_vec();
                let remote = &mut state.devices[peer].buffer;
                remote.bytes[..size].copy_from_slice(&data);
                remote.size = size;
                remote.status = BufferStatus::RxComplete.raw();
                remote.rx_armed = false;
                state.devices[local].buffer.status = BufferStatus::TxComplete.raw();
            }
        }
        Ok(())
    }

    fn read_buffer_size(&mut self) -> Result<usize, DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer size read")?;
        Ok(state.devices[self.side.index()].buffer.size)
    }

    fn write_buffer_size(&mut self, size: usize) -> Result<(), DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer size write")?;
        state.devices[self.side.index()].buffer.size = size;
        Ok(())
    }

    fn read_buffer_bytes(&mut self, len: usize) -> Result<Vec<u8>, DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer read")?;
        let buffer = &state.devices[self.side.index()].buffer;
        Ok(buffer.bytes[..len.min(BUFFER_CAPACITY)].to_vec())
    }

    fn write_buffer_bytes(&mut self, data: &[u8]) -> Result<(), DpofError> {
        let mut state = self.shared.borrow_mut();
        state.check_fault(self.side, "buffer write")?;
        if data.len() > BUFFER_CAPACITY {
            return Err(DpofError::PayloadTooLarge {
                len: data.len(),
                capacity: BUFFER_CAPACITY,
            });
        }
        state.devices[self.side.index()].buffer.bytes[..data.len()].copy_from_slice(data);
        Ok(())
    }
}
