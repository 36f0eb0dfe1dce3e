mod transmitter;

use std::collections::VecDeque;

use super::*;
use crate::protocol::payload::QueryResponse;
use crate::testing::{ManualClock, MockRegisters, ScriptedNonces};
use crate::transport::{Clock, StaticStatus};
use crate::types::ChannelConfig;

/// One channel over mock registers, receive path already enabled
struct Harness {
    channel: Channel,
    regs: MockRegisters,
    clock: ManualClock,
    nonces: ScriptedNonces,
    status: StaticStatus,
    events: VecDeque<LinkEvent>,
    granted: bool,
}

impl Harness {
    fn new() -> Self {
        Self::with_policy(TimeSlicePolicy::Unconditional)
    }

    fn with_policy(policy: TimeSlicePolicy) -> Self {
        let clock = ManualClock::new();
        let mut regs = MockRegisters::new();
        let mut channel = Channel::new(0, ChannelConfig::new(0, 0, 0), policy);
        channel.start_receive(&mut regs, clock.now()).unwrap();

        Self {
            channel,
            regs,
            clock,
            nonces: ScriptedNonces::new([0x40, 0x41, 0x42, 0x43]),
            status: StaticStatus::new(QueryResponse {
                name: "dpll-a".to_string(),
                ..QueryResponse::default()
            }),
            events: VecDeque::new(),
            granted: false,
        }
    }

    fn try_step(&mut self) -> Result<StepReport, DpofError> {
        let mut ctx = StepContext {
            now: self.clock.now(),
            buffer_granted: self.granted,
            nonces: &mut self.nonces,
            status: &mut self.status,
            events: &mut self.events,
        };
        self.channel.step(&mut self.regs, &mut ctx)
    }

    fn step(&mut self) -> StepReport {
        self.try_step().unwrap()
    }

    fn begin(&mut self, id: u8, payload: &'static [u8], nonce: u8) -> bool {
        let id = TransactionId::new(id).unwrap();
        self.channel
            .begin(&mut self.regs, id, Bytes::from_static(payload), nonce)
            .unwrap()
    }

    fn peer(&mut self, state: HandshakeState, id: u8, nonce: u8) {
        let frame = HandshakeFrame::new(state, TransactionId::new(id).unwrap(), nonce);
        self.regs.set_peer_frame(frame);
    }

    fn sent(&self) -> Option<HandshakeFrame> {
        self.regs.transmitted(0)
    }

    fn state(&self) -> &ChannelState {
        self.channel.state()
    }
}

fn id(value: u8) -> TransactionId {
    TransactionId::new(value).unwrap()
}
