
use super::*;
use crate::testing::{ManualClock, ScriptedNonces, SimBoard, SimLink, Side};
use crate::transport::StaticStatus;

/// Two arbiters on opposite ends of a simulated link, sharing one clock
struct Pair {
    link: SimLink,
    clock: ManualClock,
    a: Arbiter<SimBoard>,
    b: Arbiter<SimBoard>,
}

impl Pair {
    fn new(config: &DpofConfig, nonces_a: &[u8], nonces_b: &[u8]) -> Self {
        let link = SimLink::new(config);
        let clock = ManualClock::new();
        let a = Arbiter::builder(link.board(Side::A), config.clone())
            .clock(clock.clone())
            .nonces(ScriptedNonces::new(nonces_a.to_vec()))
            .status(StaticStatus::default())
            .build()
            .unwrap();
        let b = Arbiter::builder(link.board(Side::B), config.clone())
            .clock(clock.clone())
            .nonces(ScriptedNonces::new(nonces_b.to_vec()))
            .status(StaticStatus::default())
            .build()
            .unwrap();
        Self { link, clock, a, b }
    }

    fn side(&mut self, side: Side) -> &mut Arbiter<SimBoard> {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}
