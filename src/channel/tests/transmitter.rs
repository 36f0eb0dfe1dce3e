use crate::testing::mock_registers::BASE_SECONDS;

use super::*;

#[test]
fn test_send_sets_only_handshake_bytes() {
    let mut regs = MockRegisters::new();
    let mut tx = Transmitter::new(0, 0);
    let frame = HandshakeFrame::new(HandshakeState::Init, id(1), 0x42);

    tx.send(&mut regs, frame).unwrap();

    assert_eq!(regs.seconds(0), BASE_SECONDS | 0x8142_0000_0000);
    assert_eq!(tx.nonce(), Some(0x42));
}

#[test]
fn test_send_replaces_previous_frame() {
    let mut regs = MockRegisters::new();
    let mut tx = Transmitter::new(0, 0);

    tx.send(&mut regs, HandshakeFrame::new(HandshakeState::Init, id(1), 0xff))
        .unwrap();
    let accept = HandshakeFrame::new(HandshakeState::Accept, id(1), 0x01);
    tx.send(&mut regs, accept).unwrap();

    assert_eq!(regs.transmitted(0), Some(accept));
    assert_eq!(regs.seconds(0) & 0xffff_ffff, BASE_SECONDS & 0xffff_ffff);
}

#[test]
fn test_stop_clears_by_readback() {
    let mut regs = MockRegisters::new();
    let mut tx = Transmitter::new(0, 0);
    tx.send(&mut regs, HandshakeFrame::new(HandshakeState::End, id(0), 5))
        .unwrap();

    tx.stop(&mut regs).unwrap();

    assert_eq!(regs.seconds(0), BASE_SECONDS);
    assert_eq!(tx.current(), None);
}

#[test]
fn test_stop_when_idle_touches_nothing() {
    let mut regs = MockRegisters::new();
    let mut tx = Transmitter::new(0, 0);
    regs.fail_after(0);

    assert!(tx.stop(&mut regs).is_ok());
}

#[test]
fn test_failed_send_keeps_previous_frame() {
    let mut regs = MockRegisters::new();
    let mut tx = Transmitter::new(0, 0);
    let init = HandshakeFrame::new(HandshakeState::Init, id(1), 7);
    tx.send(&mut regs, init).unwrap();

    regs.fail_after(0);
    assert!(
        tx.send(&mut regs, HandshakeFrame::new(HandshakeState::Accept, id(1), 8))
            .is_err()
    );
    assert_eq!(tx.current(), Some(init));
}
