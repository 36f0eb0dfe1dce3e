use std::time::Duration;

use super::*;
use crate::protocol::buffer::BufferCommand;
use crate::protocol::handshake::{HandshakeFrame, HandshakeState};
use crate::transport::{JumpDirection, LinkRegisters};
use crate::types::{DpofConfig, TransactionId};

#[test]
fn test_manual_clock_shared_between_clones() {
    let clock = ManualClock::new();
    let other = clock.clone();
    let start = clock.now();

    other.advance(Duration::from_secs(3));

    assert_eq!(clock.now() - start, Duration::from_secs(3));
    assert_eq!(clock.elapsed(), Duration::from_secs(3));
}

#[test]
fn test_scripted_nonces_cycle() {
    let mut nonces = ScriptedNonces::new([1, 2]);
    assert_eq!(nonces.next_nonce(), 1);
    assert_eq!(nonces.next_nonce(), 2);
    assert_eq!(nonces.next_nonce(), 1);
    assert_eq!(nonces.drawn(), 3);

    assert_eq!(ScriptedNonces::new(Vec::new()).next_nonce(), 0);
}

#[test]
fn test_mock_registers_fail_after() {
    let mut regs = MockRegisters::new();
    regs.fail_after(1);

    assert!(regs.read_buffer_status().is_ok());
    // Register failures are retried by the arbiter, not surfaced
    assert!(regs.read_buffer_status().unwrap_err().is_transient());
    assert!(regs.read_buffer_status().is_err());

    regs.heal();
    assert!(regs.read_buffer_status().is_ok());
}

#[test]
fn test_mock_registers_transmit_jumps() {
    let mut regs = MockRegisters::new();
    let frame = HandshakeFrame::new(HandshakeState::Init, TransactionId::WRITE_COMMAND, 9);

    regs.jump_transmit_seconds(2, frame.seconds_offset(), JumpDirection::Forward)
        .unwrap();
    assert_eq!(regs.transmitted(2), Some(frame));
    assert_eq!(regs.transmitted(0), None);

    regs.jump_transmit_seconds(2, frame.seconds_offset(), JumpDirection::Backward)
        .unwrap();
    assert_eq!(regs.seconds(2), mock_registers::BASE_SECONDS);
}

#[test]
fn test_sim_frames_cross_the_link() {
    let link = SimLink::new(&DpofConfig::default());
    let mut a = link.board(Side::A);
    let mut b = link.board(Side::B);
    let frame = HandshakeFrame::new(HandshakeState::Init, TransactionId::QUERY_STATUS, 0x42);

    a.jump_transmit_seconds(0, frame.seconds_offset(), JumpDirection::Forward)
        .unwrap();

    // Nothing latches while the decoder is off
    assert_eq!(
        HandshakeFrame::raw_from_seconds(b.read_receive_seconds().unwrap()),
        0
    );

    b.set_decoder_enabled(0, true).unwrap();
    let seen = HandshakeFrame::from_seconds(b.read_receive_seconds().unwrap());
    assert_eq!(seen, frame);

    // Disabled again: the snapshot stays frozen
    b.set_decoder_enabled(0, false).unwrap();
    a.jump_transmit_seconds(0, frame.seconds_offset(), JumpDirection::Backward)
        .unwrap();
    assert_eq!(
        HandshakeFrame::from_seconds(b.read_receive_seconds().unwrap()),
        frame
    );
}

#[test]
fn test_sim_held_delivery() {
    let link = SimLink::new(&DpofConfig::default());
    let mut a = link.board(Side::A);
    let mut b = link.board(Side::B);
    a.set_decoder_enabled(0, true).unwrap();
    b.set_decoder_enabled(0, true).unwrap();
    link.hold_delivery(true);

    let from_a = HandshakeFrame::new(HandshakeState::Init, TransactionId::WRITE_COMMAND, 0x42);
    let from_b = HandshakeFrame::new(HandshakeState::Init, TransactionId::WRITE_COMMAND, 0x24);
    a.jump_transmit_seconds(0, from_a.seconds_offset(), JumpDirection::Forward)
        .unwrap();
    b.jump_transmit_seconds(0, from_b.seconds_offset(), JumpDirection::Forward)
        .unwrap();

    // Neither side has heard anything yet
    assert_eq!(
        HandshakeFrame::raw_from_seconds(a.read_receive_seconds().unwrap()),
        0
    );
    assert_eq!(
        HandshakeFrame::raw_from_seconds(b.read_receive_seconds().unwrap()),
        0
    );

    link.deliver();
    assert_eq!(
        HandshakeFrame::from_seconds(a.read_receive_seconds().unwrap()),
        from_b
    );
    assert_eq!(
        HandshakeFrame::from_seconds(b.read_receive_seconds().unwrap()),
        from_a
    );

    // Later changes wait for the next delivery
    a.jump_transmit_seconds(0, from_a.seconds_offset(), JumpDirection::Backward)
        .unwrap();
    assert_eq!(
        HandshakeFrame::from_seconds(b.read_receive_seconds().unwrap()),
        from_a
    );

    link.hold_delivery(false);
    assert!(!HandshakeFrame::from_seconds(b.read_receive_seconds().unwrap()).data_flag);
}

#[test]
fn test_sim_counts_enabled_decoders() {
    let config = DpofConfig::builder().standard_channels(2).build().unwrap();
    let link = SimLink::new(&config);
    let mut a = link.board(Side::A);

    a.set_decoder_enabled(0, true).unwrap();
    a.set_decoder_enabled(2, true).unwrap();
    a.set_decoder_enabled(0, false).unwrap();

    assert_eq!(link.enabled_decoders(Side::A), vec![2]);
    assert_eq!(link.max_enabled_decoders(Side::A), 2);
    assert!(link.enabled_decoders(Side::B).is_empty());
}

#[test]
fn test_sim_buffer_transfer() {
    let link = SimLink::new(&DpofConfig::default());
    let mut a = link.board(Side::A);
    let mut b = link.board(Side::B);

    a.write_buffer_size(3).unwrap();
    a.write_buffer_command(BufferCommand::ArmTransmit).unwrap();
    assert_eq!(a.read_buffer_status().unwrap(), 0x01);

    b.write_buffer_command(BufferCommand::ArmReceive).unwrap();
    assert_eq!(a.read_buffer_status().unwrap(), 0x03);

    a.write_buffer_bytes(&[7, 8, 9]).unwrap();
    a.write_buffer_command(BufferCommand::StartTransmit).unwrap();

    assert_eq!(a.read_buffer_status().unwrap(), 0x05);
    assert_eq!(b.read_buffer_status().unwrap(), 0x0b);
    assert_eq!(b.read_buffer_size().unwrap(), 3);
    assert_eq!(b.read_buffer_bytes(3).unwrap(), vec![7, 8, 9]);
}

#[test]
fn test_sim_start_without_ack_moves_nothing() {
    let link = SimLink::new(&DpofConfig::default());
    let mut a = link.board(Side::A);

    a.write_buffer_size(1).unwrap();
    a.write_buffer_command(BufferCommand::ArmTransmit).unwrap();
    a.write_buffer_command(BufferCommand::StartTransmit).unwrap();

    assert_eq!(link.buffer_status(Side::A), 0x02);
    assert_eq!(link.buffer_status(Side::B), 0x00);
}

#[test]
fn test_sim_injected_faults() {
    let link = SimLink::new(&DpofConfig::default());
    let mut a = link.board(Side::A);
    link.inject_faults(Side::A, 1);

    assert!(a.read_buffer_status().unwrap_err().is_transient());
    assert!(a.read_buffer_status().is_ok());
}
