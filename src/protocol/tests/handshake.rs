use crate::protocol::handshake::{HANDSHAKE_SHIFT, HandshakeFrame, HandshakeState};
use crate::types::TransactionId;

// ===== Bit layout =====

#[test]
fn test_init_query_layout() {
    let frame = HandshakeFrame::new(HandshakeState::Init, TransactionId::QUERY_STATUS, 0x42);
    // data flag only in the top byte, nonce in the low byte
    assert_eq!(frame.encode(), 0x8042);
}

#[test]
fn test_accept_write_layout() {
    let frame = HandshakeFrame::new(HandshakeState::Accept, TransactionId::WRITE_COMMAND, 0x00);
    // 1 | 01 | 00001
    assert_eq!(frame.encode(), 0xa100);
}

#[test]
fn test_end_carries_status() {
    let id = TransactionId::new(0x1f).unwrap();
    let frame = HandshakeFrame::new(HandshakeState::End, id, 0x05);
    // 1 | 10 | 11111
    assert_eq!(frame.encode(), 0xdf05);
}

#[test]
fn test_decode_normal_timestamp() {
    let frame = HandshakeFrame::decode(0x0000);
    assert!(!frame.data_flag);
    assert_eq!(frame.state, HandshakeState::Init);
    assert_eq!(frame.transaction_id.value(), 0);
}

#[test]
fn test_decode_reserved_state() {
    let frame = HandshakeFrame::decode(0xe000);
    assert!(frame.data_flag);
    assert_eq!(frame.state, HandshakeState::Reserved);
}

// ===== Seconds field placement =====

#[test]
fn test_seconds_offset_targets_top_bytes() {
    let frame = HandshakeFrame::new(HandshakeState::Init, TransactionId::WRITE_COMMAND, 0x7f);
    let offset = frame.seconds_offset();
    assert_eq!(offset, 0x817f_0000_0000);
    assert_eq!(offset >> HANDSHAKE_SHIFT, 0x817f);
}

#[test]
fn test_from_seconds_ignores_low_bytes() {
    // A running clock in the low 32 bits does not disturb the frame
    let seconds = 0xa133_6543_2109;
    let frame = HandshakeFrame::from_seconds(seconds);
    assert!(frame.data_flag);
    assert_eq!(frame.state, HandshakeState::Accept);
    assert_eq!(frame.transaction_id, TransactionId::WRITE_COMMAND);
    assert_eq!(frame.nonce, 0x33);
}

#[test]
fn test_raw_from_seconds_masks_above_48_bits() {
    assert_eq!(HandshakeFrame::raw_from_seconds(0xffff_8042_0000_0001), 0x8042);
}

#[test]
fn test_state_bits() {
    for state in [
        HandshakeState::Init,
        HandshakeState::Accept,
        HandshakeState::End,
        HandshakeState::Reserved,
    ] {
        assert_eq!(HandshakeState::from_bits(state.bits()), state);
    }
}
