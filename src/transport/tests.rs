use std::time::Duration;

use rand::rngs::mock::StepRng;

use super::*;
use crate::protocol::payload::QueryResponse;

#[test]
fn test_seeded_nonces_repeat() {
    let mut a = RandomNonces::seeded(7);
    let mut b = RandomNonces::seeded(7);
    let first: Vec<u8> = (0..16).map(|_| a.next_nonce()).collect();
    let second: Vec<u8> = (0..16).map(|_| b.next_nonce()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_nonces_from_custom_rng() {
    // StepRng yields 5, 6, 7... as u32/u64; the nonce is the low byte
    let mut nonces = RandomNonces::new(StepRng::new(5, 1));
    assert_eq!(nonces.next_nonce(), 5);
    assert_eq!(nonces.next_nonce(), 6);
}

#[test]
fn test_system_clock_monotonic() {
    let clock = SystemClock;
    let a = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    assert!(clock.now() > a);
}

#[test]
fn test_static_status() {
    let mut status = StaticStatus::new(QueryResponse {
        name: "bench".to_string(),
        ..QueryResponse::default()
    });
    assert_eq!(status.query_response().name, "bench");

    status.set(QueryResponse {
        dpll_status: [1, 2, 3, 4],
        ..QueryResponse::default()
    });
    assert_eq!(status.query_response().dpll_status, [1, 2, 3, 4]);
}

#[test]
fn test_status_from_hostname_fits() {
    let encoded = StaticStatus::from_hostname().query_response().encode();
    assert_eq!(encoded.len(), crate::protocol::QUERY_RESPONSE_LEN);
}
