//! Wire formats shared by both ends of the link.
//!
//! ## Handshake frame
//!
//! Negotiation rides in the two most significant bytes of the 48-bit
//! time-of-day seconds field transmitted by each encoder:
//!
//! ```text
//! byte[5] bit7       data flag (1 = field aliased for negotiation)
//! byte[5] bits[6:5]  handshake state (0=Init, 1=Accept, 2=End)
//! byte[5] bits[4:0]  transaction id
//! byte[4] bits[7:0]  nonce / responder status on End
//! ```
//!
//! ## Transfer buffer
//!
//! Bulk data goes through a single 128-byte buffer per device, driven by a
//! command/status register. See [`BufferStatus`].

pub mod buffer;
pub mod handshake;
pub mod payload;

#[cfg(test)]
mod tests;

pub use buffer::{BUFFER_CAPACITY, BufferCommand, BufferStatus};
pub use handshake::{HandshakeFrame, HandshakeState};
pub use payload::{FORCE_FOLLOW_SENTINEL, QUERY_RESPONSE_LEN, QueryResponse, WriteRequest};
