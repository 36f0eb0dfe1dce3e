//! # dpof
//!
//! Handshake negotiation and data exchange between two DPLL timing chips
//! linked over fiber.
//!
//! Each chip transmits time-of-day frames to its peer. Four bytes of
//! signalling ride in the top of the 48-bit seconds field; once one side
//! wins negotiation, payloads move through a dedicated 128-byte transfer
//! buffer.
//!
//! ## Features
//!
//! - Collision-free negotiation with random tie-break nonces
//! - Status queries (83-byte chip status block) and output/follow writes
//! - Round-robin sharing of the single receive path across channels
//! - Exclusive transfer-buffer grants
//!
//! ## Example
//!
//! ```rust,no_run
//! use dpof::testing::{SimLink, Side};
//! use dpof::{Arbiter, DpofConfig, TransactionId};
//!
//! # fn example() -> Result<(), dpof::DpofError> {
//! let config = DpofConfig::default();
//! let link = SimLink::new(&config);
//!
//! let mut near = Arbiter::new(link.board(Side::A), config.clone())?;
//! let mut far = Arbiter::new(link.board(Side::B), config)?;
//!
//! near.request_query(0, TransactionId::QUERY_STATUS)?;
//! for _ in 0..16 {
//!     near.tick();
//!     far.tick();
//! }
//!
//! while let Some(event) = near.poll_event() {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Arbiter**: owns the receive path and transfer buffer, ticks channels
//! - **Channel**: per-link state machine with its transmitter and receiver
//! - **Protocol**: handshake frame, buffer status codes, payload layouts
//! - **Transport**: register, clock, nonce and status interfaces

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod arbiter;
pub mod channel;
#[cfg(feature = "tokio-runtime")]
mod driver;
pub mod protocol;
pub mod transport;

// Re-exports
pub use arbiter::{Arbiter, ArbiterBuilder};
pub use channel::{ChannelState, LinkEvent};
pub use error::DpofError;
pub use protocol::{HandshakeFrame, HandshakeState, QueryResponse, WriteRequest};
pub use transport::{Clock, LinkRegisters, NonceSource, StatusSource};
pub use types::{ChannelConfig, ChannelId, DpofConfig, TimeSlicePolicy, TransactionId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        Arbiter, ChannelConfig, ChannelState, DpofConfig, DpofError, LinkEvent, LinkRegisters,
        QueryResponse, TimeSlicePolicy, TransactionId, WriteRequest,
    };
}
