//! Collaborators the state machine drives but does not implement.
//!
//! - [`LinkRegisters`]: decoder enables, the shared receive snapshot, the
//!   per-encoder transmit clock and the transfer buffer registers.
//! - [`Clock`]: monotonic time for receive-path time slices.
//! - [`NonceSource`]: tie-break values for negotiation.
//! - [`StatusSource`]: local chip status served to query requests.

pub mod clock;
pub mod nonce;
pub mod registers;
pub mod status;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use nonce::{NonceSource, RandomNonces};
pub use registers::{JumpDirection, LinkRegisters};
pub use status::{StaticStatus, StatusSource};
