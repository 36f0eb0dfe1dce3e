//! Core types module

mod config;
mod transaction;


pub use config::{ChannelConfig, DpofConfig, DpofConfigBuilder, TimeSlicePolicy};
pub use transaction::{ChannelId, TransactionId, TransactionKind};
