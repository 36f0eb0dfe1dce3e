use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DpofError;

/// When the receive-path time slice is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlicePolicy {
    /// Cut the receive path off on every step once the slice is used up,
    /// even in the middle of a transaction.
    #[default]
    Unconditional,
    /// Only cut off while `Idle` or `TxNegotiating`; a channel inside a
    /// transaction keeps its receive path until it finishes.
    IdleOrNegotiating,
}

/// Static wiring of one logical channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Time-of-day counter read back when clearing a transmitted frame
    pub tod: u8,
    /// Encoder whose timestamp field carries our frames
    pub encoder: u8,
    /// Decoder observing the peer's frames
    pub decoder: u8,
    /// Maximum time the decoder may stay enabled before rotation
    #[serde(with = "duration_ms")]
    pub time_slice: Duration,
}

impl ChannelConfig {
    /// Default receive-path time slice (5 seconds)
    pub const DEFAULT_TIME_SLICE: Duration = Duration::from_secs(5);

    /// Create a channel with explicit wiring and the default time slice.
    #[must_use]
    pub fn new(tod: u8, encoder: u8, decoder: u8) -> Self {
        Self {
            tod,
            encoder,
            decoder,
            time_slice: Self::DEFAULT_TIME_SLICE,
        }
    }

    /// Board wiring used on the reference hardware: decoders skip one.
    ///
    /// Returns `None` for indices whose decoder would not fit in a `u8`
    /// (128 and above).
    #[must_use]
    pub fn standard(index: u8) -> Option<Self> {
        index
            .checked_mul(2)
            .map(|decoder| Self::new(index, index, decoder))
    }

    /// Override the time slice
    #[must_use]
    pub fn with_time_slice(mut self, time_slice: Duration) -> Self {
        self.time_slice = time_slice;
        self
    }
}

/// Configuration for the arbiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpofConfig {
    /// Channels in polling order; channel 0 gets the receive path first
    pub channels: Vec<ChannelConfig>,

    /// Time-slice enforcement policy (default: unconditional)
    #[serde(default)]
    pub time_slice_policy: TimeSlicePolicy,
}

impl Default for DpofConfig {
    fn default() -> Self {
        Self {
            channels: vec![ChannelConfig::new(0, 0, 0)],
            time_slice_policy: TimeSlicePolicy::default(),
        }
    }
}

impl DpofConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> DpofConfigBuilder {
        DpofConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or fails [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, DpofError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive an arbiter.
    ///
    /// # Errors
    /// Returns [`DpofError::InvalidConfig`] when there are no channels, a
    /// channel has a zero time slice, or two channels share a decoder.
    pub fn validate(&self) -> Result<(), DpofError> {
        if self.channels.is_empty() {
            return Err(DpofError::InvalidConfig {
                message: "at least one channel is required".to_string(),
            });
        }

        let mut decoders = HashSet::new();
        for (index, channel) in self.channels.iter().enumerate() {
            if channel.time_slice.is_zero() {
                return Err(DpofError::InvalidConfig {
                    message: format!("channel {index} has a zero time slice"),
                });
            }
            if !decoders.insert(channel.decoder) {
                return Err(DpofError::InvalidConfig {
                    message: format!(
                        "decoder {} is used by more than one channel",
                        channel.decoder
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Builder for `DpofConfig`
#[derive(Debug, Clone, Default)]
pub struct DpofConfigBuilder {
    channels: Vec<ChannelConfig>,
    time_slice_policy: TimeSlicePolicy,
    // First standard index that had no decoder to map to
    unwired: Option<u8>,
}

impl DpofConfigBuilder {
    /// Append a channel
    #[must_use]
    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    /// Append `count` channels with the standard board wiring.
    ///
    /// Only 128 channels can be wired this way; asking for more makes
    /// [`Self::build`] fail.
    #[must_use]
    pub fn standard_channels(mut self, count: u8) -> Self {
        for index in 0..count {
            match ChannelConfig::standard(index) {
                Some(channel) => self.channels.push(channel),
                None => {
                    self.unwired = Some(index);
                    break;
                }
            }
        }
        self
    }

    /// Set the time-slice policy
    #[must_use]
    pub fn time_slice_policy(mut self, policy: TimeSlicePolicy) -> Self {
        self.time_slice_policy = policy;
        self
    }

    /// Build and validate the configuration.
    ///
    /// Falls back to the single default channel when none were added.
    ///
    /// # Errors
    /// Returns [`DpofError::InvalidConfig`] if more standard channels were
    /// requested than the board wiring allows, or if the result fails
    /// [`DpofConfig::validate`].
    pub fn build(self) -> Result<DpofConfig, DpofError> {
        if let Some(index) = self.unwired {
            return Err(DpofError::InvalidConfig {
                message: format!("standard wiring has no decoder for channel {index}"),
            });
        }
        let channels = if self.channels.is_empty() {
            DpofConfig::default().channels
        } else {
            self.channels
        };
        let config = DpofConfig {
            channels,
            time_slice_policy: self.time_slice_policy,
        };
        config.validate()?;
        Ok(config)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation, reason = "time slices are far below u64::MAX ms")]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
