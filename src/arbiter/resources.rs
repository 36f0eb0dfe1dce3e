//! Exclusive system-wide resources handed out by the arbiter.

use crate::types::ChannelId;

/// The single enabled receive path, passed round-robin between channels
#[derive(Debug, Clone)]
pub struct ReceivePath {
    holder: Option<ChannelId>,
    channel_count: usize,
}

impl ReceivePath {
    /// Unheld path over `channel_count` channels
    #[must_use]
    pub fn new(channel_count: usize) -> Self {
        Self {
            holder: None,
            channel_count,
        }
    }

    /// Channel whose decoder is (meant to be) enabled
    #[must_use]
    pub fn holder(&self) -> Option<ChannelId> {
        self.holder
    }

    /// Take the path if it is free or already ours
    pub fn try_acquire(&mut self, channel: ChannelId) -> bool {
        match self.holder {
            None => {
                self.holder = Some(channel);
                true
            }
            Some(current) => current == channel,
        }
    }

    /// Give the path back; ignored unless `channel` holds it
    pub fn release(&mut self, channel: ChannelId) -> bool {
        if self.holder == Some(channel) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    /// Hand the path from `channel` to the next one, wrapping around.
    ///
    /// Returns the new holder, or `None` if `channel` did not hold it.
    pub fn rotate_from(&mut self, channel: ChannelId) -> Option<ChannelId> {
        if !self.release(channel) {
            return None;
        }
        let next = (channel + 1) % self.channel_count;
        self.holder = Some(next);
        Some(next)
    }
}

/// Grant over the single transfer buffer
#[derive(Debug, Clone, Default)]
pub struct TransferBuffer {
    owner: Option<ChannelId>,
}

impl TransferBuffer {
    /// Ungranted buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current grant holder
    #[must_use]
    pub fn owner(&self) -> Option<ChannelId> {
        self.owner
    }

    /// Whether `channel` holds the grant
    #[must_use]
    pub fn is_granted(&self, channel: ChannelId) -> bool {
        self.owner == Some(channel)
    }

    /// Grant to `channel` if nobody holds it. First requester wins.
    pub fn try_acquire(&mut self, channel: ChannelId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(channel);
                true
            }
            Some(current) => current == channel,
        }
    }

    /// Revoke; ignored unless `channel` holds the grant
    pub fn release(&mut self, channel: ChannelId) -> bool {
        if self.owner == Some(channel) {
            self.owner = None;
            true
        } else {
            false
        }
    }
}
