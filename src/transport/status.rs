//! Local status served to query requests

use crate::protocol::payload::QueryResponse;

/// Supplies the chip status block a responder sends for transaction 0
pub trait StatusSource: Send {
    /// Snapshot of the local chip status
    fn query_response(&mut self) -> QueryResponse;
}

/// [`StatusSource`] returning a fixed block
#[derive(Debug, Clone, Default)]
pub struct StaticStatus {
    response: QueryResponse,
}

impl StaticStatus {
    /// Serve the given block
    #[must_use]
    pub fn new(response: QueryResponse) -> Self {
        Self { response }
    }

    /// Empty status named after the host.
    ///
    /// Falls back to an empty name if the host name cannot be read.
    #[must_use]
    pub fn from_hostname() -> Self {
        let name = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(QueryResponse {
            name,
            ..QueryResponse::default()
        })
    }

    /// Replace the served block
    pub fn set(&mut self, response: QueryResponse) {
        self.response = response;
    }
}

impl StatusSource for StaticStatus {
    fn query_response(&mut self) -> QueryResponse {
        self.response.clone()
    }
}
