//! Upstream instance API: transport, endpoint client and payload models.

mod client;
mod models;
mod transport;

pub use client::{InstanceClient, DETAIL_FIELDS};
pub use models::{ApiErrorBody, DetailOutcome, FeedItem, VideoDetail};
pub use transport::{FetchResponse, HttpTransport, Transport, TransportError};

use thiserror::Error;

/// Failure modes of one upstream operation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("no eligible instance available")]
    NoInstances,
}

impl FetchError {
    /// Whether the failure is attributable to the contacted instance and
    /// should put it on cooldown.
    pub fn is_instance_fault(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::Status(_) | FetchError::Parse(_)
        )
    }
}
