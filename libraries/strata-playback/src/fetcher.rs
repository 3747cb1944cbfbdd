//! Cancellable chunk fetching

use crate::error::PlaybackError;
use crate::source::ChunkSource;
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a cancellable fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Payload arrived before cancellation
    Fetched(Bytes),
    /// The session was torn down first
    Cancelled,
    /// The source failed
    Failed(PlaybackError),
}

/// Wraps a [`ChunkSource`] with session cancellation
#[derive(Clone)]
pub struct ChunkFetcher {
    source: Arc<dyn ChunkSource>,
}

impl ChunkFetcher {
    pub fn new(source: Arc<dyn ChunkSource>) -> Self {
        Self { source }
    }

    /// Fetch `url` unless `token` is cancelled first
    ///
    /// Cancellation is checked before the payload is handed back, so a
    /// fetch that completes in the same poll as the cancellation still
    /// reports [`FetchOutcome::Cancelled`].
    pub async fn fetch(&self, url: &str, token: &CancellationToken) -> FetchOutcome {
        if token.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(url = %url, "Chunk fetch cancelled");
                FetchOutcome::Cancelled
            }
            result = self.source.fetch(url) => match result {
                Ok(_) if token.is_cancelled() => FetchOutcome::Cancelled,
                Ok(bytes) => FetchOutcome::Fetched(bytes),
                Err(e) => FetchOutcome::Failed(e),
            },
        }
    }
}
