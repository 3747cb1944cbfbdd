//! Collaborator interfaces for catalog data
//!
//! Implemented by the HTTP catalog client in production and by in-memory
//! fakes in tests.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use strata_core::{Chunk, Track, TrackId};

/// Resolves a track to its ordered chunk manifest
#[async_trait]
pub trait ManifestProvider: Send + Sync {
    /// Ordered chunks for `track_id`
    async fn chunks_for(&self, track_id: TrackId) -> Result<Vec<Chunk>>;
}

/// Fetches raw chunk payloads
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Bytes stored at `url`
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Supplies further playlist pages on demand
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Next page of tracks (empty when the playlist is exhausted)
    async fn load_more(&self) -> Result<Vec<Track>>;
}
