/// Chunk domain type
use super::track::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration assumed for a chunk whose manifest entry has no usable duration
pub const DEFAULT_CHUNK_DURATION_SECS: f64 = 5.0;

/// Chunk identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u64);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One independently fetchable audio segment of a track
///
/// Chunks of a track are ordered; the index in the manifest is the position
/// on the playback timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk identifier
    pub id: ChunkId,

    /// Where the payload bytes are fetched from
    pub url: String,

    /// Duration in seconds, always strictly positive
    pub duration_secs: f64,

    /// Track this chunk belongs to
    pub track_id: TrackId,
}

impl Chunk {
    /// Create a chunk, coercing a missing or non-positive duration to
    /// [`DEFAULT_CHUNK_DURATION_SECS`]
    pub fn new(id: ChunkId, url: impl Into<String>, duration_secs: f64, track_id: TrackId) -> Self {
        Self {
            id,
            url: url.into(),
            duration_secs: coerce_duration(duration_secs),
            track_id,
        }
    }

    /// Duration used for timeline math
    ///
    /// Chunks built through serde bypass [`Chunk::new`], so the coercion is
    /// applied again here.
    pub fn effective_duration(&self) -> f64 {
        coerce_duration(self.duration_secs)
    }
}

fn coerce_duration(duration_secs: f64) -> f64 {
    if duration_secs.is_finite() && duration_secs > 0.0 {
        duration_secs
    } else {
        DEFAULT_CHUNK_DURATION_SECS
    }
}
