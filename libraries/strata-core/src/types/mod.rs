mod chunk;
mod track;

pub use chunk::{Chunk, ChunkId, DEFAULT_CHUNK_DURATION_SECS};
pub use track::{Track, TrackId};
