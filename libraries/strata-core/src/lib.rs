//! Strata Core
//!
//! Platform-agnostic domain types for Strata, the segmented-audio player.
//!
//! A catalog track is not delivered as one file. It arrives as an ordered
//! list of independently fetched [`Chunk`]s, and the playback engine stitches
//! them into one continuous timeline. This crate holds the pieces every other
//! crate agrees on:
//!
//! - **Domain Types**: [`Track`], [`Chunk`] and their identifiers
//! - **Timeline Math**: [`ChunkTimeline`] (cumulative offsets, time lookup,
//!   seek clamping)
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Chunk, ChunkId, ChunkTimeline, TrackId};
//!
//! let track = TrackId(7);
//! let chunks = vec![
//!     Chunk::new(ChunkId(1), "https://cdn.example.com/7/0.mp3", 5.0, track),
//!     Chunk::new(ChunkId(2), "https://cdn.example.com/7/1.mp3", 5.0, track),
//! ];
//!
//! let timeline = ChunkTimeline::from_chunks(&chunks);
//! assert_eq!(timeline.total_duration(), 10.0);
//! assert_eq!(timeline.find_chunk_by_time(6.0), 1);
//! ```

#![forbid(unsafe_code)]

pub mod timeline;
pub mod types;

pub use timeline::ChunkTimeline;
pub use types::{Chunk, ChunkId, Track, TrackId, DEFAULT_CHUNK_DURATION_SECS};
