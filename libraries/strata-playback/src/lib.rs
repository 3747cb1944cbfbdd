//! Strata - Chunked Streaming Playback
//!
//! Plays catalog tracks that are delivered as an ordered list of
//! independently fetched audio chunks, assembling them into one continuous,
//! seekable stream.
//!
//! This crate provides:
//! - Lookahead chunk scheduling (next chunk requested at 55% of the current one)
//! - Incremental buffer assembly with one append in flight
//! - Soft seeks within the resident chunk, hard seeks that rebuild the pipeline
//! - Session tokens that turn stale async completions into no-ops
//! - Playlist order (shuffle/repeat) with deferred advance across page loads
//! - A process-wide exclusivity gate so only one output is audible
//! - Now-playing integration (browser Media Session and native hosts)
//!
//! # Architecture
//!
//! `strata-playback` is platform-agnostic. The audio output, media buffer,
//! manifest provider and chunk source are traits; `strata-client` implements
//! the catalog side over HTTP.
//!
//! [`StreamingEngine`] is a synchronous state machine. Async work runs in
//! spawned tokio tasks that post [`EngineEvent`]s back; the owner feeds them
//! to [`StreamingEngine::handle_event`]. [`PlayerService`] does this in a
//! single task and exposes a cloneable [`PlayerHandle`].
//!
//! # Example: Playlist Order
//!
//! ```rust
//! use strata_playback::order::{compute_order, next_index};
//!
//! let order = compute_order(4, Some(3), false);
//! assert_eq!(next_index(&order, 4, Some(3), false, false), None);
//! assert_eq!(next_index(&order, 4, Some(3), false, true), Some(0));
//! ```
//!
//! # Example: Running a Player
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_playback::{
//!     EngineConfig, EngineDeps, ExclusivityGate, PlayerCommand, PlayerService, StreamingEngine,
//! };
//! # async fn run(deps: EngineDeps, pages: Arc<dyn strata_playback::PlaylistSource>) -> strata_playback::Result<()> {
//! let config = EngineConfig::load()?;
//! let (engine, events) = StreamingEngine::new(deps, config);
//! let (player, _task) = PlayerService::spawn(engine, events, pages);
//!
//! player.send(PlayerCommand::LoadMore)?;
//! player.play_index(0)?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
mod config;
pub mod engine;
mod error;
pub mod events;
pub mod exclusivity;
pub mod fetcher;
pub mod now_playing;
pub mod order;
pub mod output;
pub mod service;
pub mod session;
pub mod source;

// Public exports
pub use buffer::{AppendSignal, BufferAssembler, MediaBackend, MediaBuffer};
pub use config::EngineConfig;
pub use engine::{EngineDeps, StreamingEngine};
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, EngineState, EventReceiver, EventSender, PlayerEvent, PlayerSnapshot};
pub use exclusivity::ExclusivityGate;
pub use fetcher::{ChunkFetcher, FetchOutcome};
pub use now_playing::{NowPlayingBridge, NowPlayingSurface, TransportCommand};
pub use order::{Direction, PlaylistNavigator};
pub use output::{AudioOutput, OutputEvent};
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
pub use session::Session;
pub use source::{ChunkSource, ManifestProvider, PlaylistSource};
