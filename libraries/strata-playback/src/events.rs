//! Engine events
//!
//! Two event streams exist:
//! - [`EngineEvent`]: inbound. Async completions, output notifications and
//!   now-playing transport commands, queued for the engine's owner to feed
//!   back through [`crate::StreamingEngine::handle_event`].
//! - [`PlayerEvent`]: outbound. State changes and intents for the UI or
//!   playlist controller, drained with
//!   [`crate::StreamingEngine::drain_events`].

use crate::now_playing::TransportCommand;
use crate::output::OutputEvent;
use crate::session::Session;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_core::{Chunk, TrackId};
use tokio::sync::mpsc;

/// Sender half of an engine's inbound queue
pub type EventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiver half of an engine's inbound queue
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Inbound events
///
/// Completions of asynchronous work carry the session they were started
/// under; the engine ignores them once that session is stale.
#[derive(Debug)]
pub enum EngineEvent {
    /// Chunk manifest for the loading track arrived
    ManifestLoaded { session: Session, chunks: Vec<Chunk> },

    /// Chunk manifest could not be obtained
    ManifestFailed { session: Session, message: String },

    /// A chunk payload was fetched
    ChunkFetched {
        session: Session,
        index: usize,
        bytes: Bytes,
    },

    /// The media buffer finished the in-flight append
    AppendCompleted { session: Session },

    /// Notification from the audio output
    Output(OutputEvent),

    /// Command from a now-playing surface
    Transport(TransportCommand),
}

/// Outbound events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Engine state changed
    StateChanged {
        /// The new state
        state: EngineState,
    },

    /// A new track was loaded
    TrackChanged {
        /// ID of the new track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Clock moved (tick or seek)
    PositionChanged {
        /// Position in seconds
        position: f64,
        /// Best known duration in seconds (0 when unknown)
        duration: f64,
    },

    /// Volume or mute changed
    VolumeChanged { volume: f32, is_muted: bool },

    /// Track reached its natural end
    TrackFinished { track_id: TrackId },

    /// The playlist controller should select and load this index
    PlayIndexRequested { index: usize },

    /// The UI should navigate back
    BackRequested,

    /// The playlist controller should load more items
    LoadMoreRequested,

    /// A failure the UI should know about (manifest or buffer open)
    Error { message: String },
}

/// Coarse engine state for observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    /// No track, or the engine was disposed
    Idle,
    /// Waiting for the chunk manifest
    LoadingManifest,
    /// Waiting for the first append of a pipeline
    Buffering,
    /// Audio is playing
    Playing,
    /// Ready but paused
    Paused,
    /// Track reached its end
    Ended,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub state: EngineState,
    pub track_id: Option<TrackId>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub is_loading_audio: bool,
    pub volume: f32,
    pub is_muted: bool,
    pub is_repeat: bool,
    pub is_shuffle: bool,
    pub can_next: bool,
    pub can_previous: bool,
}
