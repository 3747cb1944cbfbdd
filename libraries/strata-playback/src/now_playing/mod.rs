//! Now-playing integration
//!
//! Mirrors playback state onto OS/browser "now playing" surfaces (lock
//! screen, notification shade, hardware media keys) and relays their
//! transport commands back into the engine's event queue.
//!
//! Everything here is best-effort: every failure is logged at debug level
//! and dropped, so a broken surface can never affect audio.

mod media_session;
mod native;

pub use media_session::{MediaSessionHost, MediaSessionSurface};
pub use native::{NativeSessionHost, NativeSessionSurface};

use crate::events::{EngineEvent, EventSender};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures reported by now-playing hosts
#[derive(Debug, Error)]
pub enum NowPlayingError {
    /// The host lacks the capability (e.g. no position state support)
    #[error("Not supported by host: {0}")]
    Unsupported(&'static str),

    /// The host rejected the call
    #[error("Host error: {0}")]
    Host(String),
}

/// Track description shown on the surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    pub title: String,
    pub artist: String,
    /// Always empty; tracks carry no album
    pub album: String,
    /// Artwork image URLs
    pub artwork: Vec<String>,
}

impl NowPlayingMetadata {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, artwork: Vec<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: String::new(),
            artwork,
        }
    }
}

/// Position/duration snapshot for scrubbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub duration: f64,
    pub playback_rate: f64,
    pub position: f64,
}

impl PositionState {
    /// Build a position state, clamping `position` to a positive `duration`
    pub fn new(duration: f64, position: f64) -> Self {
        let position = if duration > 0.0 {
            position.min(duration)
        } else {
            position
        };
        Self {
            duration,
            playback_rate: 1.0,
            position,
        }
    }
}

/// Largest finite positive value among `candidates`, or 0
pub fn best_duration(candidates: impl IntoIterator<Item = f64>) -> f64 {
    candidates
        .into_iter()
        .filter(|d| d.is_finite() && *d > 0.0)
        .fold(0.0, f64::max)
}

/// Playing/paused as shown on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

/// Actions a surface can relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportAction {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    SeekTo,
    SeekBackward,
    SeekForward,
}

impl TransportAction {
    /// Every action, in registration order
    pub const ALL: [Self; 7] = [
        Self::Play,
        Self::Pause,
        Self::PreviousTrack,
        Self::NextTrack,
        Self::SeekTo,
        Self::SeekBackward,
        Self::SeekForward,
    ];

    /// Action name as used by the Media Session API
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::NextTrack => "nexttrack",
            Self::PreviousTrack => "previoustrack",
            Self::SeekTo => "seekto",
            Self::SeekBackward => "seekbackward",
            Self::SeekForward => "seekforward",
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details a host passes to an action handler
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionDetails {
    pub seek_time: Option<f64>,
    pub seek_offset: Option<f64>,
}

/// Callback a host invokes when the user triggers an action
pub type ActionHandler = Arc<dyn Fn(ActionDetails) + Send + Sync>;

/// Command relayed from a surface into the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportCommand {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    /// Seek to an absolute time; `None` re-seeks to the current position
    SeekTo { time: Option<f64> },
    SeekBackward { offset: f64 },
    SeekForward { offset: f64 },
}

/// Routes transport commands into an engine's event queue
#[derive(Debug, Clone)]
pub struct TransportSink {
    events: EventSender,
}

impl TransportSink {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub fn dispatch(&self, command: TransportCommand) {
        if self.events.send(EngineEvent::Transport(command)).is_err() {
            debug!(?command, "Transport command after engine dropped");
        }
    }
}

/// One now-playing backend
pub trait NowPlayingSurface: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Install handlers for every [`TransportAction`]
    fn register_transport_handlers(&self, sink: TransportSink) -> Result<(), NowPlayingError>;

    /// Show `metadata`, or clear the surface when `None`
    fn push_metadata(&self, metadata: Option<&NowPlayingMetadata>) -> Result<(), NowPlayingError>;

    fn push_playback_state(&self, status: PlaybackStatus) -> Result<(), NowPlayingError>;

    fn push_position(&self, position: &PositionState) -> Result<(), NowPlayingError>;

    /// Whether this surface wants state and position pushed together
    fn position_follows_state(&self) -> bool {
        false
    }
}

/// Fans state out to every configured surface
#[derive(Default)]
pub struct NowPlayingBridge {
    surfaces: Vec<Box<dyn NowPlayingSurface>>,
    registered: bool,
}

impl NowPlayingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface
    #[must_use]
    pub fn with_surface(mut self, surface: impl NowPlayingSurface + 'static) -> Self {
        self.surfaces.push(Box::new(surface));
        self
    }

    /// Add a surface if the host detected one
    #[must_use]
    pub fn with_optional_surface(self, surface: Option<impl NowPlayingSurface + 'static>) -> Self {
        match surface {
            Some(surface) => self.with_surface(surface),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Register transport handlers on every surface (first call only)
    pub fn register(&mut self, sink: &TransportSink) {
        if self.registered {
            return;
        }
        self.registered = true;

        for surface in &self.surfaces {
            if let Err(e) = surface.register_transport_handlers(sink.clone()) {
                debug!(surface = surface.name(), error = %e, "Transport handler registration failed");
            }
        }
    }

    /// Push track metadata (on load)
    pub fn publish_metadata(&self, metadata: Option<&NowPlayingMetadata>) {
        for surface in &self.surfaces {
            swallow(surface.name(), "metadata", surface.push_metadata(metadata));
        }
    }

    /// Push playing/paused (on transitions)
    pub fn publish_state(&self, status: PlaybackStatus, position: &PositionState) {
        for surface in &self.surfaces {
            swallow(surface.name(), "state", surface.push_playback_state(status));
            if surface.position_follows_state() {
                swallow(surface.name(), "position", surface.push_position(position));
            }
        }
    }

    /// Push position (on ticks and seeks)
    pub fn publish_position(&self, status: PlaybackStatus, position: &PositionState) {
        for surface in &self.surfaces {
            if surface.position_follows_state() {
                swallow(surface.name(), "state", surface.push_playback_state(status));
            }
            swallow(surface.name(), "position", surface.push_position(position));
        }
    }
}

fn swallow(surface: &'static str, what: &'static str, result: Result<(), NowPlayingError>) {
    if let Err(e) = result {
        debug!(surface, what, error = %e, "Now-playing push failed");
    }
}
