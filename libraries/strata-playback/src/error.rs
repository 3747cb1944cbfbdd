//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Most of these never reach the UI: the streaming pipeline logs them and
/// degrades to a stalled-but-alive state. Manifest failures are the exception
/// and surface as [`crate::PlayerEvent::Error`].
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The chunk manifest for a track could not be obtained
    #[error("Manifest unavailable for track {track_id}: {message}")]
    Manifest { track_id: String, message: String },

    /// A chunk payload could not be fetched
    #[error("Chunk fetch failed ({url}): {message}")]
    ChunkFetch { url: String, message: String },

    /// A further playlist page could not be loaded
    #[error("Playlist page unavailable: {0}")]
    Playlist(String),

    /// The media buffer refused an operation (wrong state, quota, etc.)
    #[error("Media buffer rejected operation: {0}")]
    BufferRejected(String),

    /// The media backend could not open a buffer
    #[error("Media backend error: {0}")]
    Backend(String),

    /// The audio output refused an operation (e.g. autoplay blocked)
    #[error("Audio output error: {0}")]
    Output(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine has been disposed
    #[error("Engine disposed")]
    Disposed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
