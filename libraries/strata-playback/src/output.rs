//! Audio output abstraction
//!
//! The engine never decodes audio itself. It drives an output element (an
//! HTML audio element, a native player, a test fake) through this trait and
//! learns about clock progress from [`OutputEvent`]s the output posts into
//! the engine's event queue.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Playback surface the engine drives
///
/// Methods take `&self`: outputs are shared with the exclusivity gate, which
/// may pause an output owned by another engine.
pub trait AudioOutput: Send + Sync {
    /// Start or resume playback
    ///
    /// May fail, e.g. when the platform blocks autoplay.
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self);

    /// Whether the output is paused
    fn is_paused(&self) -> bool;

    /// Current playback position in seconds
    fn position(&self) -> f64;

    /// Move the playback position
    fn set_position(&self, seconds: f64) -> Result<()>;

    /// Media duration reported by the output, if known
    fn duration(&self) -> Option<f64>;

    /// Set volume (0.0 - 1.0)
    fn set_volume(&self, volume: f32);

    /// Set the muted flag
    fn set_muted(&self, muted: bool);
}

/// Notifications from the output element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutputEvent {
    /// The playback clock advanced
    TimeUpdate { position: f64 },

    /// Playback started or resumed
    Playing,

    /// Playback paused
    Paused,

    /// End of media reached
    Ended,
}
