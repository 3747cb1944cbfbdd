//! Browser Media Session backend

use super::{
    ActionDetails, ActionHandler, NowPlayingError, NowPlayingMetadata, NowPlayingSurface,
    PlaybackStatus, PositionState, TransportAction, TransportCommand, TransportSink,
};
use crate::config::EngineConfig;
use std::sync::Arc;

/// Thin wrapper over `navigator.mediaSession` (or an equivalent)
pub trait MediaSessionHost: Send + Sync {
    /// Whether the platform exposes a media session at all
    fn is_available(&self) -> bool;

    fn set_action_handler(
        &self,
        action: TransportAction,
        handler: ActionHandler,
    ) -> Result<(), NowPlayingError>;

    /// `None` clears the metadata
    fn set_metadata(&self, metadata: Option<&NowPlayingMetadata>) -> Result<(), NowPlayingError>;

    fn set_playback_state(&self, status: PlaybackStatus) -> Result<(), NowPlayingError>;

    /// Whether `setPositionState` exists
    fn supports_position_state(&self) -> bool;

    fn set_position_state(&self, position: &PositionState) -> Result<(), NowPlayingError>;
}

/// Media Session surface
///
/// Honors the seek offset supplied by the browser; falls back to
/// `seek_step` when none is given.
pub struct MediaSessionSurface<H> {
    host: H,
    seek_step: f64,
}

impl<H: MediaSessionHost> MediaSessionSurface<H> {
    pub const DEFAULT_SEEK_STEP: f64 = 10.0;

    pub fn new(host: H) -> Self {
        Self {
            host,
            seek_step: Self::DEFAULT_SEEK_STEP,
        }
    }

    /// Surface whose fallback seek step is `config.seek_step_secs`
    pub fn from_config(host: H, config: &EngineConfig) -> Self {
        Self::new(host).with_seek_step(config.seek_step_secs)
    }

    /// Wrap `host` only if the platform has a media session
    pub fn detect(host: H) -> Option<Self> {
        host.is_available().then(|| Self::new(host))
    }

    #[must_use]
    pub fn with_seek_step(mut self, seconds: f64) -> Self {
        self.seek_step = seconds;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: MediaSessionHost> NowPlayingSurface for MediaSessionSurface<H> {
    fn name(&self) -> &'static str {
        "media-session"
    }

    fn register_transport_handlers(&self, sink: TransportSink) -> Result<(), NowPlayingError> {
        let step = self.seek_step;
        for action in TransportAction::ALL {
            let sink = sink.clone();
            let handler: ActionHandler = Arc::new(move |details| {
                sink.dispatch(command_for(action, details, step));
            });
            self.host.set_action_handler(action, handler)?;
        }
        Ok(())
    }

    fn push_metadata(&self, metadata: Option<&NowPlayingMetadata>) -> Result<(), NowPlayingError> {
        self.host.set_metadata(metadata)
    }

    fn push_playback_state(&self, status: PlaybackStatus) -> Result<(), NowPlayingError> {
        self.host.set_playback_state(status)
    }

    fn push_position(&self, position: &PositionState) -> Result<(), NowPlayingError> {
        if !self.host.supports_position_state() {
            return Err(NowPlayingError::Unsupported("setPositionState"));
        }
        self.host.set_position_state(position)
    }
}

fn command_for(action: TransportAction, details: ActionDetails, step: f64) -> TransportCommand {
    match action {
        TransportAction::Play => TransportCommand::Play,
        TransportAction::Pause => TransportCommand::Pause,
        TransportAction::NextTrack => TransportCommand::NextTrack,
        TransportAction::PreviousTrack => TransportCommand::PreviousTrack,
        TransportAction::SeekTo => TransportCommand::SeekTo {
            time: details.seek_time,
        },
        TransportAction::SeekBackward => TransportCommand::SeekBackward {
            offset: details.seek_offset.unwrap_or(step),
        },
        TransportAction::SeekForward => TransportCommand::SeekForward {
            offset: details.seek_offset.unwrap_or(step),
        },
    }
}
