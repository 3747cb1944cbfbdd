//! Native host media session backend (mobile shells)

use super::{
    ActionHandler, NowPlayingError, NowPlayingMetadata, NowPlayingSurface, PlaybackStatus,
    PositionState, TransportAction, TransportCommand, TransportSink,
};
use std::sync::Arc;

/// Seek offset used for native seek-forward/backward actions
const NATIVE_SEEK_STEP: f64 = 10.0;

/// Bridge to the native media session plugin
pub trait NativeSessionHost: Send + Sync {
    /// Whether the app runs inside a native shell
    fn is_native_platform(&self) -> bool;

    fn set_action_handler(
        &self,
        action: TransportAction,
        handler: ActionHandler,
    ) -> Result<(), NowPlayingError>;

    fn set_metadata(&self, metadata: &NowPlayingMetadata) -> Result<(), NowPlayingError>;

    fn set_playback_state(&self, status: PlaybackStatus) -> Result<(), NowPlayingError>;

    fn set_position_state(&self, position: &PositionState) -> Result<(), NowPlayingError>;
}

/// Native session surface
///
/// Always seeks by a fixed 10 s and pushes position alongside every
/// playback state update. Metadata is never cleared, only blanked.
pub struct NativeSessionSurface<H> {
    host: H,
}

impl<H: NativeSessionHost> NativeSessionSurface<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Wrap `host` only when running natively
    pub fn detect(host: H) -> Option<Self> {
        host.is_native_platform().then(|| Self::new(host))
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: NativeSessionHost> NowPlayingSurface for NativeSessionSurface<H> {
    fn name(&self) -> &'static str {
        "native-session"
    }

    fn register_transport_handlers(&self, sink: TransportSink) -> Result<(), NowPlayingError> {
        for action in TransportAction::ALL {
            let sink = sink.clone();
            let handler: ActionHandler = Arc::new(move |details| {
                let command = match action {
                    TransportAction::Play => TransportCommand::Play,
                    TransportAction::Pause => TransportCommand::Pause,
                    TransportAction::NextTrack => TransportCommand::NextTrack,
                    TransportAction::PreviousTrack => TransportCommand::PreviousTrack,
                    TransportAction::SeekTo => TransportCommand::SeekTo {
                        time: details.seek_time,
                    },
                    TransportAction::SeekBackward => TransportCommand::SeekBackward {
                        offset: NATIVE_SEEK_STEP,
                    },
                    TransportAction::SeekForward => TransportCommand::SeekForward {
                        offset: NATIVE_SEEK_STEP,
                    },
                };
                sink.dispatch(command);
            });
            self.host.set_action_handler(action, handler)?;
        }
        Ok(())
    }

    fn push_metadata(&self, metadata: Option<&NowPlayingMetadata>) -> Result<(), NowPlayingError> {
        match metadata {
            Some(metadata) => self.host.set_metadata(metadata),
            None => self.host.set_metadata(&NowPlayingMetadata::default()),
        }
    }

    fn push_playback_state(&self, status: PlaybackStatus) -> Result<(), NowPlayingError> {
        self.host.set_playback_state(status)
    }

    fn push_position(&self, position: &PositionState) -> Result<(), NowPlayingError> {
        self.host.set_position_state(position)
    }

    fn position_follows_state(&self) -> bool {
        true
    }
}
