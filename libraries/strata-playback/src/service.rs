//! Player service
//!
//! Owns a [`StreamingEngine`] together with the playlist it plays from and
//! drives both from one tokio task. UI code talks to it through a cloneable
//! [`PlayerHandle`] and observes it through a broadcast of [`PlayerEvent`]s.
//!
//! The service answers the engine's intents itself:
//! - `PlayIndexRequested` selects and loads that playlist entry
//! - `LoadMoreRequested` fetches the next page from the [`PlaylistSource`]

use crate::engine::StreamingEngine;
use crate::error::{PlaybackError, Result};
use crate::events::{EventReceiver, PlayerEvent, PlayerSnapshot};
use crate::source::PlaylistSource;
use std::sync::Arc;
use strata_core::Track;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the outbound event broadcast
const EVENT_CAPACITY: usize = 256;

/// Commands accepted by the player service
#[derive(Debug)]
pub enum PlayerCommand {
    /// Replace the playlist (e.g. a new search)
    SetPlaylist(Vec<Track>),

    /// Append tracks to the playlist
    AppendTracks(Vec<Track>),

    /// Select and load a playlist entry
    PlayIndex(usize),

    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Toggle play/pause
    TogglePlay,

    /// Skip to next track
    Next,

    /// Go to previous track (or restart the current one)
    Previous,

    /// Navigate back out of the player
    Back,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Set volume (0.0 - 1.0)
    SetVolume(f32),

    ToggleMute,

    ToggleShuffle,

    ToggleRepeat,

    /// Fetch the next playlist page
    LoadMore,

    /// Reply with the current snapshot
    Snapshot(oneshot::Sender<PlayerSnapshot>),

    /// Dispose the engine and stop the service
    Shutdown,
}

/// Cloneable command surface of a running [`PlayerService`]
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    /// Send a command
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::Disposed)
    }

    /// Subscribe to outbound events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Current engine snapshot
    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::Snapshot(tx))?;
        rx.await.map_err(|_| PlaybackError::Disposed)
    }

    pub fn play_index(&self, index: usize) -> Result<()> {
        self.send(PlayerCommand::PlayIndex(index))
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(PlayerCommand::TogglePlay)
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.send(PlayerCommand::Seek(seconds))
    }

    pub fn next(&self) -> Result<()> {
        self.send(PlayerCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(PlayerCommand::Previous)
    }

    /// Stop the service
    pub fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown)
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Engine + playlist, driven by a single task
pub struct PlayerService {
    engine: StreamingEngine,
    engine_events: EventReceiver,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
    source: Arc<dyn PlaylistSource>,
    pages_tx: mpsc::UnboundedSender<Result<Vec<Track>>>,
    pages_rx: mpsc::UnboundedReceiver<Result<Vec<Track>>>,
    page_in_flight: bool,
    playlist: Vec<Track>,
    current: Option<usize>,
}

impl PlayerService {
    /// Spawn the service task
    ///
    /// Returns the handle and the task's join handle; the task ends on
    /// [`PlayerCommand::Shutdown`] or when every handle is dropped.
    pub fn spawn(
        engine: StreamingEngine,
        engine_events: EventReceiver,
        source: Arc<dyn PlaylistSource>,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (pages_tx, pages_rx) = mpsc::unbounded_channel();

        let handle = PlayerHandle {
            commands: commands_tx,
            events: events.clone(),
        };

        let service = Self {
            engine,
            engine_events,
            commands,
            events,
            source,
            pages_tx,
            pages_rx,
            page_in_flight: false,
            playlist: Vec::new(),
            current: None,
        };

        let task = tokio::spawn(service.run());
        (handle, task)
    }

    async fn run(mut self) {
        info!("Player service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All player handles dropped");
                        break;
                    };
                    if let Flow::Stop = self.on_command(command) {
                        break;
                    }
                }
                Some(event) = self.engine_events.recv() => {
                    self.engine.handle_event(event);
                }
                Some(page) = self.pages_rx.recv() => {
                    self.on_page(page);
                }
            }
            self.flush();
        }

        self.engine.dispose();
        self.flush();
        info!("Player service stopped");
    }

    fn on_command(&mut self, command: PlayerCommand) -> Flow {
        match command {
            PlayerCommand::SetPlaylist(tracks) => self.set_playlist(tracks),
            PlayerCommand::AppendTracks(tracks) => self.append_tracks(tracks),
            PlayerCommand::PlayIndex(index) => self.play_index(index),
            PlayerCommand::Play => self.engine.play(),
            PlayerCommand::Pause => self.engine.pause(),
            PlayerCommand::TogglePlay => self.engine.toggle_play(),
            PlayerCommand::Next => self.engine.next(),
            PlayerCommand::Previous => self.engine.previous(),
            PlayerCommand::Back => self.engine.request_back(),
            PlayerCommand::Seek(seconds) => self.engine.seek(seconds),
            PlayerCommand::SetVolume(volume) => self.engine.set_volume(volume),
            PlayerCommand::ToggleMute => self.engine.toggle_mute(),
            PlayerCommand::ToggleShuffle => self.engine.toggle_shuffle(),
            PlayerCommand::ToggleRepeat => self.engine.toggle_repeat(),
            PlayerCommand::LoadMore => self.fetch_page(),
            PlayerCommand::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            PlayerCommand::Shutdown => {
                debug!("Shutdown requested");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn set_playlist(&mut self, tracks: Vec<Track>) {
        let loaded = self.engine.track().map(|t| t.id);
        self.playlist = tracks;
        self.current = loaded.and_then(|id| self.playlist.iter().position(|t| t.id == id));
        self.engine
            .update_playlist(self.playlist.len(), self.current);
    }

    fn append_tracks(&mut self, tracks: Vec<Track>) {
        self.playlist.extend(tracks);
        self.engine
            .update_playlist(self.playlist.len(), self.current);
    }

    fn play_index(&mut self, index: usize) {
        let Some(track) = self.playlist.get(index).cloned() else {
            warn!(index, len = self.playlist.len(), "Play index out of range");
            return;
        };
        self.current = Some(index);
        self.engine.set_current_index(Some(index));
        self.engine.load_track(track, true);
    }

    fn fetch_page(&mut self) {
        if self.page_in_flight {
            return;
        }
        self.page_in_flight = true;

        let source = self.source.clone();
        let pages = self.pages_tx.clone();
        tokio::spawn(async move {
            let _ = pages.send(source.load_more().await);
        });
    }

    fn on_page(&mut self, page: Result<Vec<Track>>) {
        self.page_in_flight = false;
        match page {
            Ok(tracks) => {
                debug!(count = tracks.len(), "Playlist page loaded");
                self.append_tracks(tracks);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load playlist page");
                let _ = self.events.send(PlayerEvent::Error {
                    message: e.to_string(),
                });
                // Resolve any deferred advance as end of playlist
                self.engine
                    .update_playlist(self.playlist.len(), self.current);
            }
        }
    }

    /// Act on engine intents and republish every event
    fn flush(&mut self) {
        loop {
            let events = self.engine.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match &event {
                    PlayerEvent::PlayIndexRequested { index } => self.play_index(*index),
                    PlayerEvent::LoadMoreRequested => self.fetch_page(),
                    _ => {}
                }
                // No subscribers is fine
                let _ = self.events.send(event);
            }
        }
    }
}
