//! Streaming playback engine
//!
//! A synchronous state machine driven by its owner. Commands (`load_track`,
//! `seek`, `play`, ...) are plain method calls; asynchronous work (manifest
//! lookups, chunk fetches) runs in spawned tokio tasks that post
//! [`EngineEvent`]s back into the engine's queue, tagged with the session
//! they were started under. The owner feeds those events to
//! [`StreamingEngine::handle_event`]:
//!
//! ```ignore
//! let (mut engine, mut events) = StreamingEngine::new(deps, EngineConfig::default());
//! engine.load_track(track, true);
//! while let Some(event) = events.recv().await {
//!     engine.handle_event(event);
//!     for e in engine.drain_events() {
//!         ui.apply(e);
//!     }
//! }
//! ```
//!
//! Methods that start work must be called from within a tokio runtime.

use crate::buffer::{AppendSignal, BufferAssembler, MediaBackend};
use crate::config::EngineConfig;
use crate::events::{
    EngineEvent, EngineState, EventReceiver, EventSender, PlayerEvent, PlayerSnapshot,
};
use crate::exclusivity::ExclusivityGate;
use crate::fetcher::{ChunkFetcher, FetchOutcome};
use crate::now_playing::{
    best_duration, NowPlayingBridge, NowPlayingMetadata, PlaybackStatus, PositionState,
    TransportCommand, TransportSink,
};
use crate::order::{Direction, PlaylistNavigator};
use crate::output::{AudioOutput, OutputEvent};
use crate::session::{Session, SessionScope};
use crate::source::{ChunkSource, ManifestProvider};
use bytes::Bytes;
use std::sync::Arc;
use strata_core::{Chunk, ChunkTimeline, Track, TrackId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Collaborators an engine is built from
#[derive(Clone)]
pub struct EngineDeps {
    /// Output element the engine drives
    pub output: Arc<dyn AudioOutput>,
    /// Opens media buffers on `output`
    pub backend: Arc<dyn MediaBackend>,
    /// Chunk manifests by track id
    pub manifests: Arc<dyn ManifestProvider>,
    /// Chunk payloads by URL
    pub chunks: Arc<dyn ChunkSource>,
    /// Shared exclusivity slot
    pub gate: Arc<ExclusivityGate>,
}

/// What to do once the first append of a pipeline lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Claim exclusivity and start playback
    Autoplay,
    /// Playback was interrupted by a hard seek; resume without claiming
    KeepPlaying,
    StayPaused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Playing,
    Paused,
}

/// Manifest of the loaded track
struct Loaded {
    chunks: Vec<Chunk>,
    timeline: ChunkTimeline,
}

/// Manifest plus the live buffer pipeline
struct Streaming {
    loaded: Loaded,
    assembler: BufferAssembler,
    /// Highest chunk index requested so far
    current_chunk: usize,
}

impl Streaming {
    fn dismantle(self) -> Loaded {
        let Self {
            loaded,
            mut assembler,
            ..
        } = self;
        assembler.teardown();
        loaded
    }
}

enum Phase {
    Idle,
    LoadingManifest {
        start_at: f64,
        resume: Resume,
    },
    /// Pipeline open, first append pending
    Buffering {
        stream: Streaming,
        target: f64,
        resume: Resume,
    },
    Ready {
        stream: Streaming,
        transport: Transport,
    },
    Ended {
        stream: Streaming,
    },
    Disposed,
}

impl Phase {
    fn stream(&self) -> Option<&Streaming> {
        match self {
            Self::Buffering { stream, .. } | Self::Ready { stream, .. } | Self::Ended { stream } => {
                Some(stream)
            }
            _ => None,
        }
    }

    fn stream_mut(&mut self) -> Option<&mut Streaming> {
        match self {
            Self::Buffering { stream, .. } | Self::Ready { stream, .. } | Self::Ended { stream } => {
                Some(stream)
            }
            _ => None,
        }
    }

    fn state(&self) -> EngineState {
        match self {
            Self::Idle | Self::Disposed => EngineState::Idle,
            Self::LoadingManifest { .. } => EngineState::LoadingManifest,
            Self::Buffering { .. } => EngineState::Buffering,
            Self::Ready {
                transport: Transport::Playing,
                ..
            } => EngineState::Playing,
            Self::Ready { .. } => EngineState::Paused,
            Self::Ended { .. } => EngineState::Ended,
        }
    }
}

/// Chunked streaming playback engine
pub struct StreamingEngine {
    config: EngineConfig,
    output: Arc<dyn AudioOutput>,
    backend: Arc<dyn MediaBackend>,
    manifests: Arc<dyn ManifestProvider>,
    fetcher: ChunkFetcher,
    gate: Arc<ExclusivityGate>,
    events: EventSender,
    scope: SessionScope,
    phase: Phase,
    track: Option<Track>,
    current_time: f64,
    volume: f32,
    muted: bool,
    navigator: PlaylistNavigator,
    bridge: Option<NowPlayingBridge>,
    pending_events: Vec<PlayerEvent>,
}

impl StreamingEngine {
    /// Create an engine and the receiver for its inbound event queue
    pub fn new(deps: EngineDeps, config: EngineConfig) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();

        deps.output.set_volume(config.initial_volume);
        deps.output.set_muted(false);

        let engine = Self {
            navigator: PlaylistNavigator::new(config.shuffle, config.repeat),
            volume: config.initial_volume,
            config,
            output: deps.output,
            backend: deps.backend,
            manifests: deps.manifests,
            fetcher: ChunkFetcher::new(deps.chunks),
            gate: deps.gate,
            events,
            scope: SessionScope::new(),
            phase: Phase::Idle,
            track: None,
            current_time: 0.0,
            muted: false,
            bridge: None,
            pending_events: Vec::new(),
        };

        (engine, receiver)
    }

    /// Sender for output backends to post [`OutputEvent`]s
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Mirror state onto now-playing surfaces and accept their commands
    pub fn attach_now_playing(&mut self, mut bridge: NowPlayingBridge) {
        bridge.register(&TransportSink::new(self.events.clone()));
        self.bridge = Some(bridge);
        self.publish_metadata();
        self.publish_state();
    }

    // ===== Track loading =====

    /// Load `track`, replacing whatever is loaded
    ///
    /// Reloading the track that is already loading, buffering or ready is a
    /// no-op.
    pub fn load_track(&mut self, track: Track, autoplay: bool) {
        if matches!(self.phase, Phase::Disposed) {
            debug!("Load after dispose ignored");
            return;
        }

        let active = matches!(
            self.phase,
            Phase::LoadingManifest { .. } | Phase::Buffering { .. } | Phase::Ready { .. }
        );
        if active && self.track.as_ref().is_some_and(|t| t.id == track.id) {
            debug!(track_id = %track.id, "Track already loaded");
            return;
        }

        let previous_track_id = self.track.as_ref().map(|t| t.id);
        let track_id = track.id;

        self.output.pause();
        self.invalidate();

        info!(track_id = %track_id, title = %track.title, session = %self.scope.id(), "Loading track");

        self.current_time = 0.0;
        self.track = Some(track);
        self.phase = Phase::LoadingManifest {
            start_at: 0.0,
            resume: if autoplay {
                Resume::Autoplay
            } else {
                Resume::StayPaused
            },
        };

        self.emit(PlayerEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
        self.emit_state();
        self.emit_position();
        self.publish_metadata();
        self.publish_state();
        self.publish_position();

        self.request_manifest(track_id);
    }

    fn request_manifest(&self, track_id: TrackId) {
        let manifests = self.manifests.clone();
        let events = self.events.clone();
        let token = self.scope.token();
        let session = self.scope.id();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(session = %session, track_id = %track_id, "Manifest request cancelled");
                    return;
                }
                result = manifests.chunks_for(track_id) => result,
            };

            let event = match result {
                Ok(chunks) => EngineEvent::ManifestLoaded { session, chunks },
                Err(e) => EngineEvent::ManifestFailed {
                    session,
                    message: e.to_string(),
                },
            };
            let _ = events.send(event);
        });
    }

    // ===== Event handling =====

    /// Apply one inbound event
    pub fn handle_event(&mut self, event: EngineEvent) {
        if matches!(self.phase, Phase::Disposed) {
            return;
        }

        match event {
            EngineEvent::ManifestLoaded { session, chunks } => {
                if self.is_current(session) {
                    self.on_manifest(chunks);
                }
            }
            EngineEvent::ManifestFailed { session, message } => {
                if self.is_current(session) {
                    self.on_manifest_failed(message);
                }
            }
            EngineEvent::ChunkFetched {
                session,
                index,
                bytes,
            } => {
                if self.is_current(session) {
                    self.on_chunk(index, bytes);
                }
            }
            EngineEvent::AppendCompleted { session } => {
                if self.is_current(session) {
                    self.on_append_completed();
                }
            }
            EngineEvent::Output(event) => self.on_output(event),
            EngineEvent::Transport(command) => self.on_transport(command),
        }
    }

    fn is_current(&self, session: Session) -> bool {
        let current = self.scope.is_current(session);
        if !current {
            debug!(session = %session, current = %self.scope.id(), "Stale completion dropped");
        }
        current
    }

    fn on_manifest(&mut self, chunks: Vec<Chunk>) {
        let Phase::LoadingManifest { start_at, resume } = self.phase else {
            debug!("Manifest outside of loading dropped");
            return;
        };

        if chunks.is_empty() {
            self.on_manifest_failed("Track has no chunks".to_string());
            return;
        }

        let timeline = ChunkTimeline::from_chunks(&chunks);
        debug!(
            chunks = chunks.len(),
            total = timeline.total_duration(),
            "Manifest loaded"
        );

        let loaded = Loaded { chunks, timeline };
        let target = self.clamp_with(Some(&loaded.timeline), start_at);
        self.current_time = target;
        self.start_pipeline(loaded, target, resume);
        self.emit_position();
        self.publish_position();
    }

    fn on_manifest_failed(&mut self, message: String) {
        if !matches!(self.phase, Phase::LoadingManifest { .. }) {
            return;
        }

        let track_id = self.track.as_ref().map(|t| t.id);
        warn!(track_id = ?track_id, error = %message, "Manifest unavailable");

        self.track = None;
        self.abandon(message);
    }

    /// Open a fresh pipeline at `target` under the current session
    fn start_pipeline(&mut self, loaded: Loaded, target: f64, resume: Resume) {
        let session = self.scope.id();
        let index = loaded.timeline.find_chunk_by_time(target);
        let offset = loaded.timeline.start(index).unwrap_or(0.0);

        let opened = BufferAssembler::open(
            self.backend.as_ref(),
            AppendSignal::new(session, self.events.clone()),
            loaded.timeline.total_duration(),
            index,
            self.config.unknown_duration_secs,
        )
        .and_then(|mut assembler| {
            assembler.set_timeline_offset(offset)?;
            Ok(assembler)
        });

        let assembler = match opened {
            Ok(assembler) => assembler,
            Err(e) => {
                warn!(session = %session, error = %e, "Failed to open media buffer");
                self.abandon(e.to_string());
                return;
            }
        };

        debug!(session = %session, chunk = index, offset, target, "Pipeline opened");

        let url = loaded.chunks[index].url.clone();
        self.phase = Phase::Buffering {
            stream: Streaming {
                loaded,
                assembler,
                current_chunk: index,
            },
            target,
            resume,
        };
        self.emit_state();
        self.spawn_fetch(index, url);
    }

    fn spawn_fetch(&self, index: usize, url: String) {
        let fetcher = self.fetcher.clone();
        let events = self.events.clone();
        let token = self.scope.token();
        let session = self.scope.id();

        debug!(session = %session, chunk = index, url = %url, "Fetching chunk");

        tokio::spawn(async move {
            match fetcher.fetch(&url, &token).await {
                FetchOutcome::Fetched(bytes) => {
                    let _ = events.send(EngineEvent::ChunkFetched {
                        session,
                        index,
                        bytes,
                    });
                }
                FetchOutcome::Cancelled => {
                    debug!(session = %session, chunk = index, "Chunk fetch abandoned");
                }
                FetchOutcome::Failed(e) => {
                    warn!(session = %session, chunk = index, url = %url, error = %e, "Chunk fetch failed, playback will stall");
                }
            }
        });
    }

    fn on_chunk(&mut self, index: usize, bytes: Bytes) {
        let Some(stream) = self.phase.stream_mut() else {
            debug!(chunk = index, "Chunk without pipeline dropped");
            return;
        };

        if let Err(e) = stream.assembler.append(index, bytes) {
            warn!(chunk = index, error = %e, "Media buffer rejected chunk");
        }
    }

    fn on_append_completed(&mut self) {
        let Some(stream) = self.phase.stream_mut() else {
            return;
        };
        let Some(completed) = stream.assembler.on_update_end() else {
            debug!("Update end without an append in flight");
            return;
        };

        let is_last = stream.loaded.timeline.last_index() == Some(completed);
        if is_last {
            stream.assembler.close();
            debug!(chunk = completed, "Final chunk appended, stream closed");
        }

        if matches!(self.phase, Phase::Buffering { .. }) {
            self.finish_buffering();
        } else if !is_last {
            let position = self.output.position();
            self.evaluate_schedule(position);
        }
    }

    /// First append landed: position the output and settle play intent
    fn finish_buffering(&mut self) {
        let Phase::Buffering {
            stream,
            target,
            resume,
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return;
        };

        let chunk_start = stream
            .loaded
            .timeline
            .start(stream.current_chunk)
            .unwrap_or(0.0);
        let snap = target.max(chunk_start + self.config.first_append_epsilon_secs);
        if let Err(e) = self.output.set_position(snap) {
            warn!(position = snap, error = %e, "Failed to position output");
        }
        self.current_time = target;

        let transport = match resume {
            Resume::Autoplay => {
                self.gate.claim(&self.output);
                self.start_output()
            }
            Resume::KeepPlaying => self.start_output(),
            Resume::StayPaused => Transport::Paused,
        };

        debug!(position = snap, ?transport, "First append complete");

        self.phase = Phase::Ready { stream, transport };
        self.emit_state();
        self.emit_position();
        self.publish_state();
        self.publish_position();

        let position = self.output.position();
        self.evaluate_schedule(position);
    }

    fn start_output(&self) -> Transport {
        match self.output.play() {
            Ok(()) => Transport::Playing,
            Err(e) => {
                warn!(error = %e, "Output refused to play");
                Transport::Paused
            }
        }
    }

    /// Request the next chunk once the clock crosses the lookahead threshold
    fn evaluate_schedule(&mut self, position: f64) {
        let ratio = self.config.lookahead_ratio;
        let Phase::Ready { stream, .. } = &mut self.phase else {
            return;
        };

        let next = stream.current_chunk + 1;
        if next >= stream.loaded.chunks.len() {
            return;
        }

        let threshold = stream
            .loaded
            .timeline
            .append_threshold(stream.current_chunk, ratio);
        if position < threshold {
            return;
        }

        stream.current_chunk = next;
        let url = stream.loaded.chunks[next].url.clone();

        debug!(chunk = next, position, threshold, "Lookahead threshold crossed");
        self.spawn_fetch(next, url);
    }

    fn on_output(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::TimeUpdate { position } => {
                if !matches!(self.phase, Phase::Ready { .. }) {
                    return;
                }
                self.current_time = position;
                self.evaluate_schedule(position);
                self.emit_position();
                self.publish_position();
            }
            OutputEvent::Playing => self.set_transport(Transport::Playing),
            OutputEvent::Paused => self.set_transport(Transport::Paused),
            OutputEvent::Ended => {
                if matches!(self.phase, Phase::Ready { .. }) {
                    self.on_track_end();
                }
            }
        }
    }

    fn set_transport(&mut self, new: Transport) {
        let Phase::Ready { transport, .. } = &mut self.phase else {
            return;
        };
        if *transport == new {
            return;
        }
        *transport = new;
        self.emit_state();
        self.publish_state();
    }

    fn on_track_end(&mut self) {
        let Phase::Ready { stream, .. } = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return;
        };
        self.phase = Phase::Ended { stream };

        if let Some(track_id) = self.track.as_ref().map(|t| t.id) {
            info!(track_id = %track_id, "Track finished");
            self.emit(PlayerEvent::TrackFinished { track_id });
        }
        self.emit_state();
        self.publish_state();

        self.next();
    }

    fn on_transport(&mut self, command: TransportCommand) {
        debug!(?command, "Transport command");
        match command {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::NextTrack => self.next(),
            TransportCommand::PreviousTrack => self.previous(),
            TransportCommand::SeekTo { time } => self.seek(time.unwrap_or(self.current_time)),
            TransportCommand::SeekBackward { offset } => {
                self.seek((self.current_time - offset).max(0.0));
            }
            TransportCommand::SeekForward { offset } => {
                let duration = self.duration();
                let target = self.current_time + offset;
                self.seek(if duration > 0.0 {
                    target.min(duration)
                } else {
                    target
                });
            }
        }
    }

    // ===== Seeking =====

    /// Seek to `time` seconds
    ///
    /// Within the chunk under the output position this only moves the
    /// output; anywhere else the pipeline is rebuilt at the target chunk.
    pub fn seek(&mut self, time: f64) {
        let target = self.clamp_with(self.phase.stream().map(|s| &s.loaded.timeline), time);

        match &mut self.phase {
            Phase::Idle | Phase::Disposed => {
                debug!("Seek without a track ignored");
            }
            Phase::LoadingManifest { start_at, .. } => {
                *start_at = target;
                self.current_time = target;
                self.emit_position();
            }
            Phase::Buffering { resume, .. } => {
                let resume = *resume;
                self.hard_seek(target, resume);
            }
            Phase::Ready { stream, .. } | Phase::Ended { stream } => {
                let timeline = &stream.loaded.timeline;
                let target_chunk = timeline.find_chunk_by_time(target);
                let resident_chunk = timeline.find_chunk_by_time(self.output.position());

                if target_chunk == resident_chunk {
                    self.soft_seek(target);
                } else {
                    let resume = self.resume_intent();
                    self.hard_seek(target, resume);
                }
            }
        }
    }

    fn soft_seek(&mut self, target: f64) {
        debug!(target, "Soft seek");

        if let Err(e) = self.output.set_position(target) {
            warn!(target, error = %e, "Failed to move output position");
        }
        self.current_time = target;

        if matches!(self.phase, Phase::Ended { .. }) {
            if let Phase::Ended { stream } = std::mem::replace(&mut self.phase, Phase::Idle) {
                self.phase = Phase::Ready {
                    stream,
                    transport: Transport::Paused,
                };
                self.emit_state();
            }
        }

        self.emit_position();
        self.publish_position();
    }

    /// Tear down and rebuild the pipeline at `target` under a new session
    fn hard_seek(&mut self, target: f64, resume: Resume) {
        if !self.output.is_paused() {
            self.output.pause();
        }

        let Some(loaded) = self.invalidate() else {
            return;
        };

        debug!(target, ?resume, session = %self.scope.id(), "Hard seek");

        self.current_time = target;
        self.start_pipeline(loaded, target, resume);
        self.emit_position();
        self.publish_state();
        self.publish_position();
    }

    /// Play intent to carry across a rebuild
    fn resume_intent(&self) -> Resume {
        match &self.phase {
            Phase::LoadingManifest { resume, .. } | Phase::Buffering { resume, .. } => *resume,
            Phase::Ready {
                transport: Transport::Playing,
                ..
            } => Resume::KeepPlaying,
            _ => Resume::StayPaused,
        }
    }

    /// Clamp to `[0, duration]`, then keep the target out of the final chunk
    fn clamp_with(&self, timeline: Option<&ChunkTimeline>, time: f64) -> f64 {
        let duration = timeline
            .map(ChunkTimeline::total_duration)
            .filter(|d| *d > 0.0)
            .or_else(|| self.track.as_ref().and_then(Track::known_duration))
            .unwrap_or(time);

        let clamped = time.max(0.0).min(duration.max(0.0));

        match timeline {
            Some(timeline) => {
                timeline.clamp_to_last_chunk_start(clamped, self.config.tail_seek_margin_secs)
            }
            None => clamped,
        }
    }

    // ===== Transport =====

    /// Start playback, claiming exclusivity
    ///
    /// While loading this arms autoplay; after the end it restarts the track.
    pub fn play(&mut self) {
        match &mut self.phase {
            Phase::Idle | Phase::Disposed => debug!("Play without a track ignored"),
            Phase::LoadingManifest { resume, .. } | Phase::Buffering { resume, .. } => {
                *resume = Resume::Autoplay;
            }
            Phase::Ready { .. } => {
                self.gate.claim(&self.output);
                let transport = self.start_output();
                self.set_transport(transport);
            }
            Phase::Ended { .. } => {
                self.current_time = 0.0;
                self.hard_seek(0.0, Resume::Autoplay);
            }
        }
    }

    /// Pause playback (disarms autoplay while loading)
    pub fn pause(&mut self) {
        match &mut self.phase {
            Phase::LoadingManifest { resume, .. } | Phase::Buffering { resume, .. } => {
                *resume = Resume::StayPaused;
            }
            Phase::Ready { .. } => {
                self.output.pause();
                self.set_transport(Transport::Paused);
            }
            _ => {}
        }
    }

    pub fn toggle_play(&mut self) {
        if self.wants_playback() {
            self.pause();
        } else {
            self.play();
        }
    }

    fn wants_playback(&self) -> bool {
        match &self.phase {
            Phase::LoadingManifest { resume, .. } | Phase::Buffering { resume, .. } => {
                *resume != Resume::StayPaused
            }
            Phase::Ready { transport, .. } => *transport == Transport::Playing,
            _ => false,
        }
    }

    // ===== Playlist navigation =====

    /// Ask for the next playlist item
    pub fn next(&mut self) {
        if matches!(self.phase, Phase::Disposed) {
            return;
        }
        match self.navigator.next() {
            Some(index) => self.emit(PlayerEvent::PlayIndexRequested { index }),
            None => self.defer_advance(Direction::Next),
        }
    }

    /// Ask for the previous item, or restart the track if well into it
    pub fn previous(&mut self) {
        if matches!(self.phase, Phase::Disposed) || self.navigator.is_empty() {
            return;
        }
        if self.current_time > self.config.restart_threshold_secs {
            self.seek(0.0);
            return;
        }
        match self.navigator.prev() {
            Some(index) => self.emit(PlayerEvent::PlayIndexRequested { index }),
            None => self.defer_advance(Direction::Prev),
        }
    }

    fn defer_advance(&mut self, direction: Direction) {
        if self.navigator.request_more(direction) {
            debug!(?direction, "Playlist boundary, requesting more items");
            self.emit(PlayerEvent::LoadMoreRequested);
        }
    }

    /// Ask the UI to navigate back
    pub fn request_back(&mut self) {
        self.emit(PlayerEvent::BackRequested);
    }

    /// The playlist changed length or selection
    ///
    /// Resolves an advance deferred by a boundary next/prev.
    pub fn update_playlist(&mut self, len: usize, current: Option<usize>) {
        if let Some(index) = self.navigator.set_playlist(len, current) {
            self.emit(PlayerEvent::PlayIndexRequested { index });
        }
    }

    /// The selection moved without the playlist changing
    pub fn set_current_index(&mut self, current: Option<usize>) {
        self.navigator.set_current(current);
    }

    pub fn toggle_shuffle(&mut self) {
        let shuffle = !self.navigator.is_shuffle();
        self.navigator.set_shuffle(shuffle);
    }

    pub fn toggle_repeat(&mut self) {
        let repeat = !self.navigator.is_repeat();
        self.navigator.set_repeat(repeat);
    }

    // ===== Volume =====

    /// Set volume (clamped to 0.0 - 1.0); exactly 0 also mutes
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.volume = volume;
        self.muted = volume == 0.0;
        self.output.set_volume(volume);
        self.output.set_muted(self.muted);
        self.emit_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.output.set_muted(self.muted);
        self.emit_volume();
    }

    // ===== Lifecycle =====

    /// Cancel all work, tear down the pipeline and release exclusivity
    ///
    /// The engine ignores everything afterwards.
    pub fn dispose(&mut self) {
        if matches!(self.phase, Phase::Disposed) {
            return;
        }
        self.invalidate();
        self.output.pause();
        self.gate.release(&self.output);
        self.phase = Phase::Disposed;
        info!("Engine disposed");
    }

    /// Advance the session and tear down the pipeline
    ///
    /// Returns the manifest of the torn-down pipeline, if there was one.
    fn invalidate(&mut self) -> Option<Loaded> {
        self.scope.advance();
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Buffering { stream, .. } | Phase::Ready { stream, .. } | Phase::Ended { stream } => {
                Some(stream.dismantle())
            }
            Phase::Disposed => {
                self.phase = Phase::Disposed;
                None
            }
            _ => None,
        }
    }

    /// Give up on the current load and report why
    fn abandon(&mut self, message: String) {
        self.scope.advance();
        self.phase = Phase::Idle;
        self.emit(PlayerEvent::Error { message });
        self.emit_state();
        self.publish_state();
    }

    // ===== Queries =====

    pub fn state(&self) -> EngineState {
        self.phase.state()
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn current_session(&self) -> Session {
        self.scope.id()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Ready {
                transport: Transport::Playing,
                ..
            }
        )
    }

    pub fn is_loading_audio(&self) -> bool {
        matches!(
            self.phase,
            Phase::LoadingManifest { .. } | Phase::Buffering { .. }
        )
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_shuffle(&self) -> bool {
        self.navigator.is_shuffle()
    }

    pub fn is_repeat(&self) -> bool {
        self.navigator.is_repeat()
    }

    pub fn can_next(&self) -> bool {
        self.navigator.can_next()
    }

    pub fn can_previous(&self) -> bool {
        self.current_time > self.config.restart_threshold_secs || self.navigator.can_previous()
    }

    pub fn navigator(&self) -> &PlaylistNavigator {
        &self.navigator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Identity of the live media buffer
    pub fn buffer_id(&self) -> Option<u64> {
        self.phase.stream().and_then(|s| s.assembler.buffer_id())
    }

    /// Highest chunk index requested in the live pipeline
    pub fn current_chunk(&self) -> Option<usize> {
        self.phase.stream().map(|s| s.current_chunk)
    }

    /// Chunk timeline of the loaded track
    pub fn timeline(&self) -> Option<&ChunkTimeline> {
        self.phase.stream().map(|s| &s.loaded.timeline)
    }

    /// Best known duration (0 when unknown)
    pub fn duration(&self) -> f64 {
        best_duration([
            self.track.as_ref().map_or(0.0, |t| t.duration_secs),
            self.timeline().map_or(0.0, ChunkTimeline::total_duration),
            self.output.duration().unwrap_or(0.0),
        ])
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state(),
            track_id: self.track.as_ref().map(|t| t.id),
            is_playing: self.is_playing(),
            current_time: self.current_time,
            duration: self.duration(),
            is_loading_audio: self.is_loading_audio(),
            volume: self.volume,
            is_muted: self.muted,
            is_repeat: self.is_repeat(),
            is_shuffle: self.is_shuffle(),
            can_next: self.can_next(),
            can_previous: self.can_previous(),
        }
    }

    /// Take every outbound event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Event emission =====

    fn emit(&mut self, event: PlayerEvent) {
        self.pending_events.push(event);
    }

    fn emit_state(&mut self) {
        let state = self.state();
        self.emit(PlayerEvent::StateChanged { state });
    }

    fn emit_position(&mut self) {
        let event = PlayerEvent::PositionChanged {
            position: self.current_time,
            duration: self.duration(),
        };
        self.emit(event);
    }

    fn emit_volume(&mut self) {
        let event = PlayerEvent::VolumeChanged {
            volume: self.volume,
            is_muted: self.muted,
        };
        self.emit(event);
    }

    fn status(&self) -> PlaybackStatus {
        if self.is_playing() {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }

    fn position_state(&self) -> PositionState {
        PositionState::new(self.duration(), self.current_time)
    }

    fn publish_metadata(&self) {
        if let Some(bridge) = &self.bridge {
            let metadata = self
                .track
                .as_ref()
                .map(|t| NowPlayingMetadata::new(t.title.clone(), t.artist.clone(), t.artwork()));
            bridge.publish_metadata(metadata.as_ref());
        }
    }

    fn publish_state(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.publish_state(self.status(), &self.position_state());
        }
    }

    fn publish_position(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.publish_position(self.status(), &self.position_state());
        }
    }
}

impl Drop for StreamingEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

