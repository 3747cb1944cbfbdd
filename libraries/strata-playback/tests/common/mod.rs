//! Shared fakes for engine integration tests
//!
//! The fakes record every call so tests can assert on what the engine did
//! to its collaborators without a real media stack.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use strata_core::{Chunk, ChunkId, Track, TrackId};
use strata_playback::{
    AppendSignal, AudioOutput, ChunkSource, EngineConfig, EngineDeps, EngineEvent, EventReceiver,
    EventSender, ExclusivityGate, ManifestProvider, MediaBackend, MediaBuffer, OutputEvent,
    PlaybackError, PlayerEvent, StreamingEngine,
};

// ===== Fixtures =====

pub fn track(id: u64) -> Track {
    Track::new(id, format!("Song {}", id), format!("Artist {}", id))
        .with_thumbnail(format!("https://img.example.com/{}.jpg", id))
}

pub fn chunk_url(track_id: u64, index: usize) -> String {
    format!("t{}-c{}", track_id, index)
}

pub fn manifest(track_id: u64, durations: &[f64]) -> Vec<Chunk> {
    durations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Chunk::new(
                ChunkId(track_id * 100 + i as u64),
                chunk_url(track_id, i),
                *d,
                TrackId(track_id),
            )
        })
        .collect()
}

// ===== Audio output =====

#[derive(Debug, Default)]
pub struct OutputState {
    pub paused: bool,
    pub position: f64,
    pub volume: f32,
    pub muted: bool,
    pub duration: Option<f64>,
    pub refuse_play: bool,
    pub play_calls: usize,
}

/// Output element that reports play/pause/time through the engine queue
pub struct FakeOutput {
    state: Mutex<OutputState>,
    events: Mutex<Option<EventSender>>,
}

impl FakeOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(OutputState {
                paused: true,
                volume: 1.0,
                ..Default::default()
            }),
            events: Mutex::new(None),
        })
    }

    pub fn connect(&self, events: EventSender) {
        *self.events.lock().unwrap() = Some(events);
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, OutputState> {
        self.state.lock().unwrap()
    }

    /// Advance the clock and report it
    pub fn tick(&self, position: f64) {
        self.state().position = position;
        self.post(OutputEvent::TimeUpdate { position });
    }

    /// Report natural end of media
    pub fn finish(&self) {
        self.state().paused = true;
        self.post(OutputEvent::Ended);
    }

    fn post(&self, event: OutputEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(EngineEvent::Output(event));
        }
    }
}

impl AudioOutput for FakeOutput {
    fn play(&self) -> strata_playback::Result<()> {
        {
            let mut state = self.state();
            state.play_calls += 1;
            if state.refuse_play {
                return Err(PlaybackError::Output("autoplay blocked".into()));
            }
            state.paused = false;
        }
        self.post(OutputEvent::Playing);
        Ok(())
    }

    fn pause(&self) {
        let was_playing = {
            let mut state = self.state();
            let was_playing = !state.paused;
            state.paused = true;
            was_playing
        };
        if was_playing {
            self.post(OutputEvent::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn position(&self) -> f64 {
        self.state().position
    }

    fn set_position(&self, seconds: f64) -> strata_playback::Result<()> {
        self.state().position = seconds;
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration
    }

    fn set_volume(&self, volume: f32) {
        self.state().volume = volume;
    }

    fn set_muted(&self, muted: bool) {
        self.state().muted = muted;
    }
}

// ===== Media buffer =====

#[derive(Debug, Default)]
pub struct BufferLog {
    pub opened: Vec<u64>,
    pub durations: Vec<(u64, f64)>,
    pub offsets: Vec<(u64, f64)>,
    /// (buffer id, payload as text)
    pub appended: Vec<(u64, String)>,
    pub ended: Vec<u64>,
    pub released: Vec<u64>,
    pub aborted: Vec<u64>,
}

impl BufferLog {
    pub fn appended_to(&self, buffer: u64) -> Vec<String> {
        self.appended
            .iter()
            .filter(|(id, _)| *id == buffer)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn offset_of(&self, buffer: u64) -> Option<f64> {
        self.offsets
            .iter()
            .rev()
            .find(|(id, _)| *id == buffer)
            .map(|(_, offset)| *offset)
    }
}

/// Buffer that completes every append immediately
pub struct FakeBuffer {
    id: u64,
    log: Arc<Mutex<BufferLog>>,
    signal: AppendSignal,
    open: bool,
}

impl MediaBuffer for FakeBuffer {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_duration(&mut self, seconds: f64) -> strata_playback::Result<()> {
        self.log.lock().unwrap().durations.push((self.id, seconds));
        Ok(())
    }

    fn set_timestamp_offset(&mut self, seconds: f64) -> strata_playback::Result<()> {
        self.log.lock().unwrap().offsets.push((self.id, seconds));
        Ok(())
    }

    fn append(&mut self, bytes: Bytes) -> strata_playback::Result<()> {
        let payload = String::from_utf8_lossy(&bytes).into_owned();
        self.log.lock().unwrap().appended.push((self.id, payload));
        self.signal.update_end();
        Ok(())
    }

    fn is_updating(&self) -> bool {
        false
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn abort(&mut self) {
        self.log.lock().unwrap().aborted.push(self.id);
    }

    fn end_of_stream(&mut self) -> strata_playback::Result<()> {
        self.open = false;
        self.log.lock().unwrap().ended.push(self.id);
        Ok(())
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released.push(self.id);
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub log: Arc<Mutex<BufferLog>>,
    next_id: AtomicU64,
    pub fail_open: AtomicBool,
}

impl FakeBackend {
    pub fn log(&self) -> std::sync::MutexGuard<'_, BufferLog> {
        self.log.lock().unwrap()
    }
}

impl MediaBackend for FakeBackend {
    fn open_buffer(&self, signal: AppendSignal) -> strata_playback::Result<Box<dyn MediaBuffer>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(PlaybackError::Backend("MediaSource unsupported".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.lock().unwrap().opened.push(id);
        Ok(Box::new(FakeBuffer {
            id,
            log: self.log.clone(),
            signal,
            open: true,
        }))
    }
}

// ===== Catalog =====

#[derive(Default)]
pub struct FakeManifests {
    manifests: Mutex<HashMap<TrackId, Vec<Chunk>>>,
}

impl FakeManifests {
    pub fn insert(&self, track_id: u64, durations: &[f64]) {
        self.manifests
            .lock()
            .unwrap()
            .insert(TrackId(track_id), manifest(track_id, durations));
    }
}

#[async_trait]
impl ManifestProvider for FakeManifests {
    async fn chunks_for(&self, track_id: TrackId) -> strata_playback::Result<Vec<Chunk>> {
        self.manifests
            .lock()
            .unwrap()
            .get(&track_id)
            .cloned()
            .ok_or_else(|| PlaybackError::Manifest {
                track_id: track_id.to_string(),
                message: "404 Not Found".into(),
            })
    }
}

/// Serves the URL itself as the payload
#[derive(Default)]
pub struct FakeChunks {
    pub requested: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<String>>,
}

impl FakeChunks {
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn fail(&self, url: impl Into<String>) {
        self.failing.lock().unwrap().insert(url.into());
    }
}

#[async_trait]
impl ChunkSource for FakeChunks {
    async fn fetch(&self, url: &str) -> strata_playback::Result<Bytes> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url) {
            return Err(PlaybackError::ChunkFetch {
                url: url.to_string(),
                message: "connection reset".into(),
            });
        }
        Ok(Bytes::copy_from_slice(url.as_bytes()))
    }
}

// ===== Harness =====

pub struct Harness {
    pub engine: StreamingEngine,
    pub rx: EventReceiver,
    pub output: Arc<FakeOutput>,
    pub backend: Arc<FakeBackend>,
    pub manifests: Arc<FakeManifests>,
    pub chunks: Arc<FakeChunks>,
    pub gate: Arc<ExclusivityGate>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Arc::new(ExclusivityGate::new()), EngineConfig::default())
    }

    pub fn with_gate(gate: Arc<ExclusivityGate>) -> Self {
        Self::with(gate, EngineConfig::default())
    }

    pub fn with(gate: Arc<ExclusivityGate>, config: EngineConfig) -> Self {
        let output = FakeOutput::new();
        let backend = Arc::new(FakeBackend::default());
        let manifests = Arc::new(FakeManifests::default());
        let chunks = Arc::new(FakeChunks::default());

        let deps = EngineDeps {
            output: output.clone(),
            backend: backend.clone(),
            manifests: manifests.clone(),
            chunks: chunks.clone(),
            gate: gate.clone(),
        };
        let (engine, rx) = StreamingEngine::new(deps, config);
        output.connect(engine.event_sender());

        Self {
            engine,
            rx,
            output,
            backend,
            manifests,
            chunks,
            gate,
        }
    }

    pub fn output_dyn(&self) -> Arc<dyn AudioOutput> {
        self.output.clone()
    }

    /// Run spawned tasks and feed their events until the queue stays empty
    pub async fn settle(&mut self) {
        settle(&mut self.engine, &mut self.rx).await;
    }

    pub async fn load(&mut self, track_id: u64, autoplay: bool) {
        self.engine.load_track(track(track_id), autoplay);
        self.settle().await;
    }

    pub async fn tick(&mut self, position: f64) {
        self.output.tick(position);
        self.settle().await;
    }

    pub fn current_buffer(&self) -> u64 {
        self.engine.buffer_id().expect("no live buffer")
    }

    pub fn appended_to_current(&self) -> Vec<String> {
        let buffer = self.current_buffer();
        self.backend.log().appended_to(buffer)
    }
}

pub async fn settle(engine: &mut StreamingEngine, rx: &mut EventReceiver) {
    for _ in 0..32 {
        tokio::task::yield_now().await;
        while let Ok(event) = rx.try_recv() {
            engine.handle_event(event);
        }
    }
}

pub fn has_event(events: &[PlayerEvent], wanted: &PlayerEvent) -> bool {
    events.iter().any(|e| e == wanted)
}
