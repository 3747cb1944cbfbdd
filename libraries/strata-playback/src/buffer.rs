//! Incremental media buffer assembly
//!
//! A [`MediaBuffer`] is the platform's streaming buffer (a Media Source
//! Extensions `SourceBuffer`, a native decoder queue, a test fake). It accepts
//! one append at a time and reports completion asynchronously through an
//! [`AppendSignal`]. [`BufferAssembler`] serializes chunk payloads into it in
//! strictly ascending index order.

use crate::error::Result;
use crate::events::{EngineEvent, EventSender};
use crate::session::Session;
use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Platform streaming buffer, bound to one output for one session
///
/// Appended bytes are laid out sequentially starting at the timestamp offset.
pub trait MediaBuffer: Send {
    /// Identity of this buffer instance
    fn id(&self) -> u64;

    /// Declare the total media duration
    fn set_duration(&mut self, seconds: f64) -> Result<()>;

    /// Timeline position at which the next appended bytes start
    fn set_timestamp_offset(&mut self, seconds: f64) -> Result<()>;

    /// Start appending `bytes`
    ///
    /// Completion is reported through the [`AppendSignal`] the buffer was
    /// opened with.
    fn append(&mut self, bytes: Bytes) -> Result<()>;

    /// Whether an append is in progress
    fn is_updating(&self) -> bool;

    /// Whether the buffer still accepts data
    fn is_open(&self) -> bool;

    /// Abort the in-progress append
    fn abort(&mut self);

    /// Mark the stream complete
    fn end_of_stream(&mut self) -> Result<()>;

    /// Detach from the output and release platform handles
    fn release(&mut self);
}

/// Opens media buffers on the output the backend is bound to
pub trait MediaBackend: Send + Sync {
    /// Open a fresh buffer, replacing whatever the output was playing
    fn open_buffer(&self, signal: AppendSignal) -> Result<Box<dyn MediaBuffer>>;
}

/// Completion callback handed to a [`MediaBuffer`]
///
/// Posts [`EngineEvent::AppendCompleted`] tagged with the session the buffer
/// was opened under.
#[derive(Debug, Clone)]
pub struct AppendSignal {
    session: Session,
    events: EventSender,
}

impl AppendSignal {
    pub fn new(session: Session, events: EventSender) -> Self {
        Self { session, events }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    /// Report that the in-flight append finished
    pub fn update_end(&self) {
        // Receiver gone means the engine was dropped
        let _ = self.events.send(EngineEvent::AppendCompleted {
            session: self.session,
        });
    }
}

/// Serializes chunk payloads into a [`MediaBuffer`]
///
/// At most one append is in flight. Payloads that arrive early wait in a
/// queue until every lower index has entered the buffer; duplicates and
/// indices below the next expected one are dropped.
pub struct BufferAssembler {
    buffer: Option<Box<dyn MediaBuffer>>,
    in_flight: Option<usize>,
    pending: BTreeMap<usize, Bytes>,
    next_index: usize,
    closed: bool,
}

impl BufferAssembler {
    /// Open a buffer whose first append will be chunk `first_index`
    ///
    /// `total_duration` of zero (or anything unusable) declares
    /// `unknown_duration` instead.
    pub fn open(
        backend: &dyn MediaBackend,
        signal: AppendSignal,
        total_duration: f64,
        first_index: usize,
        unknown_duration: f64,
    ) -> Result<Self> {
        let mut buffer = backend.open_buffer(signal)?;

        let declared = if total_duration.is_finite() && total_duration > 0.0 {
            total_duration
        } else {
            unknown_duration
        };
        buffer.set_duration(declared)?;

        debug!(buffer = buffer.id(), declared, first_index, "Media buffer opened");

        Ok(Self {
            buffer: Some(buffer),
            in_flight: None,
            pending: BTreeMap::new(),
            next_index: first_index,
            closed: false,
        })
    }

    /// Identity of the underlying buffer (None after teardown)
    pub fn buffer_id(&self) -> Option<u64> {
        self.buffer.as_ref().map(|b| b.id())
    }

    /// Index the next append must carry
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Index currently being appended
    pub fn in_flight(&self) -> Option<usize> {
        self.in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Place subsequent appends at `offset` on the track timeline
    pub fn set_timeline_offset(&mut self, offset: f64) -> Result<()> {
        match self.buffer.as_mut() {
            Some(buffer) => buffer.set_timestamp_offset(offset),
            None => Ok(()),
        }
    }

    /// Queue the payload of chunk `index` and start it if it is next
    ///
    /// An error means the buffer refused the bytes; the payload is dropped
    /// and the stream stalls at that index.
    pub fn append(&mut self, index: usize, bytes: Bytes) -> Result<()> {
        if self.closed || self.buffer.is_none() {
            debug!(chunk = index, "Append after close dropped");
            return Ok(());
        }

        if index < self.next_index
            || self.in_flight == Some(index)
            || self.pending.contains_key(&index)
        {
            debug!(chunk = index, next = self.next_index, "Duplicate chunk dropped");
            return Ok(());
        }

        self.pending.insert(index, bytes);
        self.pump()
    }

    /// Mark the in-flight append complete and start the next queued one
    ///
    /// Returns the index that completed.
    pub fn on_update_end(&mut self) -> Option<usize> {
        let completed = self.in_flight.take();

        if let Err(e) = self.pump() {
            warn!(error = %e, next = self.next_index, "Media buffer rejected queued chunk");
        }

        completed
    }

    /// Signal end of stream (once)
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(buffer) = self.buffer.as_mut() {
            if buffer.is_open() {
                if let Err(e) = buffer.end_of_stream() {
                    warn!(error = %e, "Failed to end media stream");
                }
            }
        }
    }

    /// Abort, end and release the buffer; drop queued payloads
    ///
    /// Safe to call repeatedly and from any state.
    pub fn teardown(&mut self) {
        self.pending.clear();
        self.in_flight = None;
        self.closed = true;

        let Some(mut buffer) = self.buffer.take() else {
            return;
        };

        if buffer.is_updating() {
            buffer.abort();
        }
        if buffer.is_open() {
            if let Err(e) = buffer.end_of_stream() {
                debug!(error = %e, "End of stream during teardown failed");
            }
        }
        buffer.release();

        debug!(buffer = buffer.id(), "Media buffer torn down");
    }

    fn pump(&mut self) -> Result<()> {
        if self.in_flight.is_some() {
            return Ok(());
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(());
        };
        let Some(bytes) = self.pending.remove(&self.next_index) else {
            return Ok(());
        };

        if !buffer.is_open() {
            debug!(chunk = self.next_index, "Buffer no longer open, payload dropped");
            return Ok(());
        }

        buffer.append(bytes)?;
        self.in_flight = Some(self.next_index);
        self.next_index += 1;
        Ok(())
    }
}

impl Drop for BufferAssembler {
    fn drop(&mut self) {
        self.teardown();
    }
}
