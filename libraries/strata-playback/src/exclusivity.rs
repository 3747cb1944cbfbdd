//! Cross-engine playback exclusivity
//!
//! Only one output may be audible at a time, however many engines exist.
//! Engines receive a gate by injection; [`ExclusivityGate::global`] provides
//! the process-wide instance for hosts that mount several players.

use crate::output::AudioOutput;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

/// Single slot holding the active output
#[derive(Default)]
pub struct ExclusivityGate {
    active: Mutex<Option<Arc<dyn AudioOutput>>>,
}

impl ExclusivityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily created process-wide gate
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ExclusivityGate>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Make `output` the active one, pausing the previous holder
    pub fn claim(&self, output: &Arc<dyn AudioOutput>) {
        let previous = {
            let mut active = self.lock();
            let previous = active.take();
            *active = Some(output.clone());
            previous
        };

        // Paused outside the lock: pausing posts into the other engine's queue
        if let Some(previous) = previous {
            if !same_output(&previous, output) {
                debug!("Pausing previously active output");
                previous.pause();
            }
        }
    }

    /// Clear the slot if `output` holds it
    ///
    /// Returns whether the slot was cleared.
    pub fn release(&self, output: &Arc<dyn AudioOutput>) -> bool {
        let mut active = self.lock();
        match active.as_ref() {
            Some(current) if same_output(current, output) => {
                *active = None;
                true
            }
            _ => false,
        }
    }

    /// Whether `output` currently holds the slot
    pub fn is_active(&self, output: &Arc<dyn AudioOutput>) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|current| same_output(current, output))
    }

    /// Current holder, if any
    pub fn active(&self) -> Option<Arc<dyn AudioOutput>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<dyn AudioOutput>>> {
        // The slot is a plain Option; a poisoned lock still holds a valid value
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn same_output(a: &Arc<dyn AudioOutput>, b: &Arc<dyn AudioOutput>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
