//! Playback session tokens
//!
//! Every track load and every hard seek starts a new session. Asynchronous
//! work is tagged with the session it was started under; completions tagged
//! with anything but the current session are dropped without touching state.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Monotonically increasing session identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Session(u64);

impl Session {
    /// Raw token value
    pub fn get(self) -> u64 {
        self.0
    }

    /// The session that follows this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The current session plus the cancellation token shared by its work
#[derive(Debug, Default)]
pub struct SessionScope {
    id: Session,
    cancel: CancellationToken,
}

impl SessionScope {
    /// Start at session 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session
    pub fn id(&self) -> Session {
        self.id
    }

    /// Token to hand to work started under the current session
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether `session` is still the current one
    pub fn is_current(&self, session: Session) -> bool {
        self.id == session
    }

    /// Invalidate the current session and start the next one
    ///
    /// Cancels every fetch started under the old session before the new
    /// token exists.
    pub fn advance(&mut self) -> Session {
        self.cancel.cancel();
        self.id = self.id.next();
        self.cancel = CancellationToken::new();
        self.id
    }
}
