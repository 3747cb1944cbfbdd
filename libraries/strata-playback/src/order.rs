//! Playlist traversal order
//!
//! The order is the identity permutation when not shuffling, or a random
//! permutation with the current index pinned to position 0 when shuffling.
//! It is rebuilt from scratch on playlist-length or shuffle changes and never
//! patched in place.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which way a boundary-crossing advance was heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

/// Compute the traversal order for a playlist
///
/// Uses the thread-local RNG; see [`compute_order_with_rng`] for a
/// deterministic variant.
pub fn compute_order(len: usize, current: Option<usize>, shuffle: bool) -> Vec<usize> {
    compute_order_with_rng(len, current, shuffle, &mut thread_rng())
}

/// Compute the traversal order with a caller-supplied RNG
pub fn compute_order_with_rng<R: Rng + ?Sized>(
    len: usize,
    current: Option<usize>,
    shuffle: bool,
    rng: &mut R,
) -> Vec<usize> {
    if !shuffle {
        return (0..len).collect();
    }

    let head = current.filter(|&i| i < len);
    let mut rest: Vec<usize> = (0..len).filter(|&i| Some(i) != head).collect();
    rest.shuffle(rng);

    match head {
        Some(i) => std::iter::once(i).chain(rest).collect(),
        None => rest,
    }
}

/// Index to play after `current`
///
/// Without shuffle this is plain arithmetic and `order` is not consulted.
/// With shuffle, entries of `order` that are out of range for `len` are
/// skipped.
pub fn next_index(
    order: &[usize],
    len: usize,
    current: Option<usize>,
    shuffle: bool,
    repeat: bool,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current else {
        return Some(0);
    };

    if !shuffle {
        let next = current + 1;
        return if next < len {
            Some(next)
        } else if repeat {
            Some(0)
        } else {
            None
        };
    }

    let pos = order.iter().position(|&i| i == current)?;
    let valid = |i: &&usize| **i < len;

    order[pos + 1..]
        .iter()
        .find(valid)
        .or_else(|| if repeat { order.iter().find(valid) } else { None })
        .copied()
}

/// Index to play before `current`
pub fn prev_index(
    order: &[usize],
    len: usize,
    current: Option<usize>,
    shuffle: bool,
    repeat: bool,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = current?;

    if !shuffle {
        return if current > 0 {
            Some(current - 1)
        } else if repeat {
            Some(len - 1)
        } else {
            None
        };
    }

    let pos = order.iter().position(|&i| i == current)?;
    let valid = |i: &&usize| **i < len;

    order[..pos]
        .iter()
        .rev()
        .find(valid)
        .or_else(|| {
            if repeat {
                order.iter().rev().find(valid)
            } else {
                None
            }
        })
        .copied()
}

/// Playlist position tracking with deferred advance across page loads
///
/// When next/prev runs off the end of a partially loaded playlist the
/// navigator asks for more items once, remembers the direction, and resolves
/// the advance when the playlist is next updated.
#[derive(Debug, Clone, Default)]
pub struct PlaylistNavigator {
    len: usize,
    current: Option<usize>,
    order: Vec<usize>,
    shuffle: bool,
    repeat: bool,
    pending: Option<Direction>,
    last_len: usize,
    exhausted: bool,
}

impl PlaylistNavigator {
    /// Create a navigator with the given flags and an empty playlist
    pub fn new(shuffle: bool, repeat: bool) -> Self {
        Self {
            shuffle,
            repeat,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Whether a load-more request is outstanding
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the last load-more request came back without new items
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Update the playlist length and current index
    ///
    /// Rebuilds the order. If an advance was deferred waiting for more items,
    /// returns the index it resolves to (or marks the playlist exhausted when
    /// it did not grow).
    pub fn set_playlist(&mut self, len: usize, current: Option<usize>) -> Option<usize> {
        self.len = len;
        self.current = current.filter(|&i| i < len);
        self.rebuild_order();

        let grew = len > self.last_len;
        let mut resolved = None;

        if let Some(direction) = self.pending.take() {
            if grew {
                self.exhausted = false;
                resolved = match direction {
                    Direction::Next => self.next(),
                    Direction::Prev => self.prev(),
                };
                debug!(?direction, len, ?resolved, "Deferred advance resolved");
            } else {
                self.exhausted = true;
                debug!(len, "Playlist did not grow, end of playlist");
            }
        } else if grew {
            self.exhausted = false;
        }

        self.last_len = len;
        resolved
    }

    /// Update the current index
    ///
    /// With shuffle on, a move re-anchors the order at the new index.
    pub fn set_current(&mut self, current: Option<usize>) {
        let current = current.filter(|&i| i < self.len);
        let moved = current != self.current;
        self.current = current;
        if self.shuffle && moved {
            self.rebuild_order();
        }
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
        self.rebuild_order();
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn next(&self) -> Option<usize> {
        next_index(&self.order, self.len, self.current, self.shuffle, self.repeat)
    }

    pub fn prev(&self) -> Option<usize> {
        prev_index(&self.order, self.len, self.current, self.shuffle, self.repeat)
    }

    /// Record a boundary hit in `direction`
    ///
    /// Returns `true` when the caller should ask for more playlist items:
    /// nothing is already pending and the previous request did not come
    /// back empty.
    pub fn request_more(&mut self, direction: Direction) -> bool {
        if self.pending.is_some() || self.exhausted {
            return false;
        }
        self.pending = Some(direction);
        self.last_len = self.len;
        true
    }

    /// Whether a "next" action can do anything
    pub fn can_next(&self) -> bool {
        if self.next().is_some() {
            return true;
        }
        !self.is_pending() && !self.exhausted
    }

    /// Whether a "previous" action has an index to move to
    pub fn can_previous(&self) -> bool {
        self.prev().is_some()
    }

    fn rebuild_order(&mut self) {
        self.order = compute_order(self.len, self.current, self.shuffle);
    }
}
