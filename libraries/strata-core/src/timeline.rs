//! Chunk timeline
//!
//! Maps the ordered chunk list of a track onto one continuous playback
//! timeline. Built once per manifest and read-only afterwards.

use crate::types::Chunk;
use serde::{Deserialize, Serialize};

/// Cumulative start offsets and durations of a track's chunks
///
/// `start[0] = 0`, `start[i] = start[i - 1] + duration[i - 1]`,
/// `total = sum(duration)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkTimeline {
    starts: Vec<f64>,
    durations: Vec<f64>,
    total: f64,
}

impl ChunkTimeline {
    /// Build the timeline for a manifest
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        Self::from_durations(chunks.iter().map(Chunk::effective_duration))
    }

    /// Build a timeline from raw durations (already coerced)
    pub fn from_durations(durations: impl IntoIterator<Item = f64>) -> Self {
        let durations: Vec<f64> = durations.into_iter().collect();
        let mut starts = Vec::with_capacity(durations.len());
        let mut acc = 0.0;

        for duration in &durations {
            starts.push(acc);
            acc += duration;
        }

        Self {
            starts,
            durations,
            total: acc,
        }
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// True when the manifest had no chunks
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Sum of all chunk durations
    pub fn total_duration(&self) -> f64 {
        self.total
    }

    /// Start offset of chunk `index`
    pub fn start(&self, index: usize) -> Option<f64> {
        self.starts.get(index).copied()
    }

    /// Duration of chunk `index`
    pub fn duration(&self, index: usize) -> Option<f64> {
        self.durations.get(index).copied()
    }

    /// Index of the last chunk, if any
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Chunk covering `time`
    ///
    /// Returns the unique `i` with `start[i] <= time < start[i] + duration[i]`.
    /// Times outside every chunk (past the end, negative, NaN) map to the last
    /// chunk; an empty timeline maps everything to 0.
    pub fn find_chunk_by_time(&self, time: f64) -> usize {
        for index in (0..self.len()).rev() {
            let start = self.starts[index];
            let end = start + self.durations[index];
            if time >= start && time < end {
                return index;
            }
        }
        self.last_index().unwrap_or(0)
    }

    /// Clock position at which the chunk after `index` should be appended
    pub fn append_threshold(&self, index: usize, ratio: f64) -> f64 {
        self.start(index).unwrap_or(0.0) + self.duration(index).unwrap_or(0.0) * ratio
    }

    /// Keep a seek target out of the final chunk
    ///
    /// Targets at or past the start of the last chunk are snapped back to
    /// `margin` seconds before it (never below 0).
    pub fn clamp_to_last_chunk_start(&self, time: f64, margin: f64) -> f64 {
        let Some(last_start) = self.last_index().and_then(|i| self.start(i)) else {
            return time;
        };

        if time >= last_start {
            (last_start - margin).max(0.0)
        } else {
            time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkId, TrackId};

    fn chunks(durations: &[f64]) -> Vec<Chunk> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Chunk::new(ChunkId(i as u64), format!("c{}", i), *d, TrackId(1)))
            .collect()
    }

    #[test]
    fn starts_are_cumulative() {
        let timeline = ChunkTimeline::from_chunks(&chunks(&[5.0, 3.0, 4.0]));

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.start(0), Some(0.0));
        assert_eq!(timeline.start(1), Some(5.0));
        assert_eq!(timeline.start(2), Some(8.0));
        assert_eq!(timeline.total_duration(), 12.0);
    }

    #[test]
    fn missing_durations_fall_back_to_default() {
        let timeline = ChunkTimeline::from_chunks(&chunks(&[0.0, 2.0]));
        assert_eq!(timeline.start(1), Some(5.0));
        assert_eq!(timeline.total_duration(), 7.0);
    }

    #[test]
    fn find_chunk_by_time_uses_half_open_ranges() {
        let timeline = ChunkTimeline::from_durations([5.0, 5.0, 5.0]);

        assert_eq!(timeline.find_chunk_by_time(0.0), 0);
        assert_eq!(timeline.find_chunk_by_time(4.999), 0);
        assert_eq!(timeline.find_chunk_by_time(5.0), 1);
        assert_eq!(timeline.find_chunk_by_time(6.0), 1);
        assert_eq!(timeline.find_chunk_by_time(14.9), 2);
    }

    #[test]
    fn find_chunk_past_end_is_last_index() {
        let timeline = ChunkTimeline::from_durations([5.0, 5.0, 5.0]);
        assert_eq!(timeline.find_chunk_by_time(15.0), 2);
        assert_eq!(timeline.find_chunk_by_time(1000.0), 2);
    }

    #[test]
    fn empty_timeline() {
        let timeline = ChunkTimeline::default();
        assert!(timeline.is_empty());
        assert_eq!(timeline.find_chunk_by_time(3.0), 0);
        assert_eq!(timeline.clamp_to_last_chunk_start(3.0, 1.0), 3.0);
        assert_eq!(timeline.last_index(), None);
    }

    #[test]
    fn append_threshold_is_fraction_into_chunk() {
        let timeline = ChunkTimeline::from_durations([5.0, 5.0, 5.0]);
        assert!((timeline.append_threshold(0, 0.55) - 2.75).abs() < 1e-9);
        assert!((timeline.append_threshold(1, 0.55) - 7.75).abs() < 1e-9);
    }

    #[test]
    fn seek_into_last_chunk_snaps_back() {
        let timeline = ChunkTimeline::from_durations([5.0, 5.0, 5.0]);

        assert_eq!(timeline.clamp_to_last_chunk_start(9.0, 1.0), 9.0);
        assert_eq!(timeline.clamp_to_last_chunk_start(10.0, 1.0), 9.0);
        assert_eq!(timeline.clamp_to_last_chunk_start(14.0, 1.0), 9.0);
    }

    #[test]
    fn single_chunk_snap_never_goes_negative() {
        let timeline = ChunkTimeline::from_durations([5.0]);
        assert_eq!(timeline.clamp_to_last_chunk_start(2.0, 1.0), 0.0);
    }
}
