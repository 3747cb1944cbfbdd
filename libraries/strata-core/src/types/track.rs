/// Track domain type
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Playable catalog track
///
/// Owned by the playlist; the engine keeps a clone for as long as the track
/// is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Free-form description from the catalog
    #[serde(default)]
    pub description: String,

    /// Lyrics (may be empty)
    #[serde(default)]
    pub lyrics: String,

    /// Duration advertised by the catalog, in seconds (0 when unknown)
    #[serde(default)]
    pub duration_secs: f64,

    /// Artwork URL (may be empty)
    #[serde(default)]
    pub thumbnail_url: String,
}

impl Track {
    /// Create a track with only the fields needed for display
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            description: String::new(),
            lyrics: String::new(),
            duration_secs: 0.0,
            thumbnail_url: String::new(),
        }
    }

    /// Set the advertised duration
    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Set the artwork URL
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = url.into();
        self
    }

    /// Advertised duration if it is usable for timeline math
    pub fn known_duration(&self) -> Option<f64> {
        (self.duration_secs.is_finite() && self.duration_secs > 0.0).then_some(self.duration_secs)
    }

    /// Artwork URLs for now-playing surfaces (empty when there is no thumbnail)
    pub fn artwork(&self) -> Vec<String> {
        if self.thumbnail_url.is_empty() {
            Vec::new()
        } else {
            vec![self.thumbnail_url.clone()]
        }
    }
}
