//! Types for catalog API requests and responses.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strata_core::{Chunk, ChunkId, Track, TrackId};

/// Configuration for connecting to a catalog server.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (e.g., "https://api.example.com")
    pub base_url: String,
    /// Songs per search page
    pub page_size: usize,
    /// Whole-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl CatalogConfig {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    /// Create a config with default paging and timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }
}

// =============================================================================
// Songs
// =============================================================================

/// Song as returned by `/song`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDto {
    pub id: u64,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    /// Seconds; absent or 0 when the catalog does not know
    #[serde(default)]
    pub duration: Option<f64>,
    /// Artwork URL
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl From<SongDto> for Track {
    fn from(song: SongDto) -> Self {
        Self {
            id: TrackId(song.id),
            title: song.title,
            artist: song.artist,
            description: song.description.unwrap_or_default(),
            lyrics: song.lyrics.unwrap_or_default(),
            duration_secs: song.duration.unwrap_or(0.0),
            thumbnail_url: song.thumbnail.unwrap_or_default(),
        }
    }
}

/// Chunk manifest entry as returned by `/song-chunk/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongChunkDto {
    pub id: u64,
    /// Absolute, or relative to the catalog base URL
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub song: Option<SongDto>,
}

impl SongChunkDto {
    /// Convert to a domain chunk of `track_id` with its URL already resolved
    pub fn into_chunk(self, track_id: TrackId, url: String) -> Chunk {
        Chunk::new(
            ChunkId(self.id),
            url,
            self.duration.unwrap_or(0.0),
            track_id,
        )
    }
}

// =============================================================================
// Search
// =============================================================================

/// Sort order accepted by `/song?orderBy=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SongOrder {
    #[default]
    TitleAsc,
    TitleDesc,
    ArtistAsc,
    ArtistDesc,
    DurationAsc,
    DurationDesc,
}

impl SongOrder {
    pub const ALL: [Self; 6] = [
        Self::TitleAsc,
        Self::TitleDesc,
        Self::ArtistAsc,
        Self::ArtistDesc,
        Self::DurationAsc,
        Self::DurationDesc,
    ];

    /// Wire form, e.g. `title:asc`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TitleAsc => "title:asc",
            Self::TitleDesc => "title:desc",
            Self::ArtistAsc => "artist:asc",
            Self::ArtistDesc => "artist:desc",
            Self::DurationAsc => "duration:asc",
            Self::DurationDesc => "duration:desc",
        }
    }
}

impl fmt::Display for SongOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongOrder {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| ClientError::ParseError(format!("Unknown sort order: {}", s)))
    }
}

/// Filters for `/song`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongQuery {
    /// Title search text (omitted when empty)
    pub title: String,
    pub order_by: SongOrder,
    pub limit: Option<usize>,
    /// 1-based page number
    pub page: Option<usize>,
}

impl SongQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn order_by(mut self, order: SongOrder) -> Self {
        self.order_by = order;
        self
    }

    /// Restrict to one page of `limit` songs
    #[must_use]
    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Query string pairs, empty values left out
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.title.is_empty() {
            params.push(("title", self.title.clone()));
        }
        params.push(("orderBy", self.order_by.to_string()));
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}
