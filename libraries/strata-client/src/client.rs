//! Catalog HTTP client.

use crate::error::{ClientError, Result};
use crate::types::{CatalogConfig, SongChunkDto, SongDto, SongQuery};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use strata_core::{Chunk, TrackId};
use strata_playback::{ChunkSource, ManifestProvider, PlaybackError};
use tracing::debug;
use url::Url;

/// Client for the song catalog API.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use strata_client::{CatalogClient, CatalogConfig, SongQuery};
///
/// let client = CatalogClient::new(CatalogConfig::new("https://api.example.com"))?;
/// let songs = client.find_songs(&SongQuery::new("blue").page(1, 10)).await?;
/// let chunks = client.song_chunks(songs[0].id.into()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    page_size: usize,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let trimmed = config.base_url.trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        // Trailing slash so relative chunk URLs join under the API path
        let base_url = Url::parse(&format!("{}/", trimmed))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("Strata/{} (Player)", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            page_size: config.page_size.max(1),
        })
    }

    /// Base URL without the trailing slash.
    pub fn url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Songs per search page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Search songs.
    pub async fn find_songs(&self, query: &SongQuery) -> Result<Vec<SongDto>> {
        let url = self.endpoint("song");
        let params = query.params();
        debug!(url = %url, ?params, "Searching songs");

        let songs: Vec<SongDto> = self
            .get_json(self.http.get(&url).query(&params), "song list")
            .await?;

        debug!(count = songs.len(), "Fetched songs");
        Ok(songs)
    }

    /// Get one song by id.
    pub async fn find_song(&self, id: TrackId) -> Result<SongDto> {
        let url = self.endpoint(&format!("song/{}", id));
        debug!(url = %url, "Fetching song");

        self.get_json(self.http.get(&url), "song")
            .await
            .map_err(|e| match e {
                ClientError::ServerError { status: 404, .. } => ClientError::NotFound(id.to_string()),
                e => e,
            })
    }

    /// Get the raw chunk manifest of a song, in playback order.
    pub async fn song_chunks(&self, id: TrackId) -> Result<Vec<SongChunkDto>> {
        let url = self.endpoint(&format!("song-chunk/{}", id));
        debug!(url = %url, "Fetching chunk manifest");

        let chunks: Vec<SongChunkDto> = self.get_json(self.http.get(&url), "chunk manifest").await?;

        debug!(track_id = %id, chunks = chunks.len(), "Fetched chunk manifest");
        Ok(chunks)
    }

    /// Get the chunk manifest of a song as domain chunks with absolute URLs.
    pub async fn manifest(&self, id: TrackId) -> Result<Vec<Chunk>> {
        self.song_chunks(id)
            .await?
            .into_iter()
            .map(|dto| -> Result<Chunk> {
                let url = self.resolve(&dto.url)?;
                Ok(dto.into_chunk(id, url))
            })
            .collect()
    }

    /// Download a chunk payload.
    pub async fn fetch_chunk(&self, url: &str) -> Result<Bytes> {
        let url = self.resolve(url)?;
        debug!(url = %url, "Fetching chunk");

        let response = self.http.get(&url).send().await.map_err(unreachable_or)?;
        let status = response.status();

        if status.is_success() {
            Ok(response.bytes().await?)
        } else {
            Err(server_error(status, response).await)
        }
    }

    /// Resolve a possibly relative URL against the base URL.
    pub fn resolve(&self, url: &str) -> Result<String> {
        Ok(self.base_url.join(url.trim_start_matches('/'))?.to_string())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url(), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().await.map_err(unreachable_or)?;
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse {}: {}", what, e))
            })
        } else {
            Err(server_error(status, response).await)
        }
    }
}

fn unreachable_or(e: reqwest::Error) -> ClientError {
    if e.is_connect() || e.is_timeout() {
        ClientError::ServerUnreachable(e.to_string())
    } else {
        ClientError::Request(e)
    }
}

async fn server_error(status: StatusCode, response: reqwest::Response) -> ClientError {
    let message = response.text().await.unwrap_or_default();
    ClientError::ServerError {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ManifestProvider for CatalogClient {
    async fn chunks_for(&self, track_id: TrackId) -> strata_playback::Result<Vec<Chunk>> {
        self.manifest(track_id)
            .await
            .map_err(|e| PlaybackError::Manifest {
                track_id: track_id.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ChunkSource for CatalogClient {
    async fn fetch(&self, url: &str) -> strata_playback::Result<Bytes> {
        self.fetch_chunk(url)
            .await
            .map_err(|e| PlaybackError::ChunkFetch {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}
