//! Paged song search backing the player's playlist.

use crate::client::CatalogClient;
use crate::error::Result;
use crate::types::SongQuery;
use async_trait::async_trait;
use strata_core::Track;
use strata_playback::{PlaybackError, PlaylistSource};
use tokio::sync::Mutex;
use tracing::debug;

struct Cursor {
    query: SongQuery,
    /// 1-based page the next request asks for
    next_page: usize,
    has_more: bool,
}

/// Pages through a song search, one page per [`PlaylistSource::load_more`].
///
/// A page shorter than the page size ends the search; later calls return
/// an empty page without touching the network. A failed request leaves the
/// cursor in place so the same page is retried.
pub struct PagedSongs {
    client: CatalogClient,
    cursor: Mutex<Cursor>,
}

impl PagedSongs {
    pub fn new(client: CatalogClient, query: SongQuery) -> Self {
        Self {
            client,
            cursor: Mutex::new(Cursor {
                query,
                next_page: 1,
                has_more: true,
            }),
        }
    }

    /// Whether another page may exist
    pub async fn has_more(&self) -> bool {
        self.cursor.lock().await.has_more
    }

    /// Page the next call will request
    pub async fn next_page(&self) -> usize {
        self.cursor.lock().await.next_page
    }

    /// Start over with a new search
    pub async fn reset(&self, query: SongQuery) {
        let mut cursor = self.cursor.lock().await;
        cursor.query = query;
        cursor.next_page = 1;
        cursor.has_more = true;
    }

    /// Fetch the next page
    pub async fn next(&self) -> Result<Vec<Track>> {
        // Held across the request so concurrent callers never skip a page
        let mut cursor = self.cursor.lock().await;
        if !cursor.has_more {
            debug!("Search exhausted, no request made");
            return Ok(Vec::new());
        }

        let page_size = self.client.page_size();
        let query = cursor.query.clone().page(cursor.next_page, page_size);
        let songs = self.client.find_songs(&query).await?;

        cursor.has_more = songs.len() == page_size;
        debug!(
            page = cursor.next_page,
            count = songs.len(),
            has_more = cursor.has_more,
            "Loaded search page"
        );
        cursor.next_page += 1;

        Ok(songs.into_iter().map(Track::from).collect())
    }
}

#[async_trait]
impl PlaylistSource for PagedSongs {
    async fn load_more(&self) -> strata_playback::Result<Vec<Track>> {
        self.next()
            .await
            .map_err(|e| PlaybackError::Playlist(e.to_string()))
    }
}
