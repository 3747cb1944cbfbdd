//! Tests for the catalog client.
//!
//! These tests use mock servers to verify request shapes and response
//! handling without a real catalog.

use strata_client::{CatalogClient, CatalogConfig, ClientError, PagedSongs, SongOrder, SongQuery};
use strata_core::TrackId;
use strata_playback::{ChunkSource, ManifestProvider, PlaybackError, PlaylistSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn song_json(id: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "",
        "artist": "Test Artist",
        "lyrics": "",
        "duration": 180,
        "thumbnail": format!("https://img.example.com/{}.jpg", id)
    })
}

fn chunk_json(id: u64, url: &str, duration: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "url": url,
        "duration": duration,
        "createdAt": "2024-05-01T12:00:00.000Z",
        "song": song_json(7, "Seven")
    })
}

fn client_for(server: &MockServer) -> CatalogClient {
    CatalogClient::new(CatalogConfig::new(server.uri())).unwrap()
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_empty_url_rejected() {
        match CatalogClient::new(CatalogConfig::new("")).unwrap_err() {
            ClientError::InvalidUrl(msg) => assert!(msg.contains("empty")),
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    #[test]
    fn test_url_without_scheme_rejected() {
        match CatalogClient::new(CatalogConfig::new("api.example.com")).unwrap_err() {
            ClientError::InvalidUrl(msg) => {
                assert!(msg.contains("http://") || msg.contains("https://"));
            }
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    #[test]
    fn test_trailing_slashes_removed() {
        let client = CatalogClient::new(CatalogConfig::new("https://api.example.com///")).unwrap();
        assert_eq!(client.url(), "https://api.example.com");
    }

    #[test]
    fn test_default_page_size() {
        let client = CatalogClient::new(CatalogConfig::new("https://api.example.com")).unwrap();
        assert_eq!(client.page_size(), 10);
    }
}

// =============================================================================
// Song Search Tests
// =============================================================================

mod song_search {
    use super::*;

    #[tokio::test]
    async fn test_find_songs_sends_filters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("title", "blue"))
            .and(query_param("orderBy", "artist:desc"))
            .and(query_param("limit", "10"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([song_json(1, "Blue"), song_json(2, "Bluer")])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let query = SongQuery::new("blue")
            .order_by(SongOrder::ArtistDesc)
            .page(2, 10);

        let songs = client.find_songs(&query).await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "Blue");
        assert_eq!(songs[1].duration, Some(180.0));
    }

    #[tokio::test]
    async fn test_empty_title_is_omitted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.find_songs(&SongQuery::default()).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let url = &requests[0].url;
        assert!(url.query_pairs().all(|(k, _)| k != "title"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "orderBy" && v == "title:asc"));
    }

    #[tokio::test]
    async fn test_find_song_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(song_json(42, "Answer")))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let song = client.find_song(TrackId(42)).await.unwrap();

        assert_eq!(song.id, 42);
        assert_eq!(song.title, "Answer");
    }

    #[tokio::test]
    async fn test_find_song_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Song not found"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        match client.find_song(TrackId(404)).await.unwrap_err() {
            ClientError::NotFound(id) => assert_eq!(id, "404"),
            e => panic!("Expected NotFound, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        match client.find_songs(&SongQuery::default()).await.unwrap_err() {
            ClientError::ParseError(msg) => assert!(msg.contains("song list")),
            e => panic!("Expected ParseError, got: {:?}", e),
        }
    }
}

// =============================================================================
// Manifest Tests
// =============================================================================

mod manifests {
    use super::*;

    #[tokio::test]
    async fn test_manifest_keeps_order_and_resolves_urls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song-chunk/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                chunk_json(70, "/chunks/7/0.mp3", 5.0),
                chunk_json(71, "https://cdn.example.com/7/1.mp3", 4.5),
                chunk_json(72, "chunks/7/2.mp3", 0.0),
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let chunks = client.chunks_for(TrackId(7)).await.unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].url, format!("{}/chunks/7/0.mp3", mock_server.uri()));
        assert_eq!(chunks[1].url, "https://cdn.example.com/7/1.mp3");
        assert_eq!(chunks[2].url, format!("{}/chunks/7/2.mp3", mock_server.uri()));
        assert_eq!(chunks[1].duration_secs, 4.5);
        // Zero duration falls back to the default chunk length
        assert_eq!(chunks[2].duration_secs, 5.0);
        assert!(chunks.iter().all(|c| c.track_id == TrackId(7)));
    }

    #[tokio::test]
    async fn test_missing_manifest_maps_to_playback_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song-chunk/9"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        match client.chunks_for(TrackId(9)).await.unwrap_err() {
            PlaybackError::Manifest { track_id, message } => {
                assert_eq!(track_id, "9");
                assert!(message.contains("500"));
            }
            e => panic!("Expected Manifest error, got: {:?}", e),
        }
    }
}

// =============================================================================
// Chunk Payload Tests
// =============================================================================

mod chunk_payloads {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_raw_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/chunks/7/0.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let url = format!("{}/chunks/7/0.mp3", mock_server.uri());
        let bytes = client.fetch(&url).await.unwrap();

        assert_eq!(&bytes[..], &[0xFF, 0xFB, 0x90, 0x00]);
    }

    #[tokio::test]
    async fn test_fetch_failure_maps_to_chunk_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/chunks/gone.mp3"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        match client.fetch("/chunks/gone.mp3").await.unwrap_err() {
            PlaybackError::ChunkFetch { url, .. } => assert_eq!(url, "/chunks/gone.mp3"),
            e => panic!("Expected ChunkFetch error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = CatalogClient::new(CatalogConfig::new("http://127.0.0.1:9")).unwrap();

        match client.fetch_chunk("/chunks/0.mp3").await.unwrap_err() {
            ClientError::ServerUnreachable(_) | ClientError::Request(_) => {}
            e => panic!("Expected ServerUnreachable or Request error, got: {:?}", e),
        }
    }
}

// =============================================================================
// Paging Tests
// =============================================================================

mod paging {
    use super::*;

    fn page_of(start: u64, count: u64) -> serde_json::Value {
        serde_json::Value::Array(
            (start..start + count)
                .map(|id| song_json(id, &format!("Song {}", id)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_pages_advance_until_short_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(1, 3)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(4, 1)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            CatalogClient::new(CatalogConfig::new(mock_server.uri()).with_page_size(3)).unwrap();
        let pages = PagedSongs::new(client, SongQuery::new("song"));

        let first = pages.load_more().await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].id, TrackId(1));
        assert_eq!(first[0].known_duration(), Some(180.0));
        assert!(pages.has_more().await);

        let second = pages.load_more().await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(!pages.has_more().await);

        // Exhausted: no third request
        assert!(pages.load_more().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_is_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(1, 10)))
            .mount(&mock_server)
            .await;

        let pages = PagedSongs::new(client_for(&mock_server), SongQuery::default());

        match pages.load_more().await.unwrap_err() {
            PlaybackError::Playlist(msg) => assert!(msg.contains("503")),
            e => panic!("Expected Playlist error, got: {:?}", e),
        }
        assert_eq!(pages.next_page().await, 1);

        let songs = pages.load_more().await.unwrap();
        assert_eq!(songs.len(), 10);
        assert_eq!(pages.next_page().await, 2);
        assert!(pages.has_more().await);
    }

    #[tokio::test]
    async fn test_reset_starts_new_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("title", "old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(1, 2)))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/song"))
            .and(query_param("title", "new"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(50, 2)))
            .mount(&mock_server)
            .await;

        let pages = PagedSongs::new(client_for(&mock_server), SongQuery::new("old"));
        pages.load_more().await.unwrap();
        assert!(!pages.has_more().await);

        pages.reset(SongQuery::new("new")).await;
        let songs = pages.load_more().await.unwrap();
        assert_eq!(songs[0].id, TrackId(50));
    }
}
