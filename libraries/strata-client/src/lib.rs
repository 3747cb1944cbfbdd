//! Strata Catalog Client
//!
//! HTTP client for the song catalog that feeds the playback engine.
//!
//! # Features
//!
//! - **Search**: paged song search with title filter and sort order
//! - **Manifests**: ordered chunk lists per song, URLs resolved to absolute
//! - **Payloads**: raw chunk bytes
//!
//! [`CatalogClient`] implements the engine's `ManifestProvider` and
//! `ChunkSource`; [`PagedSongs`] implements `PlaylistSource`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_client::{CatalogClient, CatalogConfig, PagedSongs, SongQuery};
//! use strata_playback::{EngineConfig, EngineDeps, ExclusivityGate, PlayerService, StreamingEngine};
//!
//! let catalog = Arc::new(CatalogClient::new(CatalogConfig::new("https://api.example.com"))?);
//! let pages = Arc::new(PagedSongs::new((*catalog).clone(), SongQuery::new("")));
//!
//! let deps = EngineDeps {
//!     output,
//!     backend,
//!     manifests: catalog.clone(),
//!     chunks: catalog,
//!     gate: ExclusivityGate::global(),
//! };
//! let (engine, events) = StreamingEngine::new(deps, EngineConfig::load()?);
//! let (player, _task) = PlayerService::spawn(engine, events, pages);
//! ```

mod client;
mod error;
mod paging;
mod types;

pub use client::CatalogClient;
pub use error::{ClientError, Result};
pub use paging::PagedSongs;
pub use types::{CatalogConfig, SongChunkDto, SongDto, SongOrder, SongQuery};
