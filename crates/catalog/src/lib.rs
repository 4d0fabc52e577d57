//! HTTP clients for the upstream platform services.
//!
//! The worker talks to two internal services: one fronting the source
//! platform (playlist reads) and one fronting the target platform
//! (search, playlist creation). Both authenticate per request with an
//! OAuth bearer token resolved from the caller's session.
//!
//! The conversion engine consumes only the [`SourceCatalog`] and
//! [`TargetCatalog`] traits, so tests can substitute in-memory fakes.

pub mod spotify;
pub mod youtube;

use async_trait::async_trait;

use tracklift_core::playlist::Playlist;
use tracklift_core::track::Track;

pub use spotify::SpotifyCatalog;
pub use youtube::YoutubeCatalog;

/// Errors from the catalog layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("catalog service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The caller's session could not produce a usable token.
    #[error("session error: {0}")]
    Session(String),

    /// The service answered with a payload the domain rejects.
    #[error("invalid catalog payload: {0}")]
    Payload(String),
}

/// Identity of a playlist just created on the target platform.
#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub id: String,
    pub url: String,
}

/// Read access to the source platform.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Fetch a playlist with all of its tracks.
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        session_id: &str,
    ) -> Result<Playlist, CatalogError>;
}

/// Search and write access to the target platform.
#[async_trait]
pub trait TargetCatalog: Send + Sync {
    /// Exact lookup by recording code. `None` when the catalog has no
    /// entry for the ISRC.
    async fn search_by_isrc(
        &self,
        isrc: &str,
        session_id: &str,
    ) -> Result<Option<Track>, CatalogError>;

    /// Free-text search, best candidates first.
    async fn search_by_text(
        &self,
        name: &str,
        artist: &str,
        session_id: &str,
    ) -> Result<Vec<Track>, CatalogError>;

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        session_id: &str,
    ) -> Result<CreatedPlaylist, CatalogError>;

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
        session_id: &str,
    ) -> Result<(), CatalogError>;
}
