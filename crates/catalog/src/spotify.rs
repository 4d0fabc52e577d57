//! Client for the Spotify-fronting internal service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use tracklift_core::platform::Platform;
use tracklift_core::playlist::Playlist;
use tracklift_core::track::Track;
use tracklift_store::session::SessionResolver;

use crate::{CatalogError, SourceCatalog};

/// Page size for playlist track reads.
const PAGE_SIZE: i64 = 50;

/// The playlist endpoint never returns the playlist's display name, so
/// fetched playlists carry this placeholder.
const DEFAULT_PLAYLIST_NAME: &str = "Playlist";

pub struct SpotifyCatalog {
    client: reqwest::Client,
    base_url: String,
    sessions: Arc<dyn SessionResolver>,
}

/// One page of `GET /internal/playlists/{id}/tracks`.
#[derive(Debug, Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistTrackItem>,
    #[serde(default)]
    total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistTrackItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    duration_ms: i64,
    #[serde(default)]
    isrc: String,
}

impl SpotifyCatalog {
    pub fn new(base_url: String, timeout: Duration, sessions: Arc<dyn SessionResolver>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url,
            sessions,
        }
    }
}

#[async_trait]
impl SourceCatalog for SpotifyCatalog {
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        session_id: &str,
    ) -> Result<Playlist, CatalogError> {
        let token = self
            .sessions
            .source_token(session_id)
            .await
            .map_err(|e| CatalogError::Session(e.to_string()))?;

        let mut tracks: Vec<Track> = Vec::new();
        let mut offset = 0i64;

        loop {
            let url = format!(
                "{}/internal/playlists/{}/tracks",
                self.base_url, playlist_id
            );
            let response = self
                .client
                .get(&url)
                .query(&[("limit", PAGE_SIZE), ("offset", offset)])
                .bearer_auth(&token.access_token)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Status { status, body });
            }

            let page: PlaylistTracksPage = response.json().await?;
            tracing::debug!(
                playlist_id,
                offset,
                items = page.items.len(),
                total = page.total,
                "fetched playlist page"
            );

            tracks.extend(page.items.into_iter().filter_map(to_track));

            if offset + PAGE_SIZE >= page.total {
                break;
            }
            offset += PAGE_SIZE;
        }

        let mut playlist = Playlist::new(DEFAULT_PLAYLIST_NAME, Platform::Spotify, playlist_id)
            .map_err(|e| CatalogError::Payload(e.to_string()))?;
        playlist.add_tracks(tracks);
        Ok(playlist)
    }
}

/// Items with a missing id or name cannot be matched and are skipped.
fn to_track(item: PlaylistTrackItem) -> Option<Track> {
    let track = Track::new(item.name, item.artist, Platform::Spotify, item.id).ok()?;
    Some(
        track
            .with_album(item.album)
            .with_duration_ms(item.duration_ms)
            .with_isrc(item.isrc),
    )
}
