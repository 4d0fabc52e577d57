//! Client for the YouTube-fronting internal service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use tracklift_core::platform::Platform;
use tracklift_core::track::Track;
use tracklift_store::session::SessionResolver;

use crate::{CatalogError, CreatedPlaylist, TargetCatalog};

pub struct YoutubeCatalog {
    client: reqwest::Client,
    base_url: String,
    sessions: Arc<dyn SessionResolver>,
}

/// A single hit from the search endpoints. The service scores and ranks
/// server-side; the worker only consumes identity fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistBody<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistResponse {
    id: String,
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddVideosBody<'a> {
    video_ids: &'a [String],
}

impl YoutubeCatalog {
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

    async fn bearer_token(&self, session_id: &str) -> Result<String, CatalogError> {
        let token = self
            .sessions
            .target_token(session_id)
            .await
            .map_err(|e| CatalogError::Session(e.to_string()))?;
        Ok(sanitize_token(&token.access_token))
    }
}

#[async_trait]
impl TargetCatalog for YoutubeCatalog {
    async fn search_by_isrc(
        &self,
        isrc: &str,
        session_id: &str,
    ) -> Result<Option<Track>, CatalogError> {
        if isrc.is_empty() {
            return Ok(None);
        }

        let token = self.bearer_token(session_id).await?;
        let response = self
            .client
            .get(format!("{}/v1/search/track", self.base_url))
            .query(&[("isrc", isrc)])
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        let hit: SearchHit = response.json().await?;
        if hit.video_id.is_empty() {
            return Ok(None);
        }
        to_track(hit).map(Some)
    }

    async fn search_by_text(
        &self,
        name: &str,
        artist: &str,
        session_id: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        let token = self.bearer_token(session_id).await?;
        let response = self
            .client
            .get(format!("{}/v1/search/music", self.base_url))
            .query(&[("track", name), ("artist", artist)])
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        // The music search endpoint returns its single best hit.
        let hit: SearchHit = response.json().await?;
        if hit.video_id.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![to_track(hit)?])
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        session_id: &str,
    ) -> Result<CreatedPlaylist, CatalogError> {
        let token = self.bearer_token(session_id).await?;
        let response = self
            .client
            .post(format!("{}/v1/playlists", self.base_url))
            .json(&CreatePlaylistBody {
                title: name,
                description,
            })
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        let created: CreatePlaylistResponse = response.json().await?;
        Ok(CreatedPlaylist {
            id: created.id,
            url: created.url,
        })
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
        session_id: &str,
    ) -> Result<(), CatalogError> {
        if track_ids.is_empty() {
            return Ok(());
        }

        let token = self.bearer_token(session_id).await?;
        let response = self
            .client
            .post(format!("{}/v1/playlists/{}/videos", self.base_url, playlist_id))
            .json(&AddVideosBody {
                video_ids: track_ids,
            })
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }
        Ok(())
    }
}

fn to_track(hit: SearchHit) -> Result<Track, CatalogError> {
    Track::new(hit.title, hit.channel_title, Platform::Youtube, hit.video_id)
        .map_err(|e| CatalogError::Payload(e.to_string()))
}

/// Tokens read out of session hashes occasionally carry stray
/// whitespace or line breaks; a bearer header must not.
fn sanitize_token(token: &str) -> String {
    token.trim().replace(['\n', '\r'], "")
}
