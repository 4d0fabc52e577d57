//! Playlists as fetched from a source platform.

use uuid::Uuid;

use crate::error::CoreError;
use crate::platform::Platform;
use crate::track::Track;

/// An ordered collection of tracks on one platform.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub platform: Platform,
    pub platform_id: String,
    pub owner_id: Option<String>,
    pub image_url: Option<String>,
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(
        name: impl Into<String>,
        platform: Platform,
        platform_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        let platform_id = platform_id.into();

        if name.is_empty() {
            return Err(CoreError::Validation(
                "playlist name cannot be empty".to_string(),
            ));
        }
        if platform_id.is_empty() {
            return Err(CoreError::Validation(
                "playlist platform id cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            platform,
            platform_id,
            owner_id: None,
            image_url: None,
            tracks: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        let owner_id = owner_id.into();
        if !owner_id.is_empty() {
            self.owner_id = Some(owner_id);
        }
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        let image_url = image_url.into();
        if !image_url.is_empty() {
            self.image_url = Some(image_url);
        }
        self
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Platform ids of the tracks, in playlist order.
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.platform_id.clone()).collect()
    }
}
