//! Tracks and track match results.

use uuid::Uuid;

use crate::error::CoreError;
use crate::platform::Platform;

/// A single track as known to one platform.
///
/// Identity is `(platform, platform_id)`; the internal `id` only exists
/// so in-memory collections have a stable key independent of the
/// upstream identifier scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
    pub isrc: Option<String>,
    pub platform: Platform,
    pub platform_id: String,
}

impl Track {
    /// Build a track, rejecting empty name, artist, or platform id.
    pub fn new(
        name: impl Into<String>,
        artist: impl Into<String>,
        platform: Platform,
        platform_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        let artist = artist.into();
        let platform_id = platform_id.into();

        if name.is_empty() {
            return Err(CoreError::Validation(
                "track name cannot be empty".to_string(),
            ));
        }
        if artist.is_empty() {
            return Err(CoreError::Validation(
                "track artist cannot be empty".to_string(),
            ));
        }
        if platform_id.is_empty() {
            return Err(CoreError::Validation(
                "track platform id cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            artist,
            album: None,
            duration_ms: None,
            isrc: None,
            platform,
            platform_id,
        })
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        let album = album.into();
        if !album.is_empty() {
            self.album = Some(album);
        }
        self
    }

    /// Negative durations are dropped.
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        if duration_ms >= 0 {
            self.duration_ms = Some(duration_ms);
        }
        self
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        let isrc = isrc.into();
        if !isrc.is_empty() {
            self.isrc = Some(isrc);
        }
        self
    }
}

/// How confident the matcher is in a source → target pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
    None,
}

impl MatchConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchConfidence::High => "HIGH",
            MatchConfidence::Medium => "MEDIUM",
            MatchConfidence::Low => "LOW",
            MatchConfidence::None => "NONE",
        }
    }
}

/// The matcher's decision for one source track.
///
/// Invariant: `target` and `method` are present iff `confidence` is not
/// [`MatchConfidence::None`]; `error` is present iff it is. The two
/// constructors are the only way these shapes are built.
#[derive(Debug, Clone)]
pub struct TrackMatch {
    pub source: Track,
    pub target: Option<Track>,
    pub confidence: MatchConfidence,
    pub method: Option<&'static str>,
    pub error: Option<String>,
}

impl TrackMatch {
    /// A successful pairing with a confidence and method tag.
    pub fn found(
        source: Track,
        target: Track,
        confidence: MatchConfidence,
        method: &'static str,
    ) -> Self {
        Self {
            source,
            target: Some(target),
            confidence,
            method: Some(method),
            error: None,
        }
    }

    /// A track the matcher could not resolve.
    pub fn failed(source: Track, error: impl Into<String>) -> Self {
        Self {
            source,
            target: None,
            confidence: MatchConfidence::None,
            method: None,
            error: Some(error.into()),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.confidence != MatchConfidence::None
    }
}
