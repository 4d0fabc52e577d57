//! Streaming platform identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A streaming platform the worker can read playlists from or write
/// playlists to. The wire and database form is the upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Spotify,
    Youtube,
}

impl Platform {
    /// The persisted / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Spotify => "SPOTIFY",
            Platform::Youtube => "YOUTUBE",
        }
    }

    /// Parse the persisted representation back into a platform.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "SPOTIFY" => Ok(Platform::Spotify),
            "YOUTUBE" => Ok(Platform::Youtube),
            other => Err(CoreError::UnknownValue {
                kind: "platform",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
