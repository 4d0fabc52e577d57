//! Append-only audit records for conversion steps.

use std::fmt;

use chrono::Utc;
use uuid::Uuid;

use crate::error::CoreError;
use crate::track::Track;
use crate::types::Timestamp;

/// The pipeline step an audit record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStep {
    FetchSourcePlaylist,
    MatchTrack,
    CreateTargetPlaylist,
    AddTrackToPlaylist,
}

impl ConversionStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionStep::FetchSourcePlaylist => "FETCH_SOURCE_PLAYLIST",
            ConversionStep::MatchTrack => "MATCH_TRACK",
            ConversionStep::CreateTargetPlaylist => "CREATE_TARGET_PLAYLIST",
            ConversionStep::AddTrackToPlaylist => "ADD_TRACK_TO_PLAYLIST",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "FETCH_SOURCE_PLAYLIST" => Ok(ConversionStep::FetchSourcePlaylist),
            "MATCH_TRACK" => Ok(ConversionStep::MatchTrack),
            "CREATE_TARGET_PLAYLIST" => Ok(ConversionStep::CreateTargetPlaylist),
            "ADD_TRACK_TO_PLAYLIST" => Ok(ConversionStep::AddTrackToPlaylist),
            other => Err(CoreError::UnknownValue {
                kind: "conversion step",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConversionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the step the record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Failed,
    Skipped,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Success => "SUCCESS",
            LogStatus::Failed => "FAILED",
            LogStatus::Skipped => "SKIPPED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "SUCCESS" => Ok(LogStatus::Success),
            "FAILED" => Ok(LogStatus::Failed),
            "SKIPPED" => Ok(LogStatus::Skipped),
            other => Err(CoreError::UnknownValue {
                kind: "log status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One durable audit row. Created throughout a conversion, never
/// mutated or deleted.
#[derive(Debug, Clone)]
pub struct ConversionLog {
    pub id: Uuid,
    pub conversion_id: Uuid,
    pub step: ConversionStep,
    pub status: LogStatus,
    pub source_track_id: Option<String>,
    pub source_track_name: Option<String>,
    pub source_track_artist: Option<String>,
    pub target_track_id: Option<String>,
    pub target_track_name: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

impl ConversionLog {
    fn new(conversion_id: Uuid, step: ConversionStep, status: LogStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversion_id,
            step,
            status,
            source_track_id: None,
            source_track_name: None,
            source_track_artist: None,
            target_track_id: None,
            target_track_name: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn fetch_playlist(
        conversion_id: Uuid,
        status: LogStatus,
        error_message: Option<String>,
    ) -> Self {
        let mut log = Self::new(conversion_id, ConversionStep::FetchSourcePlaylist, status);
        log.error_message = error_message;
        log
    }

    /// A successful pairing, carrying both track identity snapshots.
    pub fn match_track(conversion_id: Uuid, source: &Track, target: &Track) -> Self {
        let mut log = Self::new(conversion_id, ConversionStep::MatchTrack, LogStatus::Success);
        log.set_source(source);
        log.target_track_id = Some(target.platform_id.clone());
        log.target_track_name = Some(target.name.clone());
        log
    }

    /// A track the matcher could not resolve.
    pub fn match_track_error(conversion_id: Uuid, source: &Track, error_message: &str) -> Self {
        let mut log = Self::new(conversion_id, ConversionStep::MatchTrack, LogStatus::Failed);
        log.set_source(source);
        log.error_message = Some(error_message.to_string());
        log
    }

    pub fn create_playlist(
        conversion_id: Uuid,
        status: LogStatus,
        error_message: Option<String>,
    ) -> Self {
        let mut log = Self::new(conversion_id, ConversionStep::CreateTargetPlaylist, status);
        log.error_message = error_message;
        log
    }

    pub fn add_tracks(
        conversion_id: Uuid,
        status: LogStatus,
        error_message: Option<String>,
    ) -> Self {
        let mut log = Self::new(conversion_id, ConversionStep::AddTrackToPlaylist, status);
        log.error_message = error_message;
        log
    }

    fn set_source(&mut self, source: &Track) {
        self.source_track_id = Some(source.platform_id.clone());
        self.source_track_name = Some(source.name.clone());
        self.source_track_artist = Some(source.artist.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn track(platform: Platform, platform_id: &str) -> Track {
        Track::new("Bohemian Rhapsody", "Queen", platform, platform_id).unwrap()
    }

    #[test]
    fn step_and_status_round_trip() {
        for step in [
            ConversionStep::FetchSourcePlaylist,
            ConversionStep::MatchTrack,
            ConversionStep::CreateTargetPlaylist,
            ConversionStep::AddTrackToPlaylist,
        ] {
            assert_eq!(ConversionStep::parse(step.as_str()).unwrap(), step);
        }
        for status in [LogStatus::Success, LogStatus::Failed, LogStatus::Skipped] {
            assert_eq!(LogStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ConversionStep::parse("UPLOAD").is_err());
        assert!(LogStatus::parse("OK").is_err());
    }

    #[test]
    fn match_track_snapshots_both_identities() {
        let conversion_id = Uuid::new_v4();
        let source = track(Platform::Spotify, "sp1");
        let target = track(Platform::Youtube, "yt1");

        let log = ConversionLog::match_track(conversion_id, &source, &target);
        assert_eq!(log.conversion_id, conversion_id);
        assert_eq!(log.step, ConversionStep::MatchTrack);
        assert_eq!(log.status, LogStatus::Success);
        assert_eq!(log.source_track_id.as_deref(), Some("sp1"));
        assert_eq!(log.source_track_name.as_deref(), Some("Bohemian Rhapsody"));
        assert_eq!(log.source_track_artist.as_deref(), Some("Queen"));
        assert_eq!(log.target_track_id.as_deref(), Some("yt1"));
        assert!(log.error_message.is_none());
    }

    #[test]
    fn match_track_error_snapshots_source_only() {
        let source = track(Platform::Spotify, "sp1");
        let log = ConversionLog::match_track_error(Uuid::new_v4(), &source, "no match found");
        assert_eq!(log.status, LogStatus::Failed);
        assert_eq!(log.source_track_id.as_deref(), Some("sp1"));
        assert!(log.target_track_id.is_none());
        assert_eq!(log.error_message.as_deref(), Some("no match found"));
    }

    #[test]
    fn step_constructors_set_step_and_status() {
        let id = Uuid::new_v4();
        let fetch = ConversionLog::fetch_playlist(id, LogStatus::Success, None);
        assert_eq!(fetch.step, ConversionStep::FetchSourcePlaylist);

        let create = ConversionLog::create_playlist(id, LogStatus::Failed, Some("boom".into()));
        assert_eq!(create.step, ConversionStep::CreateTargetPlaylist);
        assert_eq!(create.error_message.as_deref(), Some("boom"));

        let add = ConversionLog::add_tracks(id, LogStatus::Success, None);
        assert_eq!(add.step, ConversionStep::AddTrackToPlaylist);
    }
}
