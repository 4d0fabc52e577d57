//! The conversion aggregate and its state machine.
//!
//! A [`Conversion`] is one end-to-end run of turning a source playlist
//! into a target playlist. It is created from a [`ConversionJob`],
//! mutated only by the converter, and finalised exactly once. The
//! lifecycle is
//!
//! ```text
//! PENDING -> FETCHING -> MATCHING -> CREATING -> COMPLETED
//! ```
//!
//! with `FAILED` reachable from every non-terminal state. Transition
//! methods silently ignore calls that would leave a terminal state or
//! skip ahead, so the aggregate can never be observed mid-regression.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::platform::Platform;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a conversion. Persisted as the upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionStatus {
    Pending,
    Fetching,
    Matching,
    Creating,
    Completed,
    Failed,
}

impl ConversionStatus {
    /// States reachable from `self`. Terminal states return an empty slice.
    pub fn valid_transitions(self) -> &'static [ConversionStatus] {
        use ConversionStatus::*;
        match self {
            Pending => &[Fetching, Failed],
            Fetching => &[Matching, Failed],
            Matching => &[Creating, Failed],
            Creating => &[Completed, Failed],
            Completed | Failed => &[],
        }
    }

    pub fn can_transition(self, to: ConversionStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionStatus::Completed | ConversionStatus::Failed)
    }

    /// The persisted / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionStatus::Pending => "PENDING",
            ConversionStatus::Fetching => "FETCHING",
            ConversionStatus::Matching => "MATCHING",
            ConversionStatus::Creating => "CREATING",
            ConversionStatus::Completed => "COMPLETED",
            ConversionStatus::Failed => "FAILED",
        }
    }

    /// Parse the persisted representation back into a status.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "PENDING" => Ok(ConversionStatus::Pending),
            "FETCHING" => Ok(ConversionStatus::Fetching),
            "MATCHING" => Ok(ConversionStatus::Matching),
            "CREATING" => Ok(ConversionStatus::Creating),
            "COMPLETED" => Ok(ConversionStatus::Completed),
            "FAILED" => Ok(ConversionStatus::Failed),
            other => Err(CoreError::UnknownValue {
                kind: "conversion status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// The queue payload that triggers a conversion.
///
/// Producers LPUSH this as JSON onto the job list; the worker decodes it
/// on BRPOP. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionJob {
    pub job_id: Uuid,
    pub user_id: String,
    pub source_platform: Platform,
    pub target_platform: Platform,
    pub source_playlist_id: String,
    /// When non-empty, only these source platform track ids are converted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_track_ids: Vec<String>,
    pub target_playlist_name: String,
    pub created_at: Timestamp,
}

impl ConversionJob {
    pub fn new(
        user_id: impl Into<String>,
        source_platform: Platform,
        target_platform: Platform,
        source_playlist_id: impl Into<String>,
        target_playlist_name: impl Into<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user_id: user_id.into(),
            source_platform,
            target_platform,
            source_playlist_id: source_playlist_id.into(),
            selected_track_ids: Vec::new(),
            target_playlist_name: target_playlist_name.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// One end-to-end conversion run.
///
/// Counter invariants, maintained by [`update_progress`](Self::update_progress):
/// `processed <= total` and `matched + failed == processed`.
/// `completed_at` is set exactly once, when the status first becomes
/// terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub id: Uuid,
    pub user_id: String,
    pub source_platform: Platform,
    pub target_platform: Platform,
    pub source_playlist_id: String,
    pub source_playlist_name: Option<String>,
    pub target_playlist_id: Option<String>,
    pub target_playlist_url: Option<String>,
    pub target_playlist_name: String,
    pub status: ConversionStatus,
    pub total_tracks: i32,
    pub processed_tracks: i32,
    pub matched_tracks: i32,
    pub failed_tracks: i32,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Conversion {
    /// Build a pending conversion from a job, rejecting jobs with a nil
    /// id, empty user id, or empty source playlist id.
    pub fn new(job: &ConversionJob) -> Result<Self, CoreError> {
        if job.job_id.is_nil() {
            return Err(CoreError::Validation("job id cannot be nil".to_string()));
        }
        if job.user_id.is_empty() {
            return Err(CoreError::Validation("user id cannot be empty".to_string()));
        }
        if job.source_playlist_id.is_empty() {
            return Err(CoreError::Validation(
                "source playlist id cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: job.job_id,
            user_id: job.user_id.clone(),
            source_platform: job.source_platform,
            target_platform: job.target_platform,
            source_playlist_id: job.source_playlist_id.clone(),
            source_playlist_name: None,
            target_playlist_id: None,
            target_playlist_url: None,
            target_playlist_name: job.target_playlist_name.clone(),
            status: ConversionStatus::Pending,
            total_tracks: 0,
            processed_tracks: 0,
            matched_tracks: 0,
            failed_tracks: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    pub fn start_fetching(&mut self) {
        self.enter(ConversionStatus::Fetching);
    }

    pub fn start_matching(&mut self, total_tracks: i32, source_playlist_name: &str) {
        if !self.status.can_transition(ConversionStatus::Matching) {
            return;
        }
        self.status = ConversionStatus::Matching;
        self.total_tracks = total_tracks;
        if !source_playlist_name.is_empty() {
            self.source_playlist_name = Some(source_playlist_name.to_string());
        }
        self.touch();
    }

    pub fn update_progress(&mut self, processed: i32, matched: i32, failed: i32) {
        self.processed_tracks = processed;
        self.matched_tracks = matched;
        self.failed_tracks = failed;
        self.touch();
    }

    pub fn start_creating(&mut self) {
        self.enter(ConversionStatus::Creating);
    }

    pub fn complete(
        &mut self,
        target_playlist_id: impl Into<String>,
        target_playlist_url: impl Into<String>,
    ) {
        if !self.status.can_transition(ConversionStatus::Completed) {
            return;
        }
        let now = Utc::now();
        self.status = ConversionStatus::Completed;
        self.target_playlist_id = Some(target_playlist_id.into());
        self.target_playlist_url = Some(target_playlist_url.into());
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    /// Terminate with an error. Reachable from every non-terminal state;
    /// calls on an already-terminal conversion are ignored.
    pub fn fail(&mut self, error_message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        let now = Utc::now();
        self.status = ConversionStatus::Failed;
        self.error_message = Some(error_message.into());
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    /// Completion percentage, 0–100, integer division. 0 when no total
    /// has been established yet.
    pub fn progress(&self) -> i32 {
        if self.total_tracks == 0 {
            return 0;
        }
        ((self.processed_tracks * 100) / self.total_tracks).min(100)
    }

    /// Rough remaining wall time given an observed per-track average.
    pub fn estimated_seconds_remaining(&self, avg_secs_per_track: f64) -> i64 {
        let remaining = self.total_tracks - self.processed_tracks;
        if remaining <= 0 {
            return 0;
        }
        (f64::from(remaining) * avg_secs_per_track) as i64
    }

    fn enter(&mut self, next: ConversionStatus) {
        if !self.status.can_transition(next) {
            return;
        }
        self.status = next;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConversionJob {
        ConversionJob::new(
            "user-456",
            Platform::Spotify,
            Platform::Youtube,
            "playlist-789",
            "My Converted Playlist",
        )
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_conversion_starts_pending() {
        let job = job();
        let conversion = Conversion::new(&job).unwrap();
        assert_eq!(conversion.id, job.job_id);
        assert_eq!(conversion.user_id, job.user_id);
        assert_eq!(conversion.status, ConversionStatus::Pending);
        assert_eq!(conversion.total_tracks, 0);
        assert!(conversion.completed_at.is_none());
    }

    #[test]
    fn nil_job_id_rejected() {
        let mut job = job();
        job.job_id = Uuid::nil();
        assert!(Conversion::new(&job).is_err());
    }

    #[test]
    fn empty_user_id_rejected() {
        let mut job = job();
        job.user_id.clear();
        assert!(Conversion::new(&job).is_err());
    }

    #[test]
    fn empty_source_playlist_id_rejected() {
        let mut job = job();
        job.source_playlist_id.clear();
        assert!(Conversion::new(&job).is_err());
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn happy_path_transitions() {
        let mut c = Conversion::new(&job()).unwrap();

        c.start_fetching();
        assert_eq!(c.status, ConversionStatus::Fetching);

        c.start_matching(10, "Source Playlist");
        assert_eq!(c.status, ConversionStatus::Matching);
        assert_eq!(c.total_tracks, 10);
        assert_eq!(c.source_playlist_name.as_deref(), Some("Source Playlist"));

        c.update_progress(5, 4, 1);
        assert_eq!(c.processed_tracks, 5);
        assert_eq!(c.matched_tracks, 4);
        assert_eq!(c.failed_tracks, 1);

        c.start_creating();
        assert_eq!(c.status, ConversionStatus::Creating);

        c.complete("yt-playlist-id", "https://youtube.com/playlist?list=xxx");
        assert_eq!(c.status, ConversionStatus::Completed);
        assert_eq!(c.target_playlist_id.as_deref(), Some("yt-playlist-id"));
        assert!(c.completed_at.is_some());
    }

    #[test]
    fn fail_sets_message_and_completed_at() {
        let mut c = Conversion::new(&job()).unwrap();
        c.start_fetching();
        c.fail("something went wrong");
        assert_eq!(c.status, ConversionStatus::Failed);
        assert_eq!(c.error_message.as_deref(), Some("something went wrong"));
        assert!(c.completed_at.is_some());
    }

    #[test]
    fn fail_is_reachable_from_every_non_terminal_state() {
        let setups: [fn(&mut Conversion); 4] = [
            |_| {},
            |c| c.start_fetching(),
            |c| {
                c.start_fetching();
                c.start_matching(1, "p");
            },
            |c| {
                c.start_fetching();
                c.start_matching(1, "p");
                c.start_creating();
            },
        ];
        for setup in setups {
            let mut c = Conversion::new(&job()).unwrap();
            setup(&mut c);
            c.fail("boom");
            assert_eq!(c.status, ConversionStatus::Failed);
        }
    }

    #[test]
    fn terminal_states_are_final() {
        let mut c = Conversion::new(&job()).unwrap();
        c.start_fetching();
        c.fail("boom");
        let completed_at = c.completed_at;

        c.start_matching(5, "late");
        c.fail("second failure");
        c.complete("id", "url");

        assert_eq!(c.status, ConversionStatus::Failed);
        assert_eq!(c.error_message.as_deref(), Some("boom"));
        assert_eq!(c.completed_at, completed_at);
        assert!(c.target_playlist_id.is_none());
    }

    #[test]
    fn skipping_ahead_is_ignored() {
        let mut c = Conversion::new(&job()).unwrap();
        c.start_creating();
        assert_eq!(c.status, ConversionStatus::Pending);
        c.complete("id", "url");
        assert_eq!(c.status, ConversionStatus::Pending);
        assert!(c.completed_at.is_none());
    }

    #[test]
    fn terminal_statuses_have_no_transitions() {
        assert!(ConversionStatus::Completed.valid_transitions().is_empty());
        assert!(ConversionStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn every_non_terminal_status_can_fail() {
        for status in [
            ConversionStatus::Pending,
            ConversionStatus::Fetching,
            ConversionStatus::Matching,
            ConversionStatus::Creating,
        ] {
            assert!(status.can_transition(ConversionStatus::Failed));
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn status_string_round_trips() {
        for status in [
            ConversionStatus::Pending,
            ConversionStatus::Fetching,
            ConversionStatus::Matching,
            ConversionStatus::Creating,
            ConversionStatus::Completed,
            ConversionStatus::Failed,
        ] {
            assert_eq!(ConversionStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ConversionStatus::parse("RUNNING").is_err());
    }

    // -----------------------------------------------------------------------
    // Progress arithmetic
    // -----------------------------------------------------------------------

    #[test]
    fn progress_is_zero_without_total() {
        let c = Conversion::new(&job()).unwrap();
        assert_eq!(c.progress(), 0);
    }

    #[test]
    fn progress_uses_integer_division() {
        let mut c = Conversion::new(&job()).unwrap();
        c.total_tracks = 3;
        c.processed_tracks = 1;
        assert_eq!(c.progress(), 33);
        c.processed_tracks = 2;
        assert_eq!(c.progress(), 66);
        c.processed_tracks = 3;
        assert_eq!(c.progress(), 100);
    }

    #[test]
    fn progress_is_capped_at_100() {
        let mut c = Conversion::new(&job()).unwrap();
        c.total_tracks = 2;
        c.processed_tracks = 5;
        assert_eq!(c.progress(), 100);
    }

    #[test]
    fn estimated_seconds_remaining_scales_with_average() {
        let mut c = Conversion::new(&job()).unwrap();
        c.total_tracks = 10;
        c.processed_tracks = 4;
        assert_eq!(c.estimated_seconds_remaining(2.0), 12);
        assert_eq!(c.estimated_seconds_remaining(0.0), 0);

        c.processed_tracks = 10;
        assert_eq!(c.estimated_seconds_remaining(2.0), 0);
    }

    // -----------------------------------------------------------------------
    // Job wire format
    // -----------------------------------------------------------------------

    #[test]
    fn job_json_round_trips() {
        let mut job = job();
        job.selected_track_ids = vec!["sp1".to_string(), "sp2".to_string()];

        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: ConversionJob = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn job_json_uses_camel_case_fields() {
        let job = job();
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&job).unwrap()).unwrap();
        assert!(value.get("jobId").is_some());
        assert!(value.get("userId").is_some());
        assert!(value.get("sourcePlaylistId").is_some());
        assert!(value.get("targetPlaylistName").is_some());
        assert_eq!(value["sourcePlatform"], "SPOTIFY");
        // Empty subsets stay off the wire entirely.
        assert!(value.get("selectedTrackIds").is_none());
    }

    #[test]
    fn job_decodes_without_selected_track_ids() {
        let json = r#"{
            "jobId": "1f4fe5a6-6e32-4cd8-9a16-0b4b54e2a6f3",
            "userId": "user-1",
            "sourcePlatform": "SPOTIFY",
            "targetPlatform": "YOUTUBE",
            "sourcePlaylistId": "pl-1",
            "targetPlaylistName": "Mix",
            "createdAt": "2025-06-01T12:00:00Z"
        }"#;
        let job: ConversionJob = serde_json::from_str(json).unwrap();
        assert!(job.selected_track_ids.is_empty());
    }
}
