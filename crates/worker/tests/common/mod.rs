//! Hand-rolled in-memory capabilities shared by the worker test suites.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use tracklift_catalog::{CatalogError, CreatedPlaylist, SourceCatalog, TargetCatalog};
use tracklift_core::conversion::{Conversion, ConversionJob};
use tracklift_core::log::ConversionLog;
use tracklift_core::platform::Platform;
use tracklift_core::playlist::Playlist;
use tracklift_core::status::StatusSnapshot;
use tracklift_core::track::Track;
use tracklift_db::repositories::{ConversionLogStore, ConversionStore};
use tracklift_store::queue::JobQueue;
use tracklift_store::status::StatusStore;
use tracklift_store::StoreError;
use tracklift_worker::config::WorkerConfig;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn spotify_track(name: &str, artist: &str, platform_id: &str) -> Track {
    Track::new(name, artist, Platform::Spotify, platform_id).unwrap()
}

pub fn youtube_track(name: &str, artist: &str, platform_id: &str) -> Track {
    Track::new(name, artist, Platform::Youtube, platform_id).unwrap()
}

pub fn job() -> ConversionJob {
    ConversionJob::new(
        "user-1",
        Platform::Spotify,
        Platform::Youtube,
        "pl-1",
        "Converted Mix",
    )
}

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        concurrency: 2,
        poll_interval: Duration::from_millis(20),
        job_timeout: Duration::from_secs(5),
    }
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// Text results are keyed by `"{name}|{artist}"`.
#[derive(Default)]
pub struct MockTargetCatalog {
    pub isrc_results: HashMap<String, Track>,
    pub text_results: HashMap<String, Vec<Track>>,
    pub search_error: Option<String>,
    pub create_error: Option<String>,
    pub add_error: Option<String>,
    pub created: Mutex<Vec<(String, String)>>,
    pub added: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockTargetCatalog {
    pub fn with_text_result(mut self, name: &str, artist: &str, candidates: Vec<Track>) -> Self {
        self.text_results
            .insert(format!("{name}|{artist}"), candidates);
        self
    }

    pub fn with_isrc_result(mut self, isrc: &str, track: Track) -> Self {
        self.isrc_results.insert(isrc.to_string(), track);
        self
    }
}

fn transport_error(message: &str) -> CatalogError {
    CatalogError::Status {
        status: 502,
        body: message.to_string(),
    }
}

#[async_trait]
impl TargetCatalog for MockTargetCatalog {
    async fn search_by_isrc(
        &self,
        isrc: &str,
        _session_id: &str,
    ) -> Result<Option<Track>, CatalogError> {
        if let Some(message) = &self.search_error {
            return Err(transport_error(message));
        }
        Ok(self.isrc_results.get(isrc).cloned())
    }

    async fn search_by_text(
        &self,
        name: &str,
        artist: &str,
        _session_id: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        if let Some(message) = &self.search_error {
            return Err(transport_error(message));
        }
        Ok(self
            .text_results
            .get(&format!("{name}|{artist}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        _session_id: &str,
    ) -> Result<CreatedPlaylist, CatalogError> {
        if let Some(message) = &self.create_error {
            return Err(transport_error(message));
        }
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), description.to_string()));
        Ok(CreatedPlaylist {
            id: "yt-playlist-1".to_string(),
            url: "https://youtube.com/playlist?list=yt-playlist-1".to_string(),
        })
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
        _session_id: &str,
    ) -> Result<(), CatalogError> {
        if let Some(message) = &self.add_error {
            return Err(transport_error(message));
        }
        self.added
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), track_ids.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSourceCatalog {
    pub playlist: Option<Playlist>,
    pub error: Option<String>,
}

impl MockSourceCatalog {
    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        let mut playlist = Playlist::new("Road Trip", Platform::Spotify, "pl-1").unwrap();
        playlist.add_tracks(tracks);
        Self {
            playlist: Some(playlist),
            error: None,
        }
    }
}

#[async_trait]
impl SourceCatalog for MockSourceCatalog {
    async fn playlist_tracks(
        &self,
        _playlist_id: &str,
        _session_id: &str,
    ) -> Result<Playlist, CatalogError> {
        if let Some(message) = &self.error {
            return Err(transport_error(message));
        }
        Ok(self.playlist.clone().expect("mock playlist not configured"))
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockConversionStore {
    pub rows: Mutex<HashMap<Uuid, Conversion>>,
}

impl MockConversionStore {
    pub fn get(&self, id: Uuid) -> Option<Conversion> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ConversionStore for MockConversionStore {
    async fn create(&self, conversion: &Conversion) -> Result<(), sqlx::Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(conversion.id, conversion.clone());
        Ok(())
    }

    async fn update(&self, conversion: &Conversion) -> Result<(), sqlx::Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(conversion.id, conversion.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversion>, sqlx::Error> {
        Ok(self.get(id))
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockLogStore {
    pub rows: Mutex<Vec<ConversionLog>>,
}

impl MockLogStore {
    pub fn all(&self) -> Vec<ConversionLog> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversionLogStore for MockLogStore {
    async fn create(&self, log: &ConversionLog) -> Result<(), sqlx::Error> {
        self.rows.lock().unwrap().push(log.clone());
        Ok(())
    }

    async fn create_batch(&self, logs: &[ConversionLog]) -> Result<(), sqlx::Error> {
        self.rows.lock().unwrap().extend(logs.iter().cloned());
        Ok(())
    }

    async fn find_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error> {
        Ok(self
            .all()
            .into_iter()
            .filter(|l| l.conversion_id == conversion_id)
            .collect())
    }

    async fn find_failed_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error> {
        Ok(self
            .all()
            .into_iter()
            .filter(|l| {
                l.conversion_id == conversion_id
                    && l.status == tracklift_core::log::LogStatus::Failed
            })
            .collect())
    }
}

/// Records every published snapshot so tests can assert ordering.
#[derive(Default)]
pub struct MockStatusStore {
    pub snapshots: Mutex<Vec<StatusSnapshot>>,
}

impl MockStatusStore {
    pub fn history(&self) -> Vec<StatusSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusStore for MockStatusStore {
    async fn set(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<StatusSnapshot>, StoreError> {
        Ok(self
            .history()
            .into_iter()
            .rev()
            .find(|s| s.job_id == job_id))
    }

    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError> {
        self.snapshots.lock().unwrap().retain(|s| s.job_id != job_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockJobQueue {
    pub jobs: Mutex<VecDeque<ConversionJob>>,
}

impl MockJobQueue {
    pub fn with_jobs(jobs: impl IntoIterator<Item = ConversionJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
        }
    }
}

#[async_trait]
impl JobQueue for MockJobQueue {
    async fn push(&self, job: &ConversionJob) -> Result<(), StoreError> {
        self.jobs.lock().unwrap().push_front(job.clone());
        Ok(())
    }

    /// Emulates BRPOP: an empty queue blocks for the timeout.
    async fn pop(&self, timeout: Duration) -> Result<Option<ConversionJob>, StoreError> {
        let job = self.jobs.lock().unwrap().pop_back();
        if job.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(job)
    }

    async fn len(&self) -> Result<i64, StoreError> {
        Ok(self.jobs.lock().unwrap().len() as i64)
    }
}
