//! End-to-end orchestration of one conversion job.
//!
//! [`Converter::convert`] drives the aggregate through
//! fetch -> match -> create -> attach -> finalize, persisting the durable
//! record and publishing live status snapshots as it goes. Every error
//! funnels through a single fail path, so the aggregate is never left
//! in a non-terminal state once `convert` returns, including on panic,
//! which the guard converts into a `FAILED` conversion.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;

use tracklift_catalog::{SourceCatalog, TargetCatalog};
use tracklift_core::conversion::{Conversion, ConversionJob};
use tracklift_core::error::CoreError;
use tracklift_core::log::{ConversionLog, LogStatus};
use tracklift_core::status::StatusSnapshot;
use tracklift_db::repositories::{ConversionLogStore, ConversionStore};
use tracklift_store::status::StatusStore;

use crate::config::WorkerConfig;
use crate::matcher::Matcher;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The job never produced a conversion: it failed validation.
    #[error("failed to create conversion: {0}")]
    Rejected(#[source] CoreError),

    /// The initial PENDING record could not be written.
    #[error("failed to persist conversion: {0}")]
    Persist(#[source] sqlx::Error),

    /// The conversion ran and ended FAILED with this message.
    #[error("{0}")]
    Failed(String),
}

pub struct Converter {
    source: Arc<dyn SourceCatalog>,
    target: Arc<dyn TargetCatalog>,
    matcher: Matcher,
    conversions: Arc<dyn ConversionStore>,
    logs: Arc<dyn ConversionLogStore>,
    status: Arc<dyn StatusStore>,
    config: WorkerConfig,
}

impl Converter {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        target: Arc<dyn TargetCatalog>,
        matcher: Matcher,
        conversions: Arc<dyn ConversionStore>,
        logs: Arc<dyn ConversionLogStore>,
        status: Arc<dyn StatusStore>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            source,
            target,
            matcher,
            conversions,
            logs,
            status,
            config,
        }
    }

    /// Drive one job to a terminal state.
    pub async fn convert(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<(), ConvertError> {
        let mut conversion = Conversion::new(job).map_err(ConvertError::Rejected)?;
        self.conversions
            .create(&conversion)
            .await
            .map_err(ConvertError::Persist)?;

        match AssertUnwindSafe(self.run(&mut conversion, job, cancel))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let message = format!("internal error: {}", panic_message(payload.as_ref()));
                tracing::error!(conversion_id = %conversion.id, error = %message, "panic during conversion");
                conversion.fail(&message);
                self.save_state(&conversion).await;
                Ok(())
            }
        }
    }

    async fn run(
        &self,
        conversion: &mut Conversion,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<(), ConvertError> {
        // Fetch the source playlist.
        conversion.start_fetching();
        self.publish_status(conversion, 0.0).await;

        if cancel.is_cancelled() {
            return self
                .handle_error(conversion, "failed to fetch playlist", Some("context cancelled".into()))
                .await;
        }
        let playlist = match self
            .source
            .playlist_tracks(&job.source_playlist_id, &job.user_id)
            .await
        {
            Ok(playlist) => playlist,
            Err(e) => {
                return self
                    .handle_error(conversion, "failed to fetch playlist", Some(e.to_string()))
                    .await;
            }
        };

        self.record_log(ConversionLog::fetch_playlist(
            conversion.id,
            LogStatus::Success,
            None,
        ))
        .await;

        // An explicit subset on the job narrows the fetched tracks.
        let mut tracks = playlist.tracks;
        if !job.selected_track_ids.is_empty() {
            let selected: HashSet<&str> =
                job.selected_track_ids.iter().map(String::as_str).collect();
            tracks.retain(|t| selected.contains(t.platform_id.as_str()));
        }

        // Match every track against the target catalog.
        conversion.start_matching(tracks.len() as i32, &playlist.name);
        self.publish_status(conversion, 0.0).await;

        let matching_started = Instant::now();
        let status = &self.status;
        let on_progress = |processed: i32, matched: i32, failed: i32| {
            conversion.update_progress(processed, matched, failed);
            let avg_secs_per_track = matching_started.elapsed().as_secs_f64() / f64::from(processed);
            let snapshot = StatusSnapshot::from_conversion(conversion, avg_secs_per_track);
            async move {
                if let Err(e) = status.set(&snapshot).await {
                    tracing::warn!(error = %e, "failed to publish status snapshot");
                }
            }
        };
        let matches = self
            .matcher
            .match_tracks(
                cancel,
                &tracks,
                &job.user_id,
                self.config.concurrency,
                on_progress,
            )
            .await;

        // One audit row per match, successful or not.
        let mut audit = Vec::with_capacity(matches.len());
        let mut matched_ids = Vec::new();
        for result in &matches {
            match &result.target {
                Some(target) => {
                    audit.push(ConversionLog::match_track(conversion.id, &result.source, target));
                    matched_ids.push(target.platform_id.clone());
                }
                None => {
                    let error = result.error.as_deref().unwrap_or("no match found");
                    audit.push(ConversionLog::match_track_error(
                        conversion.id,
                        &result.source,
                        error,
                    ));
                }
            }
        }
        if let Err(e) = self.logs.create_batch(&audit).await {
            tracing::error!(conversion_id = %conversion.id, error = %e, "failed to save match audit rows");
        }

        if matched_ids.is_empty() {
            return self.handle_error(conversion, "no tracks matched", None).await;
        }

        // Create the target playlist.
        conversion.start_creating();
        self.publish_status(conversion, 0.0).await;

        if cancel.is_cancelled() {
            return self
                .handle_error(conversion, "failed to create playlist", Some("context cancelled".into()))
                .await;
        }
        let description = format!("Converted from source playlist: {}", playlist.name);
        let created = match self
            .target
            .create_playlist(&job.target_playlist_name, &description, &job.user_id)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                self.record_log(ConversionLog::create_playlist(
                    conversion.id,
                    LogStatus::Failed,
                    Some(e.to_string()),
                ))
                .await;
                return self
                    .handle_error(conversion, "failed to create playlist", Some(e.to_string()))
                    .await;
            }
        };
        self.record_log(ConversionLog::create_playlist(
            conversion.id,
            LogStatus::Success,
            None,
        ))
        .await;

        // Attach the matched tracks.
        if cancel.is_cancelled() {
            return self
                .handle_error(conversion, "failed to add tracks to playlist", Some("context cancelled".into()))
                .await;
        }
        if let Err(e) = self
            .target
            .add_tracks(&created.id, &matched_ids, &job.user_id)
            .await
        {
            self.record_log(ConversionLog::add_tracks(
                conversion.id,
                LogStatus::Failed,
                Some(e.to_string()),
            ))
            .await;
            return self
                .handle_error(conversion, "failed to add tracks to playlist", Some(e.to_string()))
                .await;
        }
        self.record_log(ConversionLog::add_tracks(
            conversion.id,
            LogStatus::Success,
            None,
        ))
        .await;

        tracing::info!(
            conversion_id = %conversion.id,
            matched = conversion.matched_tracks,
            total = conversion.total_tracks,
            url = %created.url,
            "conversion completed"
        );
        conversion.complete(created.id, created.url);
        self.save_state(conversion).await;

        Ok(())
    }

    /// The single fail funnel: mark the aggregate FAILED, persist it,
    /// publish the final snapshot, and surface the combined message.
    async fn handle_error(
        &self,
        conversion: &mut Conversion,
        message: &str,
        source: Option<String>,
    ) -> Result<(), ConvertError> {
        let full = match source {
            Some(cause) => format!("{message}: {cause}"),
            None => message.to_string(),
        };

        conversion.fail(&full);
        self.save_state(conversion).await;

        tracing::error!(conversion_id = %conversion.id, error = %full, "conversion failed");
        Err(ConvertError::Failed(full))
    }

    /// Persist the durable record and publish the matching snapshot.
    async fn save_state(&self, conversion: &Conversion) {
        self.publish_status(conversion, 0.0).await;
        if let Err(e) = self.conversions.update(conversion).await {
            tracing::error!(conversion_id = %conversion.id, error = %e, "failed to persist conversion");
        }
    }

    async fn publish_status(&self, conversion: &Conversion, avg_secs_per_track: f64) {
        let snapshot = StatusSnapshot::from_conversion(conversion, avg_secs_per_track);
        if let Err(e) = self.status.set(&snapshot).await {
            tracing::warn!(conversion_id = %conversion.id, error = %e, "failed to publish status snapshot");
        }
    }

    /// Audit rows are best-effort: losing one is logged, never fatal.
    async fn record_log(&self, log: ConversionLog) {
        if let Err(e) = self.logs.create(&log).await {
            tracing::error!(conversion_id = %log.conversion_id, step = %log.step, error = %e, "failed to record audit row");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
