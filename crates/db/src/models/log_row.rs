//! Row model for the `conversion_logs` table.

use sqlx::FromRow;
use uuid::Uuid;

use tracklift_core::error::CoreError;
use tracklift_core::log::{ConversionLog, ConversionStep, LogStatus};
use tracklift_core::types::Timestamp;

use super::conversion_row::non_empty;

/// A row from the append-only `conversion_logs` table.
#[derive(Debug, Clone, FromRow)]
pub struct LogRow {
    pub id: Uuid,
    pub conversion_id: Uuid,
    pub step: String,
    pub status: String,
    pub source_track_id: Option<String>,
    pub source_track_name: Option<String>,
    pub source_track_artist: Option<String>,
    pub target_track_id: Option<String>,
    pub target_track_name: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

impl LogRow {
    pub fn from_domain(log: &ConversionLog) -> Self {
        Self {
            id: log.id,
            conversion_id: log.conversion_id,
            step: log.step.as_str().to_string(),
            status: log.status.as_str().to_string(),
            source_track_id: non_empty(log.source_track_id.as_deref()),
            source_track_name: non_empty(log.source_track_name.as_deref()),
            source_track_artist: non_empty(log.source_track_artist.as_deref()),
            target_track_id: non_empty(log.target_track_id.as_deref()),
            target_track_name: non_empty(log.target_track_name.as_deref()),
            error_message: non_empty(log.error_message.as_deref()),
            created_at: log.created_at,
        }
    }

    pub fn into_domain(self) -> Result<ConversionLog, CoreError> {
        Ok(ConversionLog {
            id: self.id,
            conversion_id: self.conversion_id,
            step: ConversionStep::parse(&self.step)?,
            status: LogStatus::parse(&self.status)?,
            source_track_id: non_empty(self.source_track_id.as_deref()),
            source_track_name: non_empty(self.source_track_name.as_deref()),
            source_track_artist: non_empty(self.source_track_artist.as_deref()),
            target_track_id: non_empty(self.target_track_id.as_deref()),
            target_track_name: non_empty(self.target_track_name.as_deref()),
            error_message: non_empty(self.error_message.as_deref()),
            created_at: self.created_at,
        })
    }
}
