//! Live status projection for external pollers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversion::{Conversion, ConversionStatus};
use crate::types::Timestamp;

/// A point-in-time view of a conversion, published to the keyed store on
/// every transition and progress update. Transient: the store keeps it
/// for 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub job_id: Uuid,
    pub status: ConversionStatus,
    /// 0–100.
    pub progress: i32,
    pub total_tracks: i32,
    pub processed_tracks: i32,
    pub matched_tracks: i32,
    pub failed_tracks: i32,
    pub estimated_seconds_remaining: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_playlist_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: Timestamp,
}

impl StatusSnapshot {
    /// Derive a snapshot from the aggregate. `avg_secs_per_track` is the
    /// observed per-track matching time (0 outside the matching phase).
    pub fn from_conversion(conversion: &Conversion, avg_secs_per_track: f64) -> Self {
        Self {
            job_id: conversion.id,
            status: conversion.status,
            progress: conversion.progress(),
            total_tracks: conversion.total_tracks,
            processed_tracks: conversion.processed_tracks,
            matched_tracks: conversion.matched_tracks,
            failed_tracks: conversion.failed_tracks,
            estimated_seconds_remaining: conversion.estimated_seconds_remaining(avg_secs_per_track),
            target_playlist_url: conversion.target_playlist_url.clone(),
            error: conversion.error_message.clone(),
            updated_at: Utc::now(),
        }
    }
}
