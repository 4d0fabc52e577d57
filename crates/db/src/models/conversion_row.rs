//! Row model for the `conversions` table.

use sqlx::FromRow;
use uuid::Uuid;

use tracklift_core::conversion::{Conversion, ConversionStatus};
use tracklift_core::error::CoreError;
use tracklift_core::platform::Platform;
use tracklift_core::types::Timestamp;

/// A row from the `conversions` table. Optional text columns are NULL
/// when the aggregate has no value; the mapping below keeps the two
/// forms symmetric in both directions.
#[derive(Debug, Clone, FromRow)]
pub struct ConversionRow {
    pub id: Uuid,
    pub user_id: String,
    pub source_platform: String,
    pub target_platform: String,
    pub source_playlist_id: String,
    pub source_playlist_name: Option<String>,
    pub target_playlist_id: Option<String>,
    pub target_playlist_url: Option<String>,
    pub target_playlist_name: Option<String>,
    pub status: String,
    pub total_tracks: i32,
    pub processed_tracks: i32,
    pub matched_tracks: i32,
    pub failed_tracks: i32,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl ConversionRow {
    pub fn from_domain(conversion: &Conversion) -> Self {
        Self {
            id: conversion.id,
            user_id: conversion.user_id.clone(),
            source_platform: conversion.source_platform.as_str().to_string(),
            target_platform: conversion.target_platform.as_str().to_string(),
            source_playlist_id: conversion.source_playlist_id.clone(),
            source_playlist_name: non_empty(conversion.source_playlist_name.as_deref()),
            target_playlist_id: non_empty(conversion.target_playlist_id.as_deref()),
            target_playlist_url: non_empty(conversion.target_playlist_url.as_deref()),
            target_playlist_name: non_empty(Some(&conversion.target_playlist_name)),
            status: conversion.status.as_str().to_string(),
            total_tracks: conversion.total_tracks,
            processed_tracks: conversion.processed_tracks,
            matched_tracks: conversion.matched_tracks,
            failed_tracks: conversion.failed_tracks,
            error_message: non_empty(conversion.error_message.as_deref()),
            created_at: conversion.created_at,
            updated_at: conversion.updated_at,
            completed_at: conversion.completed_at,
        }
    }

    pub fn into_domain(self) -> Result<Conversion, CoreError> {
        Ok(Conversion {
            id: self.id,
            user_id: self.user_id,
            source_platform: Platform::parse(&self.source_platform)?,
            target_platform: Platform::parse(&self.target_platform)?,
            source_playlist_id: self.source_playlist_id,
            source_playlist_name: non_empty(self.source_playlist_name.as_deref()),
            target_playlist_id: non_empty(self.target_playlist_id.as_deref()),
            target_playlist_url: non_empty(self.target_playlist_url.as_deref()),
            target_playlist_name: self.target_playlist_name.unwrap_or_default(),
            status: ConversionStatus::parse(&self.status)?,
            total_tracks: self.total_tracks,
            processed_tracks: self.processed_tracks,
            matched_tracks: self.matched_tracks,
            failed_tracks: self.failed_tracks,
            error_message: non_empty(self.error_message.as_deref()),
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

/// Empty strings are stored as NULL and loaded back as `None`.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}
