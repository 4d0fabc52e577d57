//! Repository for the `conversions` table.

use async_trait::async_trait;
use uuid::Uuid;

use tracklift_core::conversion::Conversion;

use crate::models::conversion_row::ConversionRow;
use crate::DbPool;

/// Column list for `conversions` queries.
const COLUMNS: &str = "\
    id, user_id, source_platform, target_platform, \
    source_playlist_id, source_playlist_name, \
    target_playlist_id, target_playlist_url, target_playlist_name, \
    status, total_tracks, processed_tracks, matched_tracks, failed_tracks, \
    error_message, created_at, updated_at, completed_at";

/// Maximum page size when listing a user's conversions.
const MAX_LIMIT: i64 = 100;

/// Durable storage for the conversion aggregate.
#[async_trait]
pub trait ConversionStore: Send + Sync {
    async fn create(&self, conversion: &Conversion) -> Result<(), sqlx::Error>;
    async fn update(&self, conversion: &Conversion) -> Result<(), sqlx::Error>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversion>, sqlx::Error>;
    async fn find_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversion>, sqlx::Error>;
}

pub struct PgConversionStore {
    pool: DbPool,
}

impl PgConversionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversionStore for PgConversionStore {
    async fn create(&self, conversion: &Conversion) -> Result<(), sqlx::Error> {
        let row = ConversionRow::from_domain(conversion);
        sqlx::query(
            "INSERT INTO conversions ( \
                 id, user_id, source_platform, target_platform, \
                 source_playlist_id, source_playlist_name, \
                 target_playlist_id, target_playlist_url, target_playlist_name, \
                 status, total_tracks, processed_tracks, matched_tracks, failed_tracks, \
                 error_message, created_at, updated_at, completed_at \
             ) VALUES ( \
                 $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18 \
             )",
        )
        .bind(row.id)
        .bind(&row.user_id)
        .bind(&row.source_platform)
        .bind(&row.target_platform)
        .bind(&row.source_playlist_id)
        .bind(&row.source_playlist_name)
        .bind(&row.target_playlist_id)
        .bind(&row.target_playlist_url)
        .bind(&row.target_playlist_name)
        .bind(&row.status)
        .bind(row.total_tracks)
        .bind(row.processed_tracks)
        .bind(row.matched_tracks)
        .bind(row.failed_tracks)
        .bind(&row.error_message)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, conversion: &Conversion) -> Result<(), sqlx::Error> {
        let row = ConversionRow::from_domain(conversion);
        sqlx::query(
            "UPDATE conversions SET \
                 source_playlist_name = $2, \
                 target_playlist_id = $3, \
                 target_playlist_url = $4, \
                 target_playlist_name = $5, \
                 status = $6, \
                 total_tracks = $7, \
                 processed_tracks = $8, \
                 matched_tracks = $9, \
                 failed_tracks = $10, \
                 error_message = $11, \
                 updated_at = $12, \
                 completed_at = $13 \
             WHERE id = $1",
        )
        .bind(row.id)
        .bind(&row.source_playlist_name)
        .bind(&row.target_playlist_id)
        .bind(&row.target_playlist_url)
        .bind(&row.target_playlist_name)
        .bind(&row.status)
        .bind(row.total_tracks)
        .bind(row.processed_tracks)
        .bind(row.matched_tracks)
        .bind(row.failed_tracks)
        .bind(&row.error_message)
        .bind(row.updated_at)
        .bind(row.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversions WHERE id = $1");
        let row = sqlx::query_as::<_, ConversionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_domain().map_err(|e| sqlx::Error::Protocol(e.to_string())))
            .transpose()
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, ConversionRow>(&query)
            .bind(user_id)
            .bind(limit.clamp(1, MAX_LIMIT))
            .bind(offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(|e| sqlx::Error::Protocol(e.to_string())))
            .collect()
    }
}
