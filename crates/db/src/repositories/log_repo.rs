//! Repository for the append-only `conversion_logs` table.

use async_trait::async_trait;
use uuid::Uuid;

use tracklift_core::log::ConversionLog;

use crate::models::log_row::LogRow;
use crate::DbPool;

/// Column list for `conversion_logs` queries.
const COLUMNS: &str = "\
    id, conversion_id, step, status, \
    source_track_id, source_track_name, source_track_artist, \
    target_track_id, target_track_name, \
    error_message, created_at";

const INSERT_SQL: &str = "\
    INSERT INTO conversion_logs ( \
        id, conversion_id, step, status, \
        source_track_id, source_track_name, source_track_artist, \
        target_track_id, target_track_name, \
        error_message, created_at \
    ) VALUES ( \
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11 \
    )";

/// Durable storage for audit records.
#[async_trait]
pub trait ConversionLogStore: Send + Sync {
    async fn create(&self, log: &ConversionLog) -> Result<(), sqlx::Error>;
    async fn create_batch(&self, logs: &[ConversionLog]) -> Result<(), sqlx::Error>;
    async fn find_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error>;
    async fn find_failed_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error>;
}

pub struct PgConversionLogStore {
    pool: DbPool,
}

impl PgConversionLogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn query_logs(
        &self,
        query: &str,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error> {
        let rows = sqlx::query_as::<_, LogRow>(query)
            .bind(conversion_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(|e| sqlx::Error::Protocol(e.to_string())))
            .collect()
    }
}

fn bind_log<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    row: &'q LogRow,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(row.id)
        .bind(row.conversion_id)
        .bind(&row.step)
        .bind(&row.status)
        .bind(&row.source_track_id)
        .bind(&row.source_track_name)
        .bind(&row.source_track_artist)
        .bind(&row.target_track_id)
        .bind(&row.target_track_name)
        .bind(&row.error_message)
        .bind(row.created_at)
}

#[async_trait]
impl ConversionLogStore for PgConversionLogStore {
    async fn create(&self, log: &ConversionLog) -> Result<(), sqlx::Error> {
        let row = LogRow::from_domain(log);
        bind_log(sqlx::query(INSERT_SQL), &row)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a whole audit batch in one transaction so a mid-batch
    /// failure never leaves a partial match history behind.
    async fn create_batch(&self, logs: &[ConversionLog]) -> Result<(), sqlx::Error> {
        if logs.is_empty() {
            return Ok(());
        }

        let rows: Vec<LogRow> = logs.iter().map(LogRow::from_domain).collect();
        let mut tx = self.pool.begin().await?;
        for row in &rows {
            bind_log(sqlx::query(INSERT_SQL), row)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    async fn find_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversion_logs \
             WHERE conversion_id = $1 \
             ORDER BY created_at ASC"
        );
        self.query_logs(&query, conversion_id).await
    }

    async fn find_failed_by_conversion(
        &self,
        conversion_id: Uuid,
    ) -> Result<Vec<ConversionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversion_logs \
             WHERE conversion_id = $1 AND status = 'FAILED' \
             ORDER BY created_at ASC"
        );
        self.query_logs(&query, conversion_id).await
    }
}
