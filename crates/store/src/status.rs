//! Live status snapshots for external pollers.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use tracklift_core::status::StatusSnapshot;

use crate::StoreError;

/// Snapshots expire on their own; pollers of finished conversions read
/// the durable record instead.
const STATUS_TTL_SECS: u64 = 86_400;

fn status_key(job_id: Uuid) -> String {
    format!("conversion:{job_id}:status")
}

/// Keyed storage for the live status view. The worker only writes;
/// reads are for external pollers and tooling.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn set(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError>;
    async fn get(&self, job_id: Uuid) -> Result<Option<StatusSnapshot>, StoreError>;
    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct RedisStatusStore {
    conn: ConnectionManager,
}

impl RedisStatusStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    async fn set(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError> {
        let payload = serde_json::to_string(snapshot).map_err(StoreError::Encode)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(status_key(snapshot.job_id), payload, STATUS_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<StatusSnapshot>, StoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(status_key(job_id)).await?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(StoreError::Decode))
            .transpose()
    }

    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(status_key(job_id)).await?;
        Ok(())
    }
}
