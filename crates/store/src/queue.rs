//! The conversion job queue.
//!
//! Producers LPUSH JSON-encoded jobs onto a single list; workers BRPOP
//! with a timeout, so the list is the serialisation point between any
//! number of producers and workers. Delivery is at-least-once: a worker
//! crash between pop and durable persist loses the job.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use tracklift_core::conversion::ConversionJob;

use crate::StoreError;

const JOB_QUEUE_KEY: &str = "conversion:jobs";

/// FIFO hand-off of conversion jobs between producers and workers.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn push(&self, job: &ConversionJob) -> Result<(), StoreError>;

    /// Blocking pop. Returns `None` when the timeout elapses with no job
    /// available.
    async fn pop(&self, timeout: Duration) -> Result<Option<ConversionJob>, StoreError>;

    async fn len(&self) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
}

impl RedisJobQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn push(&self, job: &ConversionJob) -> Result<(), StoreError> {
        let payload = serde_json::to_string(job).map_err(StoreError::Encode)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(JOB_QUEUE_KEY, payload).await?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<ConversionJob>, StoreError> {
        let mut conn = self.conn.clone();
        let result: Option<(String, String)> = conn
            .brpop(JOB_QUEUE_KEY, timeout.as_secs_f64())
            .await?;

        match result {
            Some((_key, payload)) => {
                let job = serde_json::from_str(&payload).map_err(StoreError::Decode)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    async fn len(&self) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(JOB_QUEUE_KEY).await?)
    }
}
