//! The long-lived poll loop.
//!
//! One worker processes one job at a time; parallelism inside a job is
//! the matcher's concurrency bound, and scaling beyond one job means
//! running more worker processes against the same queue.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tracklift_store::queue::JobQueue;

use crate::config::WorkerConfig;
use crate::converter::Converter;

pub struct Worker {
    queue: Arc<dyn JobQueue>,
    converter: Arc<Converter>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>, converter: Arc<Converter>, config: WorkerConfig) -> Self {
        Self {
            queue,
            converter,
            config,
        }
    }

    /// Poll the queue until `shutdown` is cancelled.
    ///
    /// Each blocking pop is bounded by the poll interval, so shutdown is
    /// observed within one interval. A job in flight when shutdown fires
    /// sees the cancellation through its derived token and terminates as
    /// FAILED rather than being abandoned mid-state.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            job_timeout_secs = self.config.job_timeout.as_secs(),
            concurrency = self.config.concurrency,
            "worker started"
        );

        loop {
            if shutdown.is_cancelled() {
                tracing::info!("worker shutting down");
                break;
            }
            self.process_next(&shutdown).await;
        }
    }

    async fn process_next(&self, shutdown: &CancellationToken) {
        let job = match self.queue.pop(self.config.poll_interval).await {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "failed to poll job queue");
                // Transient store errors must not turn into a hot loop.
                tokio::time::sleep(self.config.poll_interval).await;
                return;
            }
        };

        tracing::info!(
            job_id = %job.job_id,
            source = %job.source_platform,
            target = %job.target_platform,
            "processing conversion job"
        );

        // The job deadline cancels a child token, so shutdown and
        // timeout flow into the conversion through the same signal.
        let job_token = shutdown.child_token();
        let deadline = tokio::spawn({
            let token = job_token.clone();
            let timeout = self.config.job_timeout;
            async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            }
        });

        if let Err(e) = self.converter.convert(&job, &job_token).await {
            tracing::error!(job_id = %job.job_id, error = %e, "conversion job failed");
        }

        deadline.abort();
    }
}
