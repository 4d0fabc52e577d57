//! `tracklift-worker` -- playlist conversion daemon.
//!
//! Pops conversion jobs off the Redis queue and turns source-platform
//! playlists into target-platform playlists, persisting progress to
//! Postgres and live status to Redis.
//!
//! # Environment variables
//!
//! | Variable                  | Default                               | Description                     |
//! |---------------------------|---------------------------------------|---------------------------------|
//! | `DATABASE_URL`            | `postgres://localhost:5432/tracklift` | Postgres connection string      |
//! | `REDIS_URL`               | `redis://localhost:6379`              | Redis connection string         |
//! | `SPOTIFY_SERVICE_URL`     | `http://localhost:8080`               | Source catalog service base URL |
//! | `YOUTUBE_SERVICE_URL`     | `http://localhost:8081`               | Target catalog service base URL |
//! | `WORKER_CONCURRENCY`      | `5`                                   | Matcher parallelism bound       |
//! | `WORKER_POLL_INTERVAL`    | `1`                                   | Queue pop timeout (seconds)     |
//! | `WORKER_JOB_TIMEOUT`      | `300`                                 | Per-job deadline (seconds)      |

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracklift_catalog::{SourceCatalog, SpotifyCatalog, TargetCatalog, YoutubeCatalog};
use tracklift_db::repositories::{PgConversionLogStore, PgConversionStore};
use tracklift_store::queue::RedisJobQueue;
use tracklift_store::session::{RedisSessionStore, SessionResolver};
use tracklift_store::status::RedisStatusStore;
use tracklift_worker::config::Config;
use tracklift_worker::converter::Converter;
use tracklift_worker::matcher::Matcher;
use tracklift_worker::worker::Worker;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracklift_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("starting conversion worker");

    let redis = match tracklift_store::client::connect(&config.redis_url).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to redis");
            std::process::exit(1);
        }
    };
    tracing::info!("connected to redis");

    let pool = match tracklift_db::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to postgres");
            std::process::exit(1);
        }
    };
    tracing::info!("connected to postgres");

    if let Err(e) = tracklift_db::migrations::run(&pool).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }
    tracing::info!("migrations applied");

    let sessions: Arc<dyn SessionResolver> = Arc::new(RedisSessionStore::new(redis.clone()));
    let queue = Arc::new(RedisJobQueue::new(redis.clone()));
    let status = Arc::new(RedisStatusStore::new(redis));

    let conversions = Arc::new(PgConversionStore::new(pool.clone()));
    let logs = Arc::new(PgConversionLogStore::new(pool));

    let source: Arc<dyn SourceCatalog> = Arc::new(SpotifyCatalog::new(
        config.spotify.base_url.clone(),
        config.spotify.timeout,
        Arc::clone(&sessions),
    ));
    let target: Arc<dyn TargetCatalog> = Arc::new(YoutubeCatalog::new(
        config.youtube.base_url.clone(),
        config.youtube.timeout,
        sessions,
    ));

    let matcher = Matcher::new(Arc::clone(&target));
    let converter = Arc::new(Converter::new(
        source,
        target,
        matcher,
        conversions,
        logs,
        status,
        config.worker.clone(),
    ));
    let worker = Worker::new(queue, converter, config.worker);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("received shutdown signal");
            shutdown.cancel();
        }
    });

    worker.run(shutdown).await;
    tracing::info!("worker stopped");
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
