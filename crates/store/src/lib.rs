//! Redis-backed keyed store: the job queue, live status snapshots, and
//! session token resolution.
//!
//! Everything here is ephemeral. Durable state lives in Postgres
//! (`tracklift-db`); this crate only carries the coordination data that
//! flows between the producer, the worker, and external pollers.

pub mod client;
pub mod queue;
pub mod session;
pub mod status;

/// Errors from the keyed store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying Redis command failed (network, protocol, etc.).
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// A value could not be encoded for storage.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored value could not be decoded.
    #[error("failed to decode value: {0}")]
    Decode(#[source] serde_json::Error),

    /// Session material was missing, malformed, or expired.
    #[error("session error: {0}")]
    Session(String),
}
