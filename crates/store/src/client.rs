//! Redis connection bootstrap.

use redis::aio::ConnectionManager;

use crate::StoreError;

/// Connect to Redis and verify the connection with a PING.
///
/// [`ConnectionManager`] reconnects automatically, so the returned
/// handle can be cloned into every store that needs one.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = ConnectionManager::new(client).await?;

    redis::cmd("PING").query_async::<()>(&mut conn).await?;
    tracing::debug!(url = %redis_url, "connected to redis");

    Ok(conn)
}
