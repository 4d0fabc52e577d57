//! Session token resolution.
//!
//! The web frontend keeps per-user OAuth material in Redis session
//! hashes written by its Spring session layer. Attribute values are
//! JSON-encoded (a bare string arrives as `"\"token\""`), and the
//! YouTube credentials live in a second session hash reachable through
//! the `youtubeSessionId` attribute of the Spotify session. This module
//! reads that layout; it never writes it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use redis::aio::ConnectionManager;

use tracklift_core::types::Timestamp;

use crate::StoreError;

const SESSION_KEY_PREFIX: &str = "spring:session:sessions:";

const SPOTIFY_ACCESS_TOKEN_ATTR: &str = "sessionAttr:spotifyAccessToken";
const SPOTIFY_REFRESH_TOKEN_ATTR: &str = "sessionAttr:spotifyRefreshToken";
const SPOTIFY_TOKEN_EXPIRY_ATTR: &str = "sessionAttr:spotifyTokenExpiry";
const YOUTUBE_SESSION_ID_ATTR: &str = "sessionAttr:youtubeSessionId";

const YOUTUBE_ACCESS_TOKEN_ATTR: &str = "sessionAttr:youtubeAccessToken";
const YOUTUBE_REFRESH_TOKEN_ATTR: &str = "sessionAttr:youtubeRefreshToken";
const YOUTUBE_TOKEN_EXPIRY_ATTR: &str = "sessionAttr:youtubeTokenExpiry";

/// An OAuth access token resolved from a session.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Timestamp,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Resolves upstream-platform credentials for a session principal.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn source_token(&self, session_id: &str) -> Result<AccessToken, StoreError>;
    async fn target_token(&self, session_id: &str) -> Result<AccessToken, StoreError>;
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn session_attrs(
        &self,
        session_id: &str,
        attrs: &[&str],
    ) -> Result<Vec<Option<String>>, StoreError> {
        let key = format!("{SESSION_KEY_PREFIX}{session_id}");
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(&key)
            .arg(attrs)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }
}

#[async_trait]
impl SessionResolver for RedisSessionStore {
    async fn source_token(&self, session_id: &str) -> Result<AccessToken, StoreError> {
        let values = self
            .session_attrs(
                session_id,
                &[
                    SPOTIFY_ACCESS_TOKEN_ATTR,
                    SPOTIFY_REFRESH_TOKEN_ATTR,
                    SPOTIFY_TOKEN_EXPIRY_ATTR,
                ],
            )
            .await?;

        let [access, refresh, expiry] = values.as_slice() else {
            return Err(StoreError::Session(
                "unexpected session attribute shape".to_string(),
            ));
        };

        let access = access.as_deref().ok_or_else(|| {
            StoreError::Session("session not found or missing token attributes".to_string())
        })?;
        let expiry = expiry.as_deref().ok_or_else(|| {
            StoreError::Session("session is missing a token expiry".to_string())
        })?;

        let token = AccessToken {
            access_token: decode_json_string(access),
            refresh_token: refresh.as_deref().map(decode_json_string),
            expires_at: decode_epoch_millis(expiry)?,
        };

        if token.is_expired() {
            return Err(StoreError::Session("source token expired".to_string()));
        }
        Ok(token)
    }

    async fn target_token(&self, session_id: &str) -> Result<AccessToken, StoreError> {
        // The target session id is an attribute of the source session.
        let values = self
            .session_attrs(session_id, &[YOUTUBE_SESSION_ID_ATTR])
            .await?;
        let target_session_id = values
            .first()
            .and_then(|v| v.as_deref())
            .map(decode_json_string)
            .ok_or_else(|| {
                StoreError::Session("session has no linked target session".to_string())
            })?;

        let values = self
            .session_attrs(
                &target_session_id,
                &[
                    YOUTUBE_ACCESS_TOKEN_ATTR,
                    YOUTUBE_REFRESH_TOKEN_ATTR,
                    YOUTUBE_TOKEN_EXPIRY_ATTR,
                ],
            )
            .await?;

        let [access, refresh, expiry] = values.as_slice() else {
            return Err(StoreError::Session(
                "unexpected session attribute shape".to_string(),
            ));
        };

        let access = access.as_deref().ok_or_else(|| {
            StoreError::Session("target session not found or missing token attributes".to_string())
        })?;

        // The frontend does not always persist an expiry for the target
        // token; treat a missing one as short-lived rather than invalid.
        let expires_at = match expiry.as_deref() {
            Some(raw) => decode_epoch_millis(raw)?,
            None => Utc::now() + Duration::hours(1),
        };

        let token = AccessToken {
            access_token: decode_json_string(access),
            refresh_token: refresh.as_deref().map(decode_json_string),
            expires_at,
        };

        if token.is_expired() {
            return Err(StoreError::Session("target token expired".to_string()));
        }
        Ok(token)
    }
}

/// Session attributes are JSON values; a plain string that fails to
/// parse is passed through unchanged.
fn decode_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string())
}

fn decode_epoch_millis(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    let millis: i64 = serde_json::from_str(raw)
        .map_err(|e| StoreError::Session(format!("invalid token expiry: {e}")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::Session(format!("token expiry out of range: {millis}")))
}
