//! Caller identity and session tokens.
//!
//! Handlers never see credentials. A request carries an opaque session token
//! (`X-Session-Token` or `Authorization: Bearer`), and an [`Authenticator`]
//! resolves it to a [`Caller`]. Tokens are stored by their SHA-256 digest.

use std::collections::HashMap;

use ::redis::AsyncCommands;
use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use quizhall_common::constants::headers::X_SESSION_TOKEN;
use quizhall_common::constants::redis_keys::SESSION_PREFIX;
use quizhall_common::{QuizError, StoreError};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::routes::ApiError;
use crate::state::AppState;

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(String),
}

impl Caller {
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(name) => Some(name),
        }
    }

    /// Username of an authenticated caller, or `Unauthenticated`
    pub fn require(&self) -> Result<&str, QuizError> {
        self.username().ok_or(QuizError::Unauthenticated)
    }
}

/// Resolves session tokens to callers
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Unknown, expired or missing tokens resolve to `Caller::Anonymous`
    async fn current_user(&self, token: Option<&str>) -> Result<Caller, StoreError>;

    /// Start a session for `username` and return its token
    async fn issue(&self, username: &str) -> Result<String, StoreError>;

    /// End the session behind `token`; false if there was none
    async fn revoke(&self, token: &str) -> Result<bool, StoreError>;
}

/// Generate a cryptographically secure session token
pub fn generate_token() -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Session token from `X-Session-Token`, falling back to a bearer token
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let explicit = headers
        .get(X_SESSION_TOKEN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if explicit.is_some() {
        return explicit;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Sessions kept in Redis with a TTL
pub struct RedisSessions {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessions {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }
}

#[async_trait]
impl Authenticator for RedisSessions {
    async fn current_user(&self, token: Option<&str>) -> Result<Caller, StoreError> {
        let Some(token) = token else {
            return Ok(Caller::Anonymous);
        };

        let key = format!("{SESSION_PREFIX}{}", token_digest(token));
        let mut conn = self.redis.clone();
        let username: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(username.map_or(Caller::Anonymous, Caller::User))
    }

    async fn issue(&self, username: &str) -> Result<String, StoreError> {
        let token = generate_token();
        let key = format!("{SESSION_PREFIX}{}", token_digest(&token));

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, username, self.ttl_secs)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::info!(username = %username, ttl_secs = self.ttl_secs, "Session issued");
        Ok(token)
    }

    async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let key = format!("{SESSION_PREFIX}{}", token_digest(token));
        let mut conn = self.redis.clone();
        let removed: u32 = conn
            .del(&key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(removed > 0)
    }
}

/// Sessions kept in process memory
pub struct MemorySessions {
    ttl_secs: u64,
    /// Token digest -> (username, expiry timestamp)
    sessions: RwLock<HashMap<String, (String, i64)>>,
}

impl MemorySessions {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Authenticator for MemorySessions {
    async fn current_user(&self, token: Option<&str>) -> Result<Caller, StoreError> {
        let Some(token) = token else {
            return Ok(Caller::Anonymous);
        };

        let now = chrono::Utc::now().timestamp();
        let sessions = self.sessions.read().await;
        Ok(match sessions.get(&token_digest(token)) {
            Some((username, expires)) if now < *expires => Caller::User(username.clone()),
            _ => Caller::Anonymous,
        })
    }

    async fn issue(&self, username: &str) -> Result<String, StoreError> {
        let token = generate_token();
        let expires = chrono::Utc::now().timestamp() + self.ttl_secs as i64;

        let mut sessions = self.sessions.write().await;
        let now = chrono::Utc::now().timestamp();
        sessions.retain(|_, (_, exp)| *exp > now);
        sessions.insert(token_digest(&token), (username.to_string(), expires));

        tracing::info!(username = %username, ttl_secs = self.ttl_secs, "Session issued");
        Ok(token)
    }

    async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&token_digest(token)).is_some())
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        let caller = state
            .sessions
            .current_user(token)
            .await
            .map_err(QuizError::from)?;
        Ok(caller)
    }
}
