//! Application state and shared resources.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::auth::{Authenticator, MemorySessions, RedisSessions};
use crate::config::{AppConfig, StorageBackend};
use crate::quiz::QuizService;
use crate::store::{MemoryStore, QuizStore, RedisStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Persistence collaborator
    pub store: Arc<dyn QuizStore>,

    /// Session token resolver
    pub sessions: Arc<dyn Authenticator>,

    /// Quiz lifecycle service
    pub quizzes: Arc<QuizService>,
}

impl AppState {
    /// Create new application state for the configured storage backend
    pub async fn new(config: AppConfig) -> Result<Self> {
        match config.storage {
            StorageBackend::Redis => Self::with_redis(config).await,
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Ok(Self::in_memory(config))
            }
        }
    }

    async fn with_redis(config: AppConfig) -> Result<Self> {
        // Connect to Redis with connection manager (handles reconnection)
        let client = redis::Client::open(config.redis_url.as_str())
            .context("Failed to create Redis client")?;

        let redis = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!(redis_url = %config.redis_url, "Redis connected");

        let store: Arc<dyn QuizStore> = Arc::new(RedisStore::new(redis.clone()));
        let sessions = Arc::new(RedisSessions::new(redis, config.session.ttl_secs));
        Ok(Self::assemble(config, store, sessions))
    }

    /// State backed entirely by process memory
    pub fn in_memory(config: AppConfig) -> Self {
        let sessions = Arc::new(MemorySessions::new(config.session.ttl_secs));
        Self::assemble(config, Arc::new(MemoryStore::new()), sessions)
    }

    fn assemble(
        config: AppConfig,
        store: Arc<dyn QuizStore>,
        sessions: Arc<dyn Authenticator>,
    ) -> Self {
        let quizzes = Arc::new(QuizService::new(store.clone()));
        Self {
            config,
            store,
            sessions,
            quizzes,
        }
    }
}
