//! Session draft persistence.
//!
//! One JSON snapshot per session id, overwritten wholesale on every save.
//! Loading never fails: a missing, unreachable or unreadable record is
//! reported as `None` and the caller starts a fresh session.
//!
//! Backends:
//! - Redis, with a TTL so abandoned drafts expire
//! - in-memory, for single-instance deployments and tests

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::domain::{IntakeAnswers, SessionRecord};

/// Key builders for consistent key formats.
pub mod keys {
    use uuid::Uuid;

    pub fn session(session_id: Uuid) -> String {
        format!("intake:session:{}", session_id)
    }
}

/// Session store with a backend chosen at start-up.
#[derive(Clone)]
pub enum SessionStore {
    Redis(RedisSessionStore),
    Memory(MemorySessionStore),
}

impl SessionStore {
    pub fn memory() -> Self {
        Self::Memory(MemorySessionStore::default())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "memory",
        }
    }

    /// Write a snapshot stamped with the current time and return it.
    #[instrument(skip(self, answers))]
    pub async fn save(
        &self,
        session_id: Uuid,
        answers: &IntakeAnswers,
        current_step: usize,
    ) -> Result<SessionRecord> {
        let record = SessionRecord {
            session_id,
            answers: answers.clone(),
            current_step,
            updated_at: Utc::now(),
        };
        let data = serde_json::to_string(&record).context("Failed to serialize session")?;
        let key = keys::session(session_id);

        match self {
            Self::Redis(store) => store.put(&key, data).await?,
            Self::Memory(store) => store.put(&key, data),
        }

        debug!(
            session_id = %session_id,
            current_step,
            fields = answers.iter().count(),
            "Session saved"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn load(&self, session_id: Uuid) -> Option<SessionRecord> {
        let key = keys::session(session_id);
        let data = match self {
            Self::Redis(store) => store.fetch(&key).await,
            Self::Memory(store) => store.fetch(&key),
        }?;

        match serde_json::from_str::<SessionRecord>(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Discarding unreadable session record");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, session_id: Uuid) -> Result<bool> {
        let key = keys::session(session_id);
        let deleted = match self {
            Self::Redis(store) => store.remove(&key).await?,
            Self::Memory(store) => store.remove(&key),
        };
        debug!(session_id = %session_id, deleted, "Session delete");
        Ok(deleted)
    }

    pub async fn health_check(&self) -> Result<()> {
        match self {
            Self::Redis(store) => store.health_check().await,
            Self::Memory(_) => Ok(()),
        }
    }
}

// =============================================================================
// Redis backend
// =============================================================================

/// Redis-backed store with connection pooling.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn new(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!(ttl_seconds, "Redis session store connected");

        Ok(Self {
            conn,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    async fn put(&self, key: &str, data: String) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, data, self.ttl.as_secs())
            .await
            .context("Failed to write session to Redis")?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(data) => data,
            Err(e) => {
                error!(key = key, error = %e, "Redis get error");
                None
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i32 = conn
            .del(key)
            .await
            .context("Failed to delete session from Redis")?;
        Ok(deleted > 0)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Process-local store. Values are kept serialized so both backends share the
/// same load path.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    fn put(&self, key: &str, data: String) {
        self.records.write().insert(key.to_string(), data);
    }

    fn fetch(&self, key: &str) -> Option<String> {
        self.records.read().get(key).cloned()
    }

    fn remove(&self, key: &str) -> bool {
        self.records.write().remove(key).is_some()
    }
}
