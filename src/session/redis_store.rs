//! Redis-backed session store

use super::SessionStore;
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

/// Session key prefix
const SESSION_PREFIX: &str = "portcullis:session";

/// One Redis hash per session; the TTL is refreshed on every write
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub async fn new(config: &SessionConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self {
            conn,
            ttl_secs: config.ttl_secs,
        })
    }

    /// Check the connection (used during bootstrap)
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}:{}", SESSION_PREFIX, session_id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn exists(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(session_key(session_id)).await?;
        Ok(exists)
    }

    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(session_key(session_id), key).await?;
        Ok(value)
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let redis_key = session_key(session_id);
        let _: () = conn.hset(&redis_key, key, value).await?;
        let _: () = conn.expire(&redis_key, self.ttl_secs as i64).await?;
        Ok(())
    }

    async fn remove(&self, session_id: &str, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(session_key(session_id), key).await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(session_id)).await?;
        Ok(())
    }
}
