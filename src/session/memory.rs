//! In-process session store for single-node deployments and tests

use super::SessionStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
    values: HashMap<String, String>,
    expires_at: Instant,
}

pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Drop expired sessions
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(86400))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn exists(&self, session_id: &str) -> Result<bool> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .is_some_and(|entry| entry.expires_at > Instant::now()))
    }

    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .and_then(|entry| entry.values.get(key).cloned()))
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<()> {
        let expires_at = Instant::now() + self.ttl;
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| Entry {
            values: HashMap::new(),
            expires_at,
        });
        if entry.expires_at <= Instant::now() {
            entry.values.clear();
        }
        entry.values.insert(key.to_string(), value.to_string());
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn remove(&self, session_id: &str, key: &str) -> Result<()> {
        if let Some(entry) = self.sessions.write().await.get_mut(session_id) {
            entry.values.remove(key);
        }
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
