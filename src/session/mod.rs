//! Per-connection session storage
//!
//! A session is a small key-value map identified by the value of the session
//! cookie. The identity resolver only reads the signed-in user id from it;
//! sign-in and sign-out write and clear that key.

pub mod memory;
pub mod redis_store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Backend storing session key-value data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether a live session with this id is held by the store
    async fn exists(&self, session_id: &str) -> Result<bool>;
    /// `Ok(None)` when the session or the key does not exist
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>>;
    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, session_id: &str, key: &str) -> Result<()>;
    /// Drop the whole session
    async fn destroy(&self, session_id: &str) -> Result<()>;
}

/// Handle on the session bound to the current request
#[derive(Clone)]
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
    fresh: bool,
    written: Arc<AtomicBool>,
}

impl Session {
    /// Attach to an existing session id (taken from the cookie)
    pub fn new(id: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            id: id.into(),
            store,
            fresh: false,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a new session with a random id
    pub fn fresh(store: Arc<dyn SessionStore>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            store,
            fresh: true,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// A cookie must be issued only for a new session that now holds data
    pub fn needs_cookie(&self) -> bool {
        self.fresh && self.written.load(Ordering::Acquire)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fresh && !self.written.load(Ordering::Acquire) {
            return Ok(None);
        }
        self.store.get(&self.id, key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(&self.id, key, value).await?;
        self.written.store(true, Ordering::Release);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(&self.id, key).await
    }

    pub async fn destroy(&self) -> Result<()> {
        self.store.destroy(&self.id).await
    }

    /// Drop this session and hand out a new one under a fresh id
    ///
    /// Sign-in goes through here so a session id known before
    /// authentication never carries the signed-in user.
    pub async fn regenerate(&self) -> Result<Session> {
        self.store.destroy(&self.id).await?;
        Ok(Session::fresh(self.store.clone()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("fresh", &self.fresh)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Session extractor used without the session middleware"
            ))
        })
    }
}
