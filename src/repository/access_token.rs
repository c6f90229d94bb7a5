//! Access token repository

use crate::crypto;
use crate::domain::AccessToken;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// `Ok(None)` when no token carries this value
    async fn find_by_sha(&self, sha: &str) -> Result<Option<AccessToken>>;
    /// Issue a new token with a freshly generated value
    async fn create(&self, uid: i64, name: &str) -> Result<AccessToken>;
}

pub struct AccessTokenRepositoryImpl {
    pool: MySqlPool,
}

impl AccessTokenRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AccessToken>> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, uid, name, sha, created_at, updated_at
            FROM access_tokens
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}

#[async_trait]
impl AccessTokenRepository for AccessTokenRepositoryImpl {
    async fn find_by_sha(&self, sha: &str) -> Result<Option<AccessToken>> {
        if sha.is_empty() {
            return Ok(None);
        }

        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, uid, name, sha, created_at, updated_at
            FROM access_tokens
            WHERE sha = ?
            "#,
        )
        .bind(sha)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn create(&self, uid: i64, name: &str) -> Result<AccessToken> {
        let sha = crypto::generate_token_sha();

        let result = sqlx::query(
            r#"
            INSERT INTO access_tokens (uid, name, sha, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(uid)
        .bind(name)
        .bind(&sha)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create access token")))
    }
}
