//! User repository

use crate::crypto;
use crate::domain::{CreateUserInput, User};
use crate::error::{is_unique_violation, AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `Ok(None)` when no such user exists
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    /// Case-insensitive lookup by user name
    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;
    /// Fails with `AppError::Conflict` when the name or e-mail is taken
    async fn create(&self, input: &CreateUserInput) -> Result<User>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lower_name, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        if name.is_empty() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lower_name, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE lower_name = ?
            "#,
        )
        .bind(name.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let password_hash = crypto::hash_password(&input.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, lower_name, email, password_hash, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.name)
        .bind(input.name.to_lowercase())
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("User '{}' already exists", input.name))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = result.last_insert_id() as i64;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }
}
