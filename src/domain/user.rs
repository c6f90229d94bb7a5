//! User domain model

use crate::crypto;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Names that would shadow top-level routes or path segments
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "-", "api", "user", "admin", "assets", "health", "ready", "metrics", "new",
];

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Lowercased `name`, used for case-insensitive lookup
    #[serde(skip)]
    pub lower_name: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            lower_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl User {
    /// Check a plaintext password against the stored hash.
    pub fn validate_password(&self, password: &str) -> bool {
        crypto::verify_password(password, &self.password_hash)
    }
}

fn validate_user_name(name: &str) -> Result<(), validator::ValidationError> {
    let lower = name.to_lowercase();
    if RESERVED_NAMES.contains(&lower.as_str()) || name.trim() != name {
        return Err(validator::ValidationError::new("reserved_name"));
    }
    Ok(())
}

/// Input for creating a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "validate_user_name")
    )]
    pub name: String,
    #[validate(length(min = 3, max = 254), contains(pattern = "@"))]
    pub email: String,
    /// Plaintext; hashed by the repository before it is stored
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    pub is_active: bool,
}
