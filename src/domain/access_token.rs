//! Access token domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Opaque bearer credential owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessToken {
    pub id: i64,
    /// Owning user id
    pub uid: i64,
    pub name: String,
    /// Token value presented in `Authorization: token <sha>`
    #[serde(skip_serializing)]
    pub sha: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AccessToken {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            uid: 0,
            name: String::new(),
            sha: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Access token as returned once, right after creation
#[derive(Debug, Clone, Serialize)]
pub struct IssuedAccessToken {
    pub id: i64,
    pub name: String,
    pub sha: String,
    pub created_at: DateTime<Utc>,
}

impl From<AccessToken> for IssuedAccessToken {
    fn from(token: AccessToken) -> Self {
        Self {
            id: token.id,
            name: token.name,
            sha: token.sha,
            created_at: token.created_at,
        }
    }
}
