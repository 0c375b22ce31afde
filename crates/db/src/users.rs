//! The minimal `User` row the Record Store's foreign keys point at.
//!
//! Full profile/auth fields (OAuth identities, avatars, password hashes) are
//! explicitly out of scope (spec §1) — token issuance and identity
//! management are external collaborators. This is just enough of a `users`
//! table to reference from `games`/`moves`/etc. and to back `GET /profile`.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::DbPool;
use crate::error::DbError;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String, // usr_XXXXXXXXXXXX
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Creates a user row if it doesn't already exist, identified by the id the
/// external auth middleware attached to the connection/request. Idempotent
/// so re-authenticating the same identity never conflicts.
pub async fn upsert_user(pool: &DbPool, id: &str, username: &str) -> Result<User, DbError> {
    let user = sqlx::query_as!(
        User,
        r#"
        INSERT INTO users (id, username)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
        RETURNING id, username, created_at
        "#,
        id,
        username
    )
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn get_user(pool: &DbPool, id: &str) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as!(
        User,
        r#"SELECT id, username, created_at FROM users WHERE id = $1"#,
        id
    )
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_users(pool: &DbPool, ids: &[String]) -> Result<Vec<User>, DbError> {
    let users = sqlx::query_as!(
        User,
        r#"SELECT id, username, created_at FROM users WHERE id = ANY($1)"#,
        ids
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}
