//! Record Store error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("game not found: {0}")]
    GameNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
}
