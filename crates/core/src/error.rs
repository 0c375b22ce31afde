//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid game configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid round state: {0}")]
    RoundError(String),

    #[error("Scoring error: {0}")]
    ScoringError(String),
}
