//! Core domain logic for the trivia game server.
//!
//! This crate contains the round orchestrator (a pure reducer), nosy
//! selection, qualification assignment, scoring, and entity ID generation.
//! It performs no I/O; the realtime and db crates are the shells around it.

pub mod error;
pub mod game;
pub mod id;

pub use error::CoreError;
