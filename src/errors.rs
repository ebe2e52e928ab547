// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::MessageId;

#[derive(Error, Debug)]
pub enum MsgschedError {
    /// `submit` was called with an identifier the scheduler already tracks.
    #[error("Duplicate message id: {0}")]
    DuplicateId(MessageId),

    /// The scheduler has begun shutting down (or its loop is gone).
    #[error("Scheduler is closed")]
    Closed,

    /// Structurally invalid message, rejected before touching scheduler state.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Non-blocking submission found the inbox full.
    #[error("Scheduler inbox is full")]
    QueueFull,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MsgschedError>;
