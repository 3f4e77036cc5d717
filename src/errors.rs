// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::fetch::QueryError;

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Status query error: {0}")]
    QueryError(#[from] QueryError),

    #[error("Poller runtime is no longer running")]
    RuntimeClosed,

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PollerError>;
