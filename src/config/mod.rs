// src/config/mod.rs

//! Configuration loading and validation for taskpoll.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate interval bounds and API settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ApiSection, ConfigFile, PollingSection};
pub use validate::validate_config;
