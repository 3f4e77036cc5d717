// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::engine::PollerOptions;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [polling]
/// min_interval_ms = 2000
/// max_interval_ms = 10000
/// step_ms = 1000
/// auto_start = true
///
/// [api]
/// base_url = "http://localhost:3000"
/// token = "sk-..."
/// request_timeout_ms = 15000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub polling: PollingSection,

    #[serde(default)]
    pub api: ApiSection,
}

/// `[polling]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSection {
    /// Delay before the first tick and the floor of the adaptive interval.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Ceiling of the adaptive interval; also used while hidden or when every
    /// query of a tick failed.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Growth per tick while tasks are still pending/running.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// Start and stop automatically as the watch set fills and empties.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_min_interval_ms() -> u64 {
    2_000
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_step_ms() -> u64 {
    1_000
}

fn default_auto_start() -> bool {
    true
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            step_ms: default_step_ms(),
            auto_start: default_auto_start(),
        }
    }
}

impl PollingSection {
    /// Engine options for this section (unvalidated).
    pub fn to_options(&self) -> PollerOptions {
        PollerOptions {
            min_interval: Duration::from_millis(self.min_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            step: Duration::from_millis(self.step_ms),
            auto_start: self.auto_start,
        }
    }
}

/// `[api]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    /// Base URL of the image task API (scheme + host, optional path prefix).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout for status queries.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ApiSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
