// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{PollerError, Result};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - interval bounds are non-zero and ordered, and the step is non-zero
/// - the API base URL is an http(s) URL
/// - the request timeout is non-zero
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    cfg.polling.to_options().validate().map_err(|e| match e {
        PollerError::ConfigError(msg) => PollerError::ConfigError(format!("[polling]: {msg}")),
        other => other,
    })?;
    validate_api(cfg)?;
    Ok(())
}

fn validate_api(cfg: &ConfigFile) -> Result<()> {
    let base_url = cfg.api.base_url.trim();
    if base_url.is_empty() {
        return Err(PollerError::ConfigError(
            "[api].base_url must not be empty".to_string(),
        ));
    }

    let url = reqwest::Url::parse(base_url).map_err(|e| {
        PollerError::ConfigError(format!("[api].base_url is not a valid URL ({base_url}): {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PollerError::ConfigError(format!(
            "[api].base_url must use http or https (got {})",
            url.scheme()
        )));
    }

    if cfg.api.request_timeout_ms == 0 {
        return Err(PollerError::ConfigError(
            "[api].request_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
