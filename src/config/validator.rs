//! Configuration validation with aggregated errors.

use reqwest::Url;
use tracing::error;

use crate::config::settings::{KeystoneConfig, LoggingConfig, ServiceConfig, SettingsConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_keystone(&cfg.keystone, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        for e in &errors {
            error!("config validation: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.http.timeout_ms == 0 {
        errors.push("settings.http.timeout_ms must be > 0".to_string());
    }
    if settings.cache.max_entries == 0 {
        errors.push("settings.cache.max_entries must be > 0".to_string());
    }
    if let Some(logging) = &settings.logging {
        validate_logging(logging, errors);
    }
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "settings.logging.level '{}' is not one of {:?}",
            logging.level, LOG_LEVELS
        ));
    }
}

fn validate_keystone(keystone: &KeystoneConfig, errors: &mut Vec<String>) {
    if keystone.token_url.is_empty() {
        errors.push("keystone.token_url is empty".to_string());
    } else {
        match Url::parse(&keystone.token_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "keystone.token_url scheme '{}' is not http/https",
                url.scheme()
            )),
            Err(e) => errors.push(format!("keystone.token_url '{}' is invalid: {}", keystone.token_url, e)),
        }
    }
    if keystone.username.trim().is_empty() {
        errors.push("keystone.username is empty".to_string());
    }
    if keystone.service_type.trim().is_empty() {
        errors.push("keystone.service_type is empty".to_string());
    }
    if keystone.service_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        errors.push("keystone.service_name must not be blank when set".to_string());
    }
}
