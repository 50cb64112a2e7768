// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Partial relay credentials are a misconfiguration, not a disabled relay.
    let relay = &config.relay;
    let set_count = [
        relay.base_url.is_some(),
        relay.app_key.is_some(),
        relay.secret.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if set_count != 0 && set_count != 3 {
        errors.push(ConfigError::Validation {
            message:
                "relay requires base_url, app_key, and secret together (or none to disable realtime)"
                    .to_string(),
        });
    }

    if config.relay.channel_prefix.trim().is_empty()
        || config.relay.channel_prefix.contains(char::is_whitespace)
    {
        errors.push(ConfigError::Validation {
            message: "relay.channel_prefix must be a non-empty token without whitespace".to_string(),
        });
    }

    if config.flow.operator_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "flow.operator_window_secs must be greater than zero".to_string(),
        });
    }

    if config.retention.sweep_days == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.sweep_days must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
