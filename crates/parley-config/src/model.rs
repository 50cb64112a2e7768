// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// HTTP server bind settings and operator auth.
    #[serde(default)]
    pub server: ServerConfig,

    /// Push relay credentials. Leaving `secret` empty disables realtime
    /// fan-out (the gateway falls back to the null relay).
    #[serde(default)]
    pub relay: RelayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation flow engine settings.
    #[serde(default)]
    pub flow: FlowConfig,

    /// Session retention sweep settings.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token protecting operator routes. When unset, operator routes
    /// reject every request (fail-closed).
    #[serde(default)]
    pub operator_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            operator_token: None,
            log_level: default_log_level(),
        }
    }
}

/// Hosted push relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Base URL of the relay's REST publish endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Application key, embedded in publish requests.
    #[serde(default)]
    pub app_key: Option<String>,

    /// Shared secret used to sign channel-auth grants.
    #[serde(default)]
    pub secret: Option<String>,

    /// Prefix for private per-session channels.
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            app_key: None,
            secret: None,
            channel_prefix: default_channel_prefix(),
        }
    }
}

impl RelayConfig {
    /// True when every credential needed to reach the hosted relay is set.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.app_key.is_some() && self.secret.is_some()
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

/// Conversation flow engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowConfig {
    /// Enable the staged data-collection flow for new sessions.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// An operator counts as online when seen within this many seconds.
    #[serde(default = "default_operator_window")]
    pub operator_window_secs: u64,

    /// Idle flow state is dropped after this many days.
    #[serde(default = "default_state_ttl_days")]
    pub state_ttl_days: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            operator_window_secs: default_operator_window(),
            state_ttl_days: default_state_ttl_days(),
        }
    }
}

/// Session retention sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Sessions inactive for more than this many days and not active are
    /// deleted by `parley sweep`.
    #[serde(default = "default_sweep_days")]
    pub sweep_days: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_days: default_sweep_days(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8321
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channel_prefix() -> String {
    "private-chat".to_string()
}

fn default_database_path() -> String {
    "parley.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_operator_window() -> u64 {
    300
}

fn default_state_ttl_days() -> u64 {
    7
}

fn default_sweep_days() -> u64 {
    30
}
