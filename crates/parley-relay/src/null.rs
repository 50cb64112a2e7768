// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay stand-in used when no relay credentials are configured.
//!
//! Publishes become debug logs and channel authorization is refused, which
//! downgrades the widget to history polling. Chat itself keeps working;
//! only the realtime layer reports Degraded.

use async_trait::async_trait;
use parley_core::traits::adapter::{HealthStatus, PluginAdapter};
use parley_core::types::{ChannelGrant, SessionId};
use parley_core::{ParleyError, RelayAdapter};
use tracing::debug;

/// Inert [`RelayAdapter`], selected once at construction when the relay is
/// unconfigured. No call-site type probing: callers hold a
/// `dyn RelayAdapter` either way.
pub struct NullRelay;

#[async_trait]
impl PluginAdapter for NullRelay {
    fn name(&self) -> &str {
        "null-relay"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Degraded(
            "relay not configured; realtime fan-out disabled".to_string(),
        ))
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl RelayAdapter for NullRelay {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        _payload: serde_json::Value,
    ) -> Result<(), ParleyError> {
        debug!(channel, event, "dropping publish: relay not configured");
        Ok(())
    }

    async fn authorize(
        &self,
        _channel: &str,
        _socket_id: &str,
        _session_id: Option<&SessionId>,
    ) -> Result<ChannelGrant, ParleyError> {
        Err(ParleyError::Config(
            "realtime is not configured on this server".to_string(),
        ))
    }
}
