// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST client for the hosted pub/sub relay.
//!
//! The relay's wire protocol is not ours: we only publish events over its
//! REST API and sign channel-subscribe grants. Delivery downstream of the
//! publish is at-least-once and unordered with respect to our own HTTP
//! responses, which the client reconciliation engine is built around.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use parley_core::traits::adapter::{HealthStatus, PluginAdapter};
use parley_core::types::{ChannelGrant, SessionId};
use parley_core::{ParleyError, RelayAdapter};
use sha2::Sha256;

use crate::channels::ChannelNames;

type HmacSha256 = Hmac<Sha256>;

/// Credentials and endpoint for the hosted relay.
#[derive(Clone)]
pub struct HostedRelayConfig {
    pub base_url: String,
    pub app_key: String,
    pub secret: String,
    pub channel_prefix: String,
}

impl std::fmt::Debug for HostedRelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedRelayConfig")
            .field("base_url", &self.base_url)
            .field("app_key", &self.app_key)
            .field("secret", &"[redacted]")
            .field("channel_prefix", &self.channel_prefix)
            .finish()
    }
}

/// Publishes events to the hosted relay and signs channel grants.
pub struct HostedRelay {
    config: HostedRelayConfig,
    channels: ChannelNames,
    http: reqwest::Client,
}

impl HostedRelay {
    pub fn new(config: HostedRelayConfig) -> Self {
        let channels = ChannelNames::new(config.channel_prefix.clone());
        Self {
            config,
            channels,
            http: reqwest::Client::new(),
        }
    }

    /// The channel naming scheme this relay signs for.
    pub fn channels(&self) -> &ChannelNames {
        &self.channels
    }

    /// `hex(HMAC-SHA256(secret, "socket_id:channel"))`.
    fn sign_grant(&self, socket_id: &str, channel: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(format!("{socket_id}:{channel}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PluginAdapter for HostedRelay {
    fn name(&self) -> &str {
        "hosted-relay"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let url = format!("{}/health", self.config.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Unhealthy(format!(
                "relay health returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("relay unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl RelayAdapter for HostedRelay {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), ParleyError> {
        let url = format!("{}/apps/{}/events", self.config.base_url, self.config.app_key);
        let body = serde_json::json!({
            "channel": channel,
            "name": event,
            "data": payload,
        });
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::Relay {
                message: format!("publish to {channel} failed"),
                source: Some(Box::new(e)),
            })?;
        if !resp.status().is_success() {
            return Err(ParleyError::Relay {
                message: format!("relay rejected publish to {channel}: {}", resp.status()),
                source: None,
            });
        }
        Ok(())
    }

    async fn authorize(
        &self,
        channel: &str,
        socket_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChannelGrant, ParleyError> {
        self.channels.check_subscription(channel, session_id)?;
        Ok(ChannelGrant {
            channel: channel.to_string(),
            signature: self.sign_grant(socket_id, channel),
        })
    }
}
