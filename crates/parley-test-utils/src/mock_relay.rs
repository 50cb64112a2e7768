// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory relay capturing published events for assertions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::error::ParleyError;
use parley_core::traits::adapter::{HealthStatus, PluginAdapter};
use parley_core::traits::relay::RelayAdapter;
use parley_core::types::{ChannelGrant, SessionId};
use parley_relay::channels::ChannelNames;

/// One captured publish.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Relay double: records every publish, authorizes with the same channel
/// rules as the hosted relay, and can be flipped into a failing state to
/// exercise fire-and-forget paths.
pub struct MockRelay {
    channels: ChannelNames,
    published: Mutex<Vec<PublishedEvent>>,
    fail_publish: AtomicBool,
}

impl MockRelay {
    pub fn new(prefix: &str) -> Self {
        Self {
            channels: ChannelNames::new(prefix),
            published: Mutex::new(Vec::new()),
            fail_publish: AtomicBool::new(false),
        }
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Events published to one channel with a given name.
    pub fn events_on(&self, channel: &str, event: &str) -> Vec<PublishedEvent> {
        self.published()
            .into_iter()
            .filter(|e| e.channel == channel && e.event == event)
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockRelay {
    fn name(&self) -> &str {
        "mock-relay"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl RelayAdapter for MockRelay {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), ParleyError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(ParleyError::Relay {
                message: "mock relay configured to fail".to_string(),
                source: None,
            });
        }
        self.published.lock().unwrap().push(PublishedEvent {
            channel: channel.to_string(),
            event: event.to_string(),
            payload,
        });
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
            signature: format!("mock:{socket_id}:{channel}"),
        })
    }
}
