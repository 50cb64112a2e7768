// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push relay trait for hosted channel-based pub/sub brokers.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelGrant, SessionId};

/// Adapter for an external pub/sub relay.
///
/// The relay delivers at-least-once and unordered with respect to
/// persistence: a push may reach a subscriber before or after the
/// corresponding request confirmation reaches the same client. Consumers
/// must reconcile accordingly; the publisher side makes no attempt to
/// sequence deliveries.
#[async_trait]
pub trait RelayAdapter: PluginAdapter {
    /// Publishes an event to a channel. Fire-and-forget at the call sites
    /// that relay chat traffic: failures are logged, never surfaced to the
    /// visitor.
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), ParleyError>;

    /// Authorizes a socket to join a private channel.
    ///
    /// Denies any channel name outside the session-scoped or
    /// operator-broadcast patterns, and denies when `session_id` does not
    /// match the session embedded in the channel name.
    async fn authorize(
        &self,
        channel: &str,
        socket_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChannelGrant, ParleyError>;
}
