// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget relay fan-out.
//!
//! Chat traffic never blocks on the relay: a publish failure is logged and
//! the HTTP response proceeds, the client falls back to history polling.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::error::ParleyError;
use parley_core::traits::relay::RelayAdapter;
use parley_core::types::{events, AuthorKind, NewMessagePayload, SessionId};
use parley_flow::engine::OperatorNotifier;
use parley_relay::channels::ChannelNames;
use serde_json::json;
use tracing::warn;

pub fn spawn_publish(
    relay: Arc<dyn RelayAdapter>,
    channel: String,
    event: &'static str,
    payload: serde_json::Value,
) {
    tokio::spawn(async move {
        if let Err(err) = relay.publish(&channel, event, payload).await {
            warn!(%channel, event, error = %err, "relay publish failed");
        }
    });
}

/// Push one persisted message to its session channel.
pub fn push_message(
    relay: Arc<dyn RelayAdapter>,
    channels: &ChannelNames,
    session_id: &SessionId,
    id: i64,
    text: &str,
    author_kind: AuthorKind,
    author_name: &str,
    timestamp: &str,
) {
    let payload = NewMessagePayload {
        id: Some(id),
        text: text.to_string(),
        author_kind,
        author_name: author_name.to_string(),
        timestamp: timestamp.to_string(),
    };
    let value = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "unserializable push payload");
            return;
        }
    };
    spawn_publish(
        relay,
        channels.session_channel(session_id),
        events::NEW_MESSAGE,
        value,
    );
}

/// Announce a brand-new session on the operator broadcast channel.
pub fn push_session_created(
    relay: Arc<dyn RelayAdapter>,
    channels: &ChannelNames,
    session_id: &SessionId,
    created_at: &str,
) {
    spawn_publish(
        relay,
        channels.broadcast_channel(),
        events::NEW_SESSION_CREATED,
        json!({ "session_id": session_id.as_str(), "created_at": created_at }),
    );
}

/// Flow-engine hook broadcasting captured contact details to operators.
pub struct RelayNotifier {
    relay: Arc<dyn RelayAdapter>,
    channels: ChannelNames,
}

impl RelayNotifier {
    pub fn new(relay: Arc<dyn RelayAdapter>, channels: ChannelNames) -> Self {
        Self { relay, channels }
    }
}

#[async_trait]
impl OperatorNotifier for RelayNotifier {
    async fn lead_captured(
        &self,
        session_id: &str,
        phone: &str,
        name: &str,
    ) -> Result<(), ParleyError> {
        self.relay
            .publish(
                &self.channels.broadcast_channel(),
                events::LEAD_CAPTURED,
                json!({ "session_id": session_id, "phone": phone, "name": name }),
            )
            .await
    }
}
