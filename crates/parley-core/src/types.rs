// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Parley workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque stable token identifying one visitor browser identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    /// The visitor using the widget.
    User,
    /// A human operator on the console.
    Admin,
    /// Automated prompts from the flow engine.
    System,
}

/// Lifecycle state of a chat session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// Wire form of a chat message, as served by history fetches and carried in
/// `new-message` push events. Server-assigned `id` is monotonic per log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub author_kind: AuthorKind,
    pub author_name: String,
    pub body: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
    #[serde(default)]
    pub is_read: bool,
}

/// A signed grant authorizing one socket to join one private channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGrant {
    /// Channel the grant is scoped to.
    pub channel: String,
    /// `hex(HMAC-SHA256(secret, "socket_id:channel"))`.
    pub signature: String,
}

/// Timestamp helpers. All persisted and pushed timestamps use RFC 3339 with
/// millisecond precision in UTC, which keeps them lexicographically sortable.
pub mod time {
    use chrono::{SecondsFormat, Utc};

    /// Current time as `2026-01-01T00:00:00.000Z`.
    pub fn now_rfc3339() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Format an arbitrary instant the same way.
    pub fn to_rfc3339(t: chrono::DateTime<Utc>) -> String {
        t.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Event names pushed over relay channels.
pub mod events {
    /// A persisted message fanned out to a session channel.
    pub const NEW_MESSAGE: &str = "new-message";
    /// Visitor or operator started typing.
    pub const TYPING_START: &str = "typing-start";
    /// Typing stopped.
    pub const TYPING_STOP: &str = "typing-stop";
    /// Broadcast: an operator came online.
    pub const OPERATOR_ONLINE: &str = "operator-online";
    /// Broadcast: a visitor opened a brand-new session.
    pub const NEW_SESSION_CREATED: &str = "new-session-created";
    /// Broadcast: a visitor handed over both contact fields.
    pub const LEAD_CAPTURED: &str = "lead-captured";
}

/// Payload of a [`events::NEW_MESSAGE`] push.
///
/// Kept separate from [`ChatMessage`] because pushes from older server builds
/// may omit the id, which is exactly why the client keeps a content+time
/// fallback correlation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessagePayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
    pub author_kind: AuthorKind,
    #[serde(default)]
    pub author_name: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn author_kind_round_trips_through_strings() {
        for kind in [AuthorKind::User, AuthorKind::Admin, AuthorKind::System] {
            let s = kind.to_string();
            assert_eq!(AuthorKind::from_str(&s).unwrap(), kind);
        }
        assert_eq!(AuthorKind::Admin.to_string(), "admin");
    }

    #[test]
    fn new_message_payload_tolerates_missing_id() {
        let json = r#"{"text":"hi","author_kind":"admin","timestamp":"2026-01-01T00:00:00Z"}"#;
        let payload: NewMessagePayload = serde_json::from_str(json).unwrap();
        assert!(payload.id.is_none());
        assert_eq!(payload.author_kind, AuthorKind::Admin);
    }

    #[test]
    fn session_status_serializes_snake_case() {
        let s = serde_json::to_string(&SessionStatus::Active).unwrap();
        assert_eq!(s, r#""active""#);
    }
}
