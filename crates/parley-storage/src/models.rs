// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! Timestamps are stored as RFC 3339 strings; ordering within a session is
//! by the messages table rowid, which SQLite assigns monotonically.

use parley_core::types::{AuthorKind, ChatMessage};
use serde::{Deserialize, Serialize};

/// One visitor browser identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
    /// `active` or `closed` (see `parley_core::SessionStatus`).
    pub status: String,
    pub created_at: String,
    pub last_activity: String,
}

/// A persisted chat message. Immutable once created, except `is_read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    /// `user`, `admin`, or `system` (see `parley_core::AuthorKind`).
    pub author_kind: String,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
    pub is_read: bool,
}

impl StoredMessage {
    /// Wire form served by history fetches and pushed as `new-message`.
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            session_id: self.session_id.clone(),
            author_kind: self
                .author_kind
                .parse::<AuthorKind>()
                .unwrap_or(AuthorKind::System),
            author_name: self.author_name.clone(),
            body: self.body.clone(),
            created_at: self.created_at.clone(),
            is_read: self.is_read,
        }
    }
}

/// Fields for a message about to be appended; the id is server-assigned.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: String,
    pub author_kind: String,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
}

/// A session plus the derived fields the operator console lists.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session: Session,
    pub unread_count: i64,
    pub last_message: Option<String>,
}
