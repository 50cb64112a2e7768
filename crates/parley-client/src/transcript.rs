// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rendered transcript and its entries.
//!
//! Entries are owned exclusively by the reconciliation engine; nothing else
//! mutates them. `local_id` is the client-generated key that correlates an
//! optimistic entry with its eventual server-confirmed counterpart.

use chrono::{DateTime, Utc};
use parley_core::types::AuthorKind;

/// Prefix marking client-generated temporary identifiers.
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Visual delivery state of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Optimistically rendered, persist request in flight.
    Sending,
    /// Server acknowledged the persist.
    Sent,
    /// Received from another party.
    Delivered,
    /// Send failed or timed out. Errored entries stay eligible for
    /// replacement: a late server echo still reconciles them, otherwise a
    /// timed-out-then-persisted send would ghost as a permanent duplicate.
    Error,
}

/// Which side of the transcript an entry renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Visitor messages, right-aligned.
    VisitorRight,
    /// Operator and system messages, left-aligned.
    OperatorLeft,
}

impl Lane {
    pub fn for_author(kind: AuthorKind) -> Lane {
        match kind {
            AuthorKind::User => Lane::VisitorRight,
            AuthorKind::Admin | AuthorKind::System => Lane::OperatorLeft,
        }
    }
}

/// One rendered message.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Client-side key. Temporary (`tmp-…`) for optimistic sends until the
    /// canonical entry is spliced in, the server identifier otherwise.
    pub local_id: String,
    /// Server-assigned id, populated once confirmed.
    pub server_id: Option<i64>,
    pub text: String,
    pub author_kind: AuthorKind,
    pub author_name: String,
    pub status: EntryStatus,
    pub timestamp: DateTime<Utc>,
    /// Inline failure reason shown under an errored entry.
    pub error: Option<String>,
}

impl TranscriptEntry {
    pub fn lane(&self) -> Lane {
        Lane::for_author(self.author_kind)
    }

    /// Status glyphs attach only to visitor-authored entries.
    pub fn status_glyph(&self) -> Option<&'static str> {
        if self.author_kind != AuthorKind::User {
            return None;
        }
        Some(match self.status {
            EntryStatus::Sending => "pending",
            EntryStatus::Sent => "sent",
            EntryStatus::Delivered => "delivered",
            EntryStatus::Error => "error",
        })
    }

    /// Pending means "a server echo may still claim this entry": both
    /// in-flight and errored optimistic entries qualify.
    pub fn is_pending_optimistic(&self) -> bool {
        self.local_id.starts_with(TEMP_ID_PREFIX)
            && matches!(self.status, EntryStatus::Sending | EntryStatus::Error)
    }
}

/// Ordered list of rendered entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, local_id: &str) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|e| e.local_id == local_id)
    }

    pub fn get_mut(&mut self, local_id: &str) -> Option<&mut TranscriptEntry> {
        self.entries.iter_mut().find(|e| e.local_id == local_id)
    }

    /// Replace the entry at `local_id`'s position with `replacement`,
    /// keeping transcript order. Returns false when no such entry exists
    /// (e.g. it was already spliced).
    pub fn splice(&mut self, local_id: &str, replacement: TranscriptEntry) -> bool {
        match self.entries.iter().position(|e| e.local_id == local_id) {
            Some(idx) => {
                self.entries[idx] = replacement;
                true
            }
            None => false,
        }
    }
}
