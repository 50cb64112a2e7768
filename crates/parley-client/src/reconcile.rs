// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution: merging optimistic, historical, and pushed messages
//! into one duplicate-free transcript.
//!
//! The invariant is that a given logical message renders exactly once, even
//! though the push channel redelivers, pushes race the history fetch, and a
//! push may lack the identifier the client assigned. The full resolution
//! runs to completion per event; index mutations and entry state changes
//! land together, only the *visual* splice of a confirmed optimistic entry
//! is deferred so the status change stays perceptible.

use chrono::{DateTime, Utc};
use parley_core::types::AuthorKind;
use tracing::debug;

use crate::dedup::DedupIndex;
use crate::transcript::{EntryStatus, Transcript, TranscriptEntry};

/// Decoration substrings the widget appends to optimistic text while a send
/// is in flight; stripped before text correlation.
const STATUS_DECORATIONS: &[&str] = &["(sending\u{2026})", "(failed)", "\u{23f3}", "\u{26a0}"];

/// A message arriving from the push channel or a history fetch.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Server identifier, absent on pushes from sources that drop it.
    pub id: Option<i64>,
    pub text: String,
    pub author_kind: AuthorKind,
    pub author_name: String,
    pub timestamp: DateTime<Utc>,
}

/// What resolution decided for one incoming message.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// True duplicate or content+time proximity hit; nothing rendered.
    /// Not an error: logged for diagnostics only.
    Suppressed,
    /// The incoming message is the server echo of a pending optimistic
    /// entry. The entry is already marked sent; the caller splices
    /// `canonical` over `local_id` after a perceptible delay.
    Confirmed {
        local_id: String,
        canonical: TranscriptEntry,
    },
    /// Genuinely new message from another party, appended.
    Appended { local_id: String },
}

fn strip_decorations(text: &str) -> String {
    let mut out = text.to_string();
    for decoration in STATUS_DECORATIONS {
        out = out.replace(decoration, "");
    }
    out.trim().to_string()
}

/// Owns the transcript and dedup index; every mutation funnels through here.
#[derive(Debug, Default)]
pub struct Reconciler {
    transcript: Transcript,
    index: DedupIndex,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Render an optimistic entry for a visitor send and register its
    /// temporary id immediately, so a fast echo is not treated as brand-new.
    pub fn register_optimistic(
        &mut self,
        temp_id: &str,
        text: &str,
        author_name: &str,
        now: DateTime<Utc>,
    ) {
        self.index.insert(temp_id);
        self.transcript.push(TranscriptEntry {
            local_id: temp_id.to_string(),
            server_id: None,
            text: text.to_string(),
            author_kind: AuthorKind::User,
            author_name: author_name.to_string(),
            status: EntryStatus::Sending,
            timestamp: now,
            error: None,
        });
    }

    /// Confirm an optimistic entry from the request acknowledgement path.
    ///
    /// The push echo may have won the race and confirmed it already; in that
    /// case only make sure the server id is indexed.
    pub fn confirm_ack(&mut self, local_id: &str, server_id: i64, now: DateTime<Utc>) {
        self.index.insert(server_id.to_string());
        if let Some(entry) = self.transcript.get_mut(local_id) {
            if matches!(entry.status, EntryStatus::Sending | EntryStatus::Error) {
                entry.status = EntryStatus::Sent;
                entry.server_id = Some(server_id);
                entry.error = None;
                let text = entry.text.clone();
                self.index.remember(&text, now);
            }
        }
    }

    /// Mark an optimistic entry failed and drop its temporary id from the
    /// index, so a retry with the same text is not wrongly suppressed. The
    /// entry itself stays eligible for replacement by a late echo.
    pub fn mark_error(&mut self, local_id: &str, reason: &str) {
        self.index.remove(local_id);
        if let Some(entry) = self.transcript.get_mut(local_id) {
            entry.status = EntryStatus::Error;
            entry.error = Some(reason.to_string());
        }
    }

    /// Run identity resolution for one pushed or fetched message.
    pub fn resolve(&mut self, incoming: IncomingMessage) -> ResolveOutcome {
        // 1. Accept the source identifier, or derive one deterministically.
        let identifier = match incoming.id {
            Some(id) => id.to_string(),
            None => DedupIndex::derive_id(&incoming.text, incoming.timestamp),
        };

        // 2. Exact redelivery.
        if self.index.contains(&identifier) {
            debug!(%identifier, "suppressed duplicate by identifier");
            return ResolveOutcome::Suppressed;
        }

        // 3. Identical text within tolerance of something already rendered,
        //    identifiers notwithstanding.
        if self.index.proximity_match(&incoming.text, incoming.timestamp) {
            debug!(%identifier, "suppressed duplicate by content+time proximity");
            return ResolveOutcome::Suppressed;
        }

        // 4. Server echo of a pending optimistic send?
        let incoming_text = strip_decorations(&incoming.text);
        let pending = self
            .transcript
            .entries()
            .iter()
            .find(|e| e.is_pending_optimistic() && strip_decorations(&e.text) == incoming_text)
            .map(|e| e.local_id.clone());

        if let Some(local_id) = pending {
            // Index mutations happen now, atomically with this event; only
            // the node swap is deferred by the caller.
            self.index.remove(&local_id);
            self.index.insert(identifier.clone());
            self.index.remember(&incoming.text, incoming.timestamp);

            let entry = self
                .transcript
                .get_mut(&local_id)
                .expect("entry just found by id");
            entry.status = EntryStatus::Sent;
            entry.server_id = incoming.id;
            entry.error = None;

            let canonical = TranscriptEntry {
                local_id: identifier,
                server_id: incoming.id,
                text: incoming.text,
                author_kind: entry.author_kind,
                author_name: entry.author_name.clone(),
                status: EntryStatus::Sent,
                timestamp: incoming.timestamp,
                error: None,
            };
            return ResolveOutcome::Confirmed {
                local_id,
                canonical,
            };
        }

        // 5. Genuinely new message from another party.
        self.index.insert(identifier.clone());
        self.index.remember(&incoming.text, incoming.timestamp);
        self.transcript.push(TranscriptEntry {
            local_id: identifier.clone(),
            server_id: incoming.id,
            text: incoming.text,
            author_kind: incoming.author_kind,
            author_name: incoming.author_name,
            status: EntryStatus::Delivered,
            timestamp: incoming.timestamp,
            error: None,
        });
        ResolveOutcome::Appended {
            local_id: identifier,
        }
    }

    /// Apply the deferred visual splice of a confirmed optimistic entry.
    pub fn apply_splice(&mut self, local_id: &str, canonical: TranscriptEntry) {
        self.transcript.splice(local_id, canonical);
    }
}
