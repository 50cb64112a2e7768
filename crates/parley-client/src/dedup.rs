// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dedup index: identifier set plus a bounded rolling history window.
//!
//! The identifier set catches exact redeliveries. The rolling window of
//! `{id, text, timestamp}` triples is the fallback correlation key for the
//! relay's at-least-once redelivery combined with identifier inconsistency
//! between sources: identical trimmed text within a small time tolerance is
//! the same logical message even when the identifiers disagree.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Capacity of the rolling history window.
pub const HISTORY_WINDOW: usize = 50;

/// Timestamps within this many seconds of an identical-text entry count as
/// the same logical message.
pub const PROXIMITY_TOLERANCE_SECS: i64 = 5;

/// One entry of the rolling window.
#[derive(Debug, Clone)]
struct RecentMessage {
    text: String,
    timestamp: DateTime<Utc>,
}

/// In-memory, widget-lifetime index of everything already rendered.
#[derive(Debug, Default)]
pub struct DedupIndex {
    ids: HashSet<String>,
    recent: VecDeque<RecentMessage>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a deterministic identifier from a message without one, so that
    /// identical (text, time-bucket) pairs collapse to the same id across
    /// independent sources.
    pub fn derive_id(text: &str, timestamp: DateTime<Utc>) -> String {
        let bucket = timestamp.timestamp().div_euclid(PROXIMITY_TOLERANCE_SECS);
        let digest = Sha256::digest(text.trim().as_bytes());
        format!("d-{bucket}-{}", hex::encode(&digest[..6]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// True when a rendered message with identical trimmed text sits within
    /// the time tolerance of `timestamp`.
    pub fn proximity_match(&self, text: &str, timestamp: DateTime<Utc>) -> bool {
        let trimmed = text.trim();
        self.recent.iter().any(|recent| {
            recent.text == trimmed
                && (recent.timestamp - timestamp).num_seconds().abs() <= PROXIMITY_TOLERANCE_SECS
        })
    }

    /// Record a rendered message in the rolling window, evicting the oldest
    /// entry when over capacity.
    pub fn remember(&mut self, text: &str, timestamp: DateTime<Utc>) {
        if self.recent.len() >= HISTORY_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(RecentMessage {
            text: text.trim().to_string(),
            timestamp,
        });
    }

    #[cfg(test)]
    pub(crate) fn window_len(&self) -> usize {
        self.recent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn derived_ids_collapse_same_bucket_same_text() {
        let a = DedupIndex::derive_id("hello", ts("2026-01-01T00:00:00Z"));
        let b = DedupIndex::derive_id("  hello  ", ts("2026-01-01T00:00:04Z"));
        assert_eq!(a, b);

        let other_bucket = DedupIndex::derive_id("hello", ts("2026-01-01T00:00:06Z"));
        assert_ne!(a, other_bucket);
        let other_text = DedupIndex::derive_id("goodbye", ts("2026-01-01T00:00:00Z"));
        assert_ne!(a, other_text);
    }

    #[test]
    fn id_set_round_trip() {
        let mut index = DedupIndex::new();
        index.insert("42");
        assert!(index.contains("42"));
        assert!(index.remove("42"));
        assert!(!index.contains("42"));
        assert!(!index.remove("42"));
    }

    #[test]
    fn proximity_matches_within_tolerance_only() {
        let mut index = DedupIndex::new();
        index.remember("hello world", ts("2026-01-01T00:00:10Z"));

        assert!(index.proximity_match("hello world", ts("2026-01-01T00:00:12Z")));
        assert!(index.proximity_match(" hello world ", ts("2026-01-01T00:00:05Z")));
        assert!(!index.proximity_match("hello world", ts("2026-01-01T00:00:16Z")));
        assert!(!index.proximity_match("hello there", ts("2026-01-01T00:00:10Z")));
    }

    #[test]
    fn window_evicts_oldest_at_capacity() {
        let mut index = DedupIndex::new();
        for i in 0..HISTORY_WINDOW + 10 {
            index.remember(&format!("msg {i}"), ts("2026-01-01T00:00:00Z"));
        }
        assert_eq!(index.window_len(), HISTORY_WINDOW);
        assert!(!index.proximity_match("msg 0", ts("2026-01-01T00:00:00Z")));
        assert!(index.proximity_match("msg 59", ts("2026-01-01T00:00:00Z")));
    }
}
