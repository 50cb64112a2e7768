// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral per-session flow state.
//!
//! Flow state is cache-backed, not a database table: it is created lazily on
//! first access, expires after a fixed window of inactivity, and is advanced
//! only by validated input. Each entry sits behind its own async mutex so a
//! session's read-modify-write is a critical section while sessions stay
//! independent of each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::step::{FlowStep, InputKind};

/// Mutable flow record for one session.
#[derive(Debug, Clone)]
pub struct FlowState {
    pub current_step: FlowStep,
    /// Validated values keyed by the input kind that collected them.
    pub collected: HashMap<InputKind, String>,
    pub updated_at: DateTime<Utc>,
}

impl FlowState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current_step: FlowStep::Welcome,
            collected: HashMap::new(),
            updated_at: now,
        }
    }

    /// True when both required contact fields have been collected.
    pub fn has_contact_info(&self) -> bool {
        self.collected.contains_key(&InputKind::Phone)
            && self.collected.contains_key(&InputKind::Name)
    }
}

/// In-memory store of per-session flow records with TTL expiry.
pub struct FlowStore {
    entries: DashMap<String, Arc<Mutex<FlowState>>>,
    ttl: Duration,
}

impl FlowStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch the record for a session, creating a fresh one when absent or
    /// expired. The caller locks the returned mutex for the whole
    /// read-modify-write.
    pub fn entry(&self, session_id: &str, now: DateTime<Utc>) -> Arc<Mutex<FlowState>> {
        let ttl = self.ttl;
        let entry = self
            .entries
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(FlowState::fresh(now))));
        let state = Arc::clone(entry.value());
        drop(entry);

        // Expiry is checked under the entry lock so a concurrent request
        // cannot observe a half-reset record. A busy entry is in use and by
        // definition not expired.
        if let Ok(mut guard) = state.try_lock() {
            if now.signed_duration_since(guard.updated_at)
                > chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
            {
                *guard = FlowState::fresh(now);
            }
        }
        state
    }

    /// Explicitly reset a session's flow to the initial step.
    pub fn reset(&self, session_id: &str) {
        self.entries.remove(session_id);
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let before = self.entries.len();
        self.entries.retain(|_, state| {
            state
                .try_lock()
                .map(|guard| now.signed_duration_since(guard.updated_at) <= ttl)
                // A locked entry is in use and therefore not expired.
                .unwrap_or(true)
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn entry_creates_lazily_and_persists() {
        let store = FlowStore::new(Duration::from_secs(7 * 24 * 3600));
        let now = ts("2026-01-01T00:00:00Z");

        let entry = store.entry("s1", now);
        {
            let mut guard = entry.lock().await;
            assert_eq!(guard.current_step, FlowStep::Welcome);
            guard.current_step = FlowStep::FirstMessageReceived;
            guard.updated_at = now;
        }

        let again = store.entry("s1", now);
        assert_eq!(
            again.lock().await.current_step,
            FlowStep::FirstMessageReceived
        );
    }

    #[tokio::test]
    async fn expired_entry_is_reset_on_access() {
        let store = FlowStore::new(Duration::from_secs(7 * 24 * 3600));
        let created = ts("2026-01-01T00:00:00Z");

        let entry = store.entry("s1", created);
        {
            let mut guard = entry.lock().await;
            guard.current_step = FlowStep::ChatActive;
            guard.collected.insert(InputKind::Phone, "09123456789".into());
        }

        // Eight days later the record has lapsed.
        let later = ts("2026-01-09T00:00:01Z");
        let entry = store.entry("s1", later);
        let guard = entry.lock().await;
        assert_eq!(guard.current_step, FlowStep::Welcome);
        assert!(guard.collected.is_empty());
    }

    #[tokio::test]
    async fn sweep_drops_only_expired() {
        let store = FlowStore::new(Duration::from_secs(7 * 24 * 3600));
        store.entry("old", ts("2026-01-01T00:00:00Z"));
        store.entry("new", ts("2026-01-08T00:00:00Z"));

        let removed = store.sweep(ts("2026-01-09T00:00:00Z"));
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reset_forgets_the_session() {
        let store = FlowStore::new(Duration::from_secs(60));
        let now = ts("2026-01-01T00:00:00Z");
        let entry = store.entry("s1", now);
        entry.lock().await.current_step = FlowStep::ChatActive;

        store.reset("s1");
        let entry = store.entry("s1", now);
        assert_eq!(entry.lock().await.current_step, FlowStep::Welcome);
    }
}
