// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-backed operator presence probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::types::time;
use parley_core::PresenceProbe;
use parley_storage::queries::presence;
use parley_storage::Database;

/// Presence probe backed by the `operator_presence` table.
///
/// An operator counts as online when a heartbeat row with status `online`
/// falls within the freshness window. Every failure path resolves to
/// offline; the flow engine must never tell a visitor someone is there when
/// the check itself broke.
pub struct StoragePresence {
    db: Arc<Database>,
    window: Duration,
}

impl StoragePresence {
    /// `window` is typically 300 seconds (config `flow.operator_window_secs`).
    pub fn new(db: Arc<Database>, window: Duration) -> Self {
        Self { db, window }
    }
}

#[async_trait]
impl PresenceProbe for StoragePresence {
    async fn operator_online(&self) -> bool {
        let window = chrono::Duration::from_std(self.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(300));
        let since = time::to_rfc3339(chrono::Utc::now() - window);
        match presence::online_operator_count(&self.db, &since).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!("presence probe failed, resolving to offline: {e}");
                false
            }
        }
    }
}
