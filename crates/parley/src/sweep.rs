// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley sweep` command implementation.
//!
//! One-shot retention pass meant for cron: deletes non-active sessions
//! whose last activity is older than `retention.sweep_days`. Messages go
//! with their session via the foreign-key cascade.

use chrono::{Duration as ChronoDuration, Utc};
use parley_config::ParleyConfig;
use parley_core::error::ParleyError;
use parley_core::types::time;
use parley_storage::database::Database;
use parley_storage::queries::sessions;

pub async fn run_sweep(config: ParleyConfig) -> Result<(), ParleyError> {
    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;

    let cutoff = Utc::now() - ChronoDuration::days(config.retention.sweep_days as i64);
    let removed = sessions::sweep_stale_sessions(&db, &time::to_rfc3339(cutoff)).await?;

    println!(
        "swept {removed} session(s) inactive since {}",
        time::to_rfc3339(cutoff)
    );
    db.close().await
}
