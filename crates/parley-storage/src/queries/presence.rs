// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator presence heartbeats.

use parley_core::ParleyError;
use rusqlite::params;

use crate::database::Database;

/// Record (or refresh) an operator heartbeat.
pub async fn upsert_heartbeat(
    db: &Database,
    operator: &str,
    now: &str,
) -> Result<(), ParleyError> {
    let operator = operator.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO operator_presence (operator, status, last_seen)
                 VALUES (?1, 'online', ?2)
                 ON CONFLICT(operator) DO UPDATE SET status = 'online', last_seen = ?2",
                params![operator, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an operator offline without dropping the row.
pub async fn set_offline(db: &Database, operator: &str) -> Result<(), ParleyError> {
    let operator = operator.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE operator_presence SET status = 'offline' WHERE operator = ?1",
                params![operator],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count operators online and seen at or after `since`.
pub async fn online_operator_count(db: &Database, since: &str) -> Result<i64, ParleyError> {
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM operator_presence
                 WHERE status = 'online' AND last_seen >= ?1",
                params![since],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
