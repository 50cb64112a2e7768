// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and call through
//! `db.connection().call()`. Do NOT create additional Connection instances
//! for writes.

use parley_core::ParleyError;
use tokio_rusqlite::Connection;

use crate::migrations;

/// Handle to the single SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run all
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, ParleyError> {
        Self::open_with(path, true).await
    }

    /// Open with explicit WAL-mode control (config `storage.wal_mode`).
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, ParleyError> {
        let conn = Connection::open(path).await.map_err(map_sql_err)?;
        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(map_sql_err)?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(map_sql_err)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(map_sql_err)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => ParleyError::Storage {
                source: Box::new(other),
            },
        })?;
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, flushing pending writes.
    pub async fn close(self) -> Result<(), ParleyError> {
        self.conn
            .close()
            .await
            .map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })
    }
}

/// Map a rusqlite error into the workspace error type.
pub fn map_sql_err(e: rusqlite::Error) -> ParleyError {
    ParleyError::Storage {
        source: Box::new(e),
    }
}

/// Map a tokio-rusqlite call error into the workspace error type. Taking
/// the non-generic alias also pins the call closure's error type to
/// `rusqlite::Error` at every query site.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> ParleyError {
    ParleyError::Storage {
        source: Box::new(e),
    }
}
