// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD, visitor-info updates, and the retention sweep.

use parley_core::ParleyError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Session, SessionSummary};

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, rusqlite::Error> {
    Ok(Session {
        id: row.get(0)?,
        user_name: row.get(1)?,
        user_phone: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        last_activity: row.get(5)?,
    })
}

const SESSION_COLUMNS: &str = "id, user_name, user_phone, status, created_at, last_activity";

/// Create a new session row.
pub async fn create_session(db: &Database, session: &Session) -> Result<(), ParleyError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_name, user_phone, status, created_at, last_activity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id,
                    session.user_name,
                    session.user_phone,
                    session.status,
                    session.created_at,
                    session.last_activity,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump a session's `last_activity` to `now`.
pub async fn touch_session(db: &Database, id: &str, now: &str) -> Result<(), ParleyError> {
    let id = id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET last_activity = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store collected visitor info. `None` fields are left untouched.
pub async fn save_user_info(
    db: &Database,
    id: &str,
    phone: Option<&str>,
    name: Option<&str>,
) -> Result<(), ParleyError> {
    let id = id.to_string();
    let phone = phone.map(|s| s.to_string());
    let name = name.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET
                     user_phone = COALESCE(?1, user_phone),
                     user_name = COALESCE(?2, user_name)
                 WHERE id = ?3",
                params![phone, name, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List sessions for the operator console, newest activity first, with
/// unread visitor-message counts and last message preview.
pub async fn list_session_summaries(db: &Database) -> Result<Vec<SessionSummary>, ParleyError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.user_name, s.user_phone, s.status, s.created_at, s.last_activity,
                        (SELECT COUNT(*) FROM messages m
                          WHERE m.session_id = s.id AND m.is_read = 0 AND m.author_kind = 'user'),
                        (SELECT m.body FROM messages m
                          WHERE m.session_id = s.id ORDER BY m.id DESC LIMIT 1)
                 FROM sessions s
                 ORDER BY s.last_activity DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(SessionSummary {
                    session: row_to_session(row)?,
                    unread_count: row.get(6)?,
                    last_message: row.get(7)?,
                })
            })?;
            let mut summaries = Vec::new();
            for row in rows {
                summaries.push(row?);
            }
            Ok(summaries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete sessions whose `last_activity` predates `cutoff`, whatever their
/// status: staleness is measured by activity, and `active` only means the
/// visitor never closed the widget. Messages go with them via the cascade.
///
/// Returns the number of sessions removed.
pub async fn sweep_stale_sessions(db: &Database, cutoff: &str) -> Result<usize, ParleyError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE last_activity < ?1",
                params![cutoff],
            )?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMessage;
    use crate::queries::messages::insert_message;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            user_name: None,
            user_phone: None,
            status: "active".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            last_activity: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_session_roundtrips() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("sess-1")).await.unwrap();

        let retrieved = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, "sess-1");
        assert_eq!(retrieved.status, "active");
        assert!(retrieved.user_phone.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_session(&db, "no-such").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn save_user_info_keeps_unset_fields() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1")).await.unwrap();

        save_user_info(&db, "s1", Some("09123456789"), None)
            .await
            .unwrap();
        save_user_info(&db, "s1", None, Some("Acme Co")).await.unwrap();

        let s = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(s.user_phone.as_deref(), Some("09123456789"));
        assert_eq!(s.user_name.as_deref(), Some("Acme Co"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn summaries_count_unread_visitor_messages_only() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1")).await.unwrap();

        for (kind, body) in [("user", "hello"), ("user", "anyone?"), ("admin", "hi!")] {
            insert_message(
                &db,
                &NewMessage {
                    session_id: "s1".into(),
                    author_kind: kind.into(),
                    author_name: "x".into(),
                    body: body.into(),
                    created_at: "2026-01-01T00:00:01.000Z".into(),
                },
            )
            .await
            .unwrap();
        }

        let summaries = list_session_summaries(&db).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[0].last_message.as_deref(), Some("hi!"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sweep_removes_stale_sessions_whatever_their_status() {
        let (db, _dir) = setup_db().await;

        // Sessions stay `active` their whole life; the sweep must key on
        // activity, not status, or it never removes anything.
        let mut old_closed = make_session("old-closed");
        old_closed.status = "closed".into();
        old_closed.last_activity = "2025-01-01T00:00:00.000Z".into();
        let mut old_active = make_session("old-active");
        old_active.last_activity = "2025-01-01T00:00:00.000Z".into();
        let recent = make_session("recent");

        for s in [&old_closed, &old_active, &recent] {
            create_session(&db, s).await.unwrap();
        }

        let deleted = sweep_stale_sessions(&db, "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(get_session(&db, "old-closed").await.unwrap().is_none());
        assert!(get_session(&db, "old-active").await.unwrap().is_none());
        assert!(get_session(&db, "recent").await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn touched_session_survives_the_sweep() {
        let (db, _dir) = setup_db().await;
        let mut stale = make_session("s1");
        stale.last_activity = "2025-01-01T00:00:00.000Z".into();
        create_session(&db, &stale).await.unwrap();

        touch_session(&db, "s1", "2026-06-01T00:00:00.000Z").await.unwrap();
        let deleted = sweep_stale_sessions(&db, "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(deleted, 0);
        assert!(get_session(&db, "s1").await.unwrap().is_some());
        db.close().await.unwrap();
    }
}
