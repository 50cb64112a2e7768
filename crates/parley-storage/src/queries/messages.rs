// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log operations.

use parley_core::ParleyError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{NewMessage, StoredMessage};

const MESSAGE_COLUMNS: &str =
    "id, session_id, author_kind, author_name, body, created_at, is_read";

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<StoredMessage, rusqlite::Error> {
    Ok(StoredMessage {
        id: row.get(0)?,
        session_id: row.get(1)?,
        author_kind: row.get(2)?,
        author_name: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        is_read: row.get(6)?,
    })
}

/// Append a message and return its server-assigned monotonic id.
pub async fn insert_message(db: &Database, msg: &NewMessage) -> Result<i64, ParleyError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (session_id, author_kind, author_name, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    msg.session_id,
                    msg.author_kind,
                    msg.author_name,
                    msg.body,
                    msg.created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Full transcript for a session, id ascending.
pub async fn get_messages_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<StoredMessage>, ParleyError> {
    get_messages_since(db, session_id, 0).await
}

/// Read-since-cursor: messages with id strictly greater than `after_id`,
/// id ascending.
pub async fn get_messages_since(
    db: &Database,
    session_id: &str,
    after_id: i64,
) -> Result<Vec<StoredMessage>, ParleyError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1 AND id > ?2
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![session_id, after_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark the given messages of a session read. Returns the updated count.
///
/// The session id is part of the predicate so an operator cannot flip
/// read flags across sessions with a crafted id list.
pub async fn mark_read(
    db: &Database,
    session_id: &str,
    message_ids: &[i64],
) -> Result<usize, ParleyError> {
    if message_ids.is_empty() {
        return Ok(0);
    }
    let session_id = session_id.to_string();
    let ids = message_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            let sql = format!(
                "UPDATE messages SET is_read = 1
                 WHERE session_id = ? AND id IN ({placeholders})"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&session_id];
            for id in &ids {
                bound.push(id);
            }
            let updated = stmt.execute(bound.as_slice())?;
            Ok(updated)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::queries::sessions::create_session;
    use tempfile::tempdir;

    async fn setup_db_with_session() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let session = Session {
            id: "sess-1".to_string(),
            user_name: None,
            user_phone: None,
            status: "active".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            last_activity: "2026-01-01T00:00:00.000Z".to_string(),
        };
        create_session(&db, &session).await.unwrap();
        (db, dir)
    }

    fn make_msg(kind: &str, body: &str) -> NewMessage {
        NewMessage {
            session_id: "sess-1".to_string(),
            author_kind: kind.to_string(),
            author_name: "Visitor".to_string(),
            body: body.to_string(),
            created_at: "2026-01-01T00:00:01.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_order_is_preserved() {
        let (db, _dir) = setup_db_with_session().await;

        let id1 = insert_message(&db, &make_msg("user", "hello")).await.unwrap();
        let id2 = insert_message(&db, &make_msg("admin", "hi there")).await.unwrap();
        let id3 = insert_message(&db, &make_msg("user", "question")).await.unwrap();
        assert!(id1 < id2 && id2 < id3);

        let messages = get_messages_for_session(&db, "sess-1").await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].body, "hello");
        assert_eq!(messages[2].body, "question");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn read_since_cursor_skips_earlier_messages() {
        let (db, _dir) = setup_db_with_session().await;

        let id1 = insert_message(&db, &make_msg("user", "one")).await.unwrap();
        insert_message(&db, &make_msg("user", "two")).await.unwrap();
        insert_message(&db, &make_msg("user", "three")).await.unwrap();

        let newer = get_messages_since(&db, "sess-1", id1).await.unwrap();
        assert_eq!(newer.len(), 2);
        assert_eq!(newer[0].body, "two");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_session() {
        let (db, _dir) = setup_db_with_session().await;

        let id1 = insert_message(&db, &make_msg("user", "hello")).await.unwrap();
        let id2 = insert_message(&db, &make_msg("user", "again")).await.unwrap();

        let updated = mark_read(&db, "sess-1", &[id1, id2]).await.unwrap();
        assert_eq!(updated, 2);
        let updated = mark_read(&db, "other-session", &[id1]).await.unwrap();
        assert_eq!(updated, 0);

        let messages = get_messages_for_session(&db, "sess-1").await.unwrap();
        assert!(messages.iter().all(|m| m.is_read));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_read_empty_list_is_a_noop() {
        let (db, _dir) = setup_db_with_session().await;
        assert_eq!(mark_read(&db, "sess-1", &[]).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn insert_rejects_unknown_session() {
        let (db, _dir) = setup_db_with_session().await;
        let mut msg = make_msg("user", "orphan");
        msg.session_id = "ghost".to_string();
        assert!(insert_message(&db, &msg).await.is_err());
        db.close().await.unwrap();
    }
}
