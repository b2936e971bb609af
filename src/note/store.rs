//! Write path for the note tree — root and child creation, lookup, audit logging.
//!
//! [`create_root`] and [`create_child`] are the only entry points that insert
//! notes. Each runs inside a transaction: ownership and depth checks, the
//! insert itself, and the `note_log` audit row commit together.

use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::ensure_user;
use crate::error::NoteError;
use crate::note::types::{Note, Persona};
use crate::note::{note_from_row, NOTE_COLUMNS};

/// Create a depth-0 note with no parent.
///
/// Upserts the owning user row first (first write wins), so a fresh user id
/// can start journaling without a separate registration step.
pub fn create_root(conn: &mut Connection, user_id: &str, body: &str) -> Result<Note, NoteError> {
    let tx = conn.transaction()?;

    ensure_user(&tx, user_id, None)?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO notes (id, user_id, body, parent_id, depth, question, persona, created_at, updated_at) \
         VALUES (?1, ?2, ?3, NULL, 0, NULL, NULL, ?4, ?4)",
        params![id, user_id, body, now],
    )?;

    write_audit_log(&tx, "create", &id, Some(&serde_json::json!({"depth": 0})))?;

    tx.commit()?;
    tracing::debug!(note_id = %id, "root note created");

    Ok(Note {
        id,
        user_id: user_id.to_string(),
        body: body.to_string(),
        parent_id: None,
        depth: 0,
        question: None,
        persona: None,
        yurufuwa_score: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Create a child note answering `question` under `parent_id`.
///
/// Fails with [`NoteError::NotFound`] if the parent is absent or owned by a
/// different user, and with [`NoteError::DepthExceeded`] if the child would
/// sit past `max_depth`. The child's depth is always `parent.depth + 1`.
pub fn create_child(
    conn: &mut Connection,
    parent_id: &str,
    user_id: &str,
    body: &str,
    question: &str,
    persona: Persona,
    max_depth: u32,
) -> Result<Note, NoteError> {
    let tx = conn.transaction()?;

    let parent_depth: Option<u32> = tx
        .query_row(
            "SELECT depth FROM notes WHERE id = ?1 AND user_id = ?2",
            params![parent_id, user_id],
            |row| row.get(0),
        )
        .optional()?;

    let parent_depth = parent_depth.ok_or_else(|| NoteError::NotFound {
        id: parent_id.to_string(),
    })?;

    let depth = parent_depth + 1;
    if depth > max_depth {
        return Err(NoteError::DepthExceeded {
            parent_id: parent_id.to_string(),
            depth: parent_depth,
            max: max_depth,
        });
    }

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO notes (id, user_id, body, parent_id, depth, question, persona, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![id, user_id, body, parent_id, depth, question, persona.as_str(), now],
    )?;

    write_audit_log(
        &tx,
        "create",
        &id,
        Some(&serde_json::json!({"parent_id": parent_id, "depth": depth})),
    )?;

    tx.commit()?;
    tracing::debug!(note_id = %id, parent_id = %parent_id, depth, "child note created");

    Ok(Note {
        id,
        user_id: user_id.to_string(),
        body: body.to_string(),
        parent_id: Some(parent_id.to_string()),
        depth,
        question: Some(question.to_string()),
        persona: Some(persona),
        yurufuwa_score: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Fetch a single note by id, scoped to its owner.
///
/// A note owned by a different user reports [`NoteError::NotFound`], identical
/// to a missing note, so ids cannot be probed across users.
pub fn find_by_id(conn: &Connection, id: &str, user_id: &str) -> Result<Note, NoteError> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            note_from_row,
        )
        .optional()?;

    note.ok_or_else(|| NoteError::NotFound { id: id.to_string() })
}

/// All root notes for a user, newest first.
pub fn list_roots(conn: &Connection, user_id: &str) -> Result<Vec<Note>, NoteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1 AND parent_id IS NULL \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let notes = stmt
        .query_map(params![user_id], note_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

/// Write an entry to the note_log audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    note_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<(), NoteError> {
    let now = chrono::Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO note_log (operation, note_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, note_id, details_json, now],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    #[test]
    fn create_root_upserts_user_and_inserts() {
        let mut conn = test_db();

        let note = create_root(&mut conn, "u1", "first note").unwrap();
        assert_eq!(note.depth, 0);
        assert!(note.parent_id.is_none());
        assert!(note.question.is_none());

        let user_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE id = 'u1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(user_count, 1);

        let body: String = conn
            .query_row(
                "SELECT body FROM notes WHERE id = ?1",
                params![note.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(body, "first note");
    }

    #[test]
    fn create_child_increments_depth() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();

        let child = create_child(
            &mut conn,
            &root.id,
            "u1",
            "answer",
            "なぜ？",
            Persona::Doitkun,
            5,
        )
        .unwrap();

        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(child.question.as_deref(), Some("なぜ？"));
        assert_eq!(child.persona, Some(Persona::Doitkun));
    }

    #[test]
    fn create_child_missing_parent_is_not_found() {
        let mut conn = test_db();
        create_root(&mut conn, "u1", "root").unwrap();

        let err = create_child(
            &mut conn,
            "no-such-id",
            "u1",
            "answer",
            "q",
            Persona::Listener,
            5,
        )
        .unwrap_err();
        assert!(matches!(err, NoteError::NotFound { .. }));
    }

    #[test]
    fn create_child_foreign_parent_is_not_found() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();

        // u2 cannot attach children to u1's note
        let err = create_child(
            &mut conn,
            &root.id,
            "u2",
            "answer",
            "q",
            Persona::Doitkun,
            5,
        )
        .unwrap_err();
        assert!(matches!(err, NoteError::NotFound { .. }));
    }

    #[test]
    fn create_child_past_cap_is_depth_exceeded() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        let mut parent_id = root.id;

        for _ in 0..2 {
            parent_id = create_child(
                &mut conn,
                &parent_id,
                "u1",
                "answer",
                "q",
                Persona::Doitkun,
                2,
            )
            .unwrap()
            .id;
        }

        let err = create_child(
            &mut conn,
            &parent_id,
            "u1",
            "answer",
            "q",
            Persona::Doitkun,
            2,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NoteError::DepthExceeded { depth: 2, max: 2, .. }
        ));
    }

    #[test]
    fn find_by_id_hides_foreign_notes() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "mine").unwrap();

        assert!(find_by_id(&conn, &root.id, "u1").is_ok());
        assert!(matches!(
            find_by_id(&conn, &root.id, "u2"),
            Err(NoteError::NotFound { .. })
        ));
    }

    #[test]
    fn audit_log_rows_written_on_create() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        create_child(&mut conn, &root.id, "u1", "a", "q", Persona::Doitkun, 5).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM note_log WHERE operation = 'create'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn list_roots_excludes_children() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        create_child(&mut conn, &root.id, "u1", "a", "q", Persona::Doitkun, 5).unwrap();
        create_root(&mut conn, "u2", "other user").unwrap();

        let roots = list_roots(&conn, "u1").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, root.id);
    }
}
