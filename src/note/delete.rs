//! Note deletion — always cascades to the full descendant subtree.
//!
//! The cascade itself is the `ON DELETE CASCADE` foreign key on
//! `notes.parent_id`; this module adds the ownership check, the removed-row
//! count, and the audit entry, all inside one transaction.

use rusqlite::{params, Connection};

use crate::error::NoteError;
use crate::note::store::write_audit_log;

/// Delete a note and every descendant. Returns the total number of notes
/// removed (the note itself included).
///
/// Fails with [`NoteError::NotFound`] if the note is absent or owned by a
/// different user — a foreign caller cannot delete, or even confirm the
/// existence of, someone else's note.
pub fn delete_note(conn: &mut Connection, id: &str, user_id: &str) -> Result<u32, NoteError> {
    let tx = conn.transaction()?;

    // Count the subtree before the cascade; conn.execute only reports the
    // single row it deleted directly.
    let removed: u32 = tx.query_row(
        "WITH RECURSIVE subtree AS (
             SELECT id FROM notes WHERE id = ?1 AND user_id = ?2
             UNION ALL
             SELECT n.id FROM notes n JOIN subtree s ON n.parent_id = s.id
         )
         SELECT COUNT(*) FROM subtree",
        params![id, user_id],
        |row| row.get(0),
    )?;

    if removed == 0 {
        return Err(NoteError::NotFound { id: id.to_string() });
    }

    write_audit_log(
        &tx,
        "delete",
        id,
        Some(&serde_json::json!({"removed": removed})),
    )?;

    tx.execute("DELETE FROM notes WHERE id = ?1", params![id])?;

    tx.commit()?;
    tracing::debug!(note_id = %id, removed, "note subtree deleted");

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::note::store::{create_child, create_root, find_by_id};
    use crate::note::types::Persona;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    #[test]
    fn deleting_root_removes_whole_chain() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        let mut parent_id = root.id.clone();
        for i in 0..5 {
            parent_id = create_child(
                &mut conn,
                &parent_id,
                "u1",
                &format!("answer {i}"),
                "q",
                Persona::Doitkun,
                5,
            )
            .unwrap()
            .id;
        }

        let removed = delete_note(&mut conn, &root.id, "u1").unwrap();
        assert_eq!(removed, 6);

        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
        assert!(matches!(
            find_by_id(&conn, &root.id, "u1"),
            Err(NoteError::NotFound { .. })
        ));
    }

    #[test]
    fn deleting_leaf_removes_only_itself() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        let leaf =
            create_child(&mut conn, &root.id, "u1", "a", "q", Persona::Doitkun, 5).unwrap();

        let removed = delete_note(&mut conn, &leaf.id, "u1").unwrap();
        assert_eq!(removed, 1);
        assert!(find_by_id(&conn, &root.id, "u1").is_ok());
    }

    #[test]
    fn foreign_user_cannot_delete() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();

        assert!(matches!(
            delete_note(&mut conn, &root.id, "u2"),
            Err(NoteError::NotFound { .. })
        ));
        assert!(find_by_id(&conn, &root.id, "u1").is_ok());
    }

    #[test]
    fn delete_writes_audit_row() {
        let mut conn = test_db();
        let root = create_root(&mut conn, "u1", "root").unwrap();
        create_child(&mut conn, &root.id, "u1", "a", "q", Persona::Doitkun, 5).unwrap();

        delete_note(&mut conn, &root.id, "u1").unwrap();

        let details_str: String = conn
            .query_row(
                "SELECT details FROM note_log WHERE note_id = ?1 AND operation = 'delete'",
                params![root.id],
                |r| r.get(0),
            )
            .unwrap();
        let details: serde_json::Value = serde_json::from_str(&details_str).unwrap();
        assert_eq!(details["removed"], 2);
    }
}
