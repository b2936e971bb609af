//! SQL DDL for all fukabori tables.
//!
//! Defines the `users`, `notes`, `note_log`, and `schema_meta` tables. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization. The note tree is
//! self-referential: `notes.parent_id` points back into `notes` with
//! `ON DELETE CASCADE`, so removing a root removes its whole subtree.

use rusqlite::Connection;

/// All schema DDL statements for fukabori's core tables.
const SCHEMA_SQL: &str = r#"
-- Note owners. yurufuwa_meter accumulates note scores until it crosses the
-- configured threshold.
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT,
    yurufuwa_meter REAL NOT NULL DEFAULT 0.0 CHECK(yurufuwa_meter >= 0.0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Note tree. Roots have parent_id NULL, depth 0, and no question/persona;
-- children carry the question they answer and the persona that asked it.
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    body TEXT NOT NULL,
    parent_id TEXT REFERENCES notes(id) ON DELETE CASCADE,
    depth INTEGER NOT NULL DEFAULT 0 CHECK(depth >= 0),
    question TEXT,
    persona TEXT CHECK(persona IS NULL OR persona IN ('doitkun','listener')),
    yurufuwa_score REAL CHECK(yurufuwa_score IS NULL OR (yurufuwa_score >= 0.0 AND yurufuwa_score <= 1.0)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK(parent_id IS NOT NULL OR (depth = 0 AND question IS NULL AND persona IS NULL)),
    CHECK(parent_id IS NULL OR depth > 0)
);

CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
CREATE INDEX IF NOT EXISTS idx_notes_parent ON notes(parent_id);
CREATE INDEX IF NOT EXISTS idx_notes_created ON notes(created_at);

-- Audit log
CREATE TABLE IF NOT EXISTS note_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','delete','score')),
    note_id TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"notes".to_string()));
        assert!(tables.contains(&"note_log".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_version_starts_at_1() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let version: String = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, "1");
    }

    #[test]
    fn root_with_question_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (id, name, created_at, updated_at) VALUES ('u1', 'U', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO notes (id, user_id, body, parent_id, depth, question, created_at, updated_at) \
             VALUES ('n1', 'u1', 'x', NULL, 0, 'why?', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_persona_tag_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (id, name, created_at, updated_at) VALUES ('u1', 'U', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO notes (id, user_id, body, parent_id, depth, created_at, updated_at) \
             VALUES ('root', 'u1', 'x', NULL, 0, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO notes (id, user_id, body, parent_id, depth, question, persona, created_at, updated_at) \
             VALUES ('n2', 'u1', 'x', 'root', 1, 'q', ?1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            params!["sergeant"],
        );
        assert!(result.is_err());
    }
}
