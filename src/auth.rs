//! User identity resolution.
//!
//! The real application authenticates through an external OAuth provider; the
//! engine only ever sees an opaque user id. [`UserResolver`] is that seam:
//! every store and session operation requires a resolved id and fails with
//! [`NoteError::AuthenticationRequired`] when none is available — there is no
//! anonymous fallback.

use rusqlite::{params, Connection};

use crate::error::NoteError;

/// Yields the id of the user on whose behalf the engine is operating.
pub trait UserResolver: Send + Sync {
    fn current_user_id(&self) -> Result<String, NoteError>;
}

/// Resolver backed by a fixed id (CLI usage, tests).
pub struct FixedUser {
    user_id: Option<String>,
}

impl FixedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A resolver with no identity — every call fails.
    pub fn unauthenticated() -> Self {
        Self { user_id: None }
    }
}

impl UserResolver for FixedUser {
    fn current_user_id(&self) -> Result<String, NoteError> {
        self.user_id
            .clone()
            .ok_or(NoteError::AuthenticationRequired)
    }
}

/// Create the user row if it does not exist yet. Safe to call on every write.
pub fn ensure_user(conn: &Connection, user_id: &str, name: Option<&str>) -> Result<(), NoteError> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (id, name, yurufuwa_meter, created_at, updated_at) \
         VALUES (?1, ?2, 0.0, ?3, ?3) \
         ON CONFLICT(id) DO NOTHING",
        params![user_id, name, now],
    )?;
    Ok(())
}
