pub mod delete;
pub mod score;
pub mod store;
pub mod tree;
pub mod types;

use types::{Note, Persona};

/// Column list shared by every query that hydrates a [`Note`].
pub(crate) const NOTE_COLUMNS: &str =
    "id, user_id, body, parent_id, depth, question, persona, yurufuwa_score, created_at, updated_at";

/// Map a row selected with [`NOTE_COLUMNS`] into a [`Note`].
pub(crate) fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    let persona: Option<String> = row.get(6)?;
    let persona = persona
        .as_deref()
        .map(str::parse::<Persona>)
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::<dyn std::error::Error + Send + Sync>::from(e),
            )
        })?;

    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        body: row.get(2)?,
        parent_id: row.get(3)?,
        depth: row.get(4)?,
        question: row.get(5)?,
        persona,
        yurufuwa_score: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
