//! Tree-shaped queries over the note store.
//!
//! The subtree loader is a recursive CTE bounded by the depth cap, so the
//! query shape stays fixed no matter what the cap is configured to. Rows come
//! back in creation order (`created_at`, then id — ids are UUID v7, so ties
//! resolve in insertion order), which is the order every consumer wants.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::NoteError;
use crate::note::types::{Note, NoteTree};
use crate::note::{note_from_row, NOTE_COLUMNS};

const SUBTREE_SQL: &str = "\
WITH RECURSIVE subtree AS (
    SELECT id, user_id, body, parent_id, depth, question, persona, yurufuwa_score, created_at, updated_at
    FROM notes WHERE id = ?1 AND user_id = ?2
    UNION ALL
    SELECT n.id, n.user_id, n.body, n.parent_id, n.depth, n.question, n.persona, n.yurufuwa_score, n.created_at, n.updated_at
    FROM notes n JOIN subtree s ON n.parent_id = s.id
    WHERE n.depth <= ?3
)";

/// Load the anchor note and every descendant down to `max_depth`, flat,
/// in creation order. The anchor is always the first element.
///
/// Fails with [`NoteError::NotFound`] if the anchor is absent or owned by a
/// different user.
pub fn collect_subtree(
    conn: &Connection,
    anchor_id: &str,
    user_id: &str,
    max_depth: u32,
) -> Result<Vec<Note>, NoteError> {
    let sql = format!("{SUBTREE_SQL} SELECT {NOTE_COLUMNS} FROM subtree ORDER BY created_at ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let notes = stmt
        .query_map(params![anchor_id, user_id, max_depth], note_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    if notes.is_empty() {
        return Err(NoteError::NotFound {
            id: anchor_id.to_string(),
        });
    }
    Ok(notes)
}

/// Load a note and its full descendant subtree, nested, children ordered
/// oldest-first at every level.
pub fn find_root_with_descendants(
    conn: &Connection,
    root_id: &str,
    user_id: &str,
    max_depth: u32,
) -> Result<NoteTree, NoteError> {
    let mut notes = collect_subtree(conn, root_id, user_id, max_depth)?.into_iter();
    let anchor = notes.next().expect("collect_subtree returned the anchor");

    let mut children_of: HashMap<String, Vec<Note>> = HashMap::new();
    for note in notes {
        if let Some(parent_id) = note.parent_id.clone() {
            children_of.entry(parent_id).or_default().push(note);
        }
    }

    Ok(assemble(anchor, &mut children_of))
}

fn assemble(note: Note, children_of: &mut HashMap<String, Vec<Note>>) -> NoteTree {
    let children = children_of
        .remove(&note.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, children_of))
        .collect();
    NoteTree { note, children }
}

/// Walk `parent_id` links upward until reaching a note with no parent.
///
/// A parent link pointing at a missing note is a data-integrity error and
/// reports [`NoteError::BrokenChain`] rather than being silently skipped.
pub fn find_ancestor_root(
    conn: &Connection,
    note_id: &str,
    user_id: &str,
) -> Result<Note, NoteError> {
    let mut current = super::store::find_by_id(conn, note_id, user_id)?;

    while let Some(parent_id) = current.parent_id.clone() {
        let parent = conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"),
                params![parent_id, user_id],
                note_from_row,
            )
            .optional()?;

        current = parent.ok_or(NoteError::BrokenChain {
            id: current.id,
            parent_id,
        })?;
    }

    Ok(current)
}

/// The deepest note in the subtree under `anchor_id`, ties broken by latest
/// `created_at` (then id). Returns the anchor itself when it has no
/// descendants.
///
/// This is the branch a resumed deep-dive session continues from: among
/// sibling branches, most recent activity wins.
pub fn deepest_descendant(
    conn: &Connection,
    anchor_id: &str,
    user_id: &str,
    max_depth: u32,
) -> Result<Note, NoteError> {
    let sql = format!(
        "{SUBTREE_SQL} SELECT {NOTE_COLUMNS} FROM subtree \
         ORDER BY depth DESC, created_at DESC, id DESC LIMIT 1"
    );
    let note = conn
        .query_row(&sql, params![anchor_id, user_id, max_depth], note_from_row)
        .optional()?;

    note.ok_or_else(|| NoteError::NotFound {
        id: anchor_id.to_string(),
    })
}
