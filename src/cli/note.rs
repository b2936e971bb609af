use anyhow::Result;

use crate::config::FukaboriConfig;
use crate::document::extract_text;
use crate::note::types::NoteTree;
use crate::note::{delete, store, tree};

/// Create a new root note.
pub fn add(config: &FukaboriConfig, text: &str) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let mut conn = crate::db::open_database(config.resolved_db_path())?;

    let note = store::create_root(&mut conn, &user_id, text)?;
    println!("Created note {}", note.id);
    println!("  dive into it:  fukabori dive {}", note.id);
    if config.scoring.enabled {
        println!("  score it:      fukabori score {}", note.id);
    }
    Ok(())
}

/// List root notes, newest first.
pub fn list(config: &FukaboriConfig) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let roots = store::list_roots(&conn, &user_id)?;
    if roots.is_empty() {
        println!("No notes yet. Start with: fukabori note add \"...\"");
        return Ok(());
    }

    for note in &roots {
        let score = note
            .yurufuwa_score
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  [{}]  {}",
            note.id,
            &note.created_at[..10.min(note.created_at.len())],
            score,
            snippet(&extract_text(&note.body), 40)
        );
    }
    Ok(())
}

/// Show a single note in full.
pub fn show(config: &FukaboriConfig, id: &str) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let note = store::find_by_id(&conn, id, &user_id)?;
    println!("Note {}", note.id);
    println!("  created:  {}", note.created_at);
    println!("  depth:    {}", note.depth);
    if let Some(parent_id) = &note.parent_id {
        println!("  parent:   {parent_id}");
    }
    if let Some(persona) = note.persona {
        println!("  asked by: {}", persona.display_name());
    }
    if let Some(question) = &note.question {
        println!("  question: {question}");
    }
    if let Some(score) = note.yurufuwa_score {
        println!("  yurufuwa: {score:.2}");
    }
    println!();
    println!("{}", extract_text(&note.body));
    Ok(())
}

/// Show a note with its deep-dive chains, nested.
pub fn tree(config: &FukaboriConfig, id: &str) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let tree = tree::find_root_with_descendants(&conn, id, &user_id, config.dive.max_depth)?;
    print_tree(&tree);
    Ok(())
}

fn print_tree(tree: &NoteTree) {
    let indent = "  ".repeat(tree.note.depth as usize);
    if let Some(question) = &tree.note.question {
        let asked_by = tree
            .note
            .persona
            .map(|p| p.display_name())
            .unwrap_or_default();
        println!("{indent}Q ({asked_by}): {question}");
        println!("{indent}A: {}", extract_text(&tree.note.body));
    } else {
        println!("{indent}{}", extract_text(&tree.note.body));
    }
    for child in &tree.children {
        print_tree(child);
    }
}

/// Delete a note and its whole subtree.
pub fn delete(config: &FukaboriConfig, id: &str) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let mut conn = crate::db::open_database(config.resolved_db_path())?;

    let removed = delete::delete_note(&mut conn, id, &user_id)?;
    println!("Deleted {removed} note(s)");
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let head: String = flat.chars().take(max_chars).collect();
        format!("{head}…")
    }
}
