use std::sync::Mutex;

use anyhow::Result;

use crate::config::FukaboriConfig;
use crate::document::extract_text;
use crate::error::NoteError;
use crate::llm;
use crate::note::score::{score_note, suggest_small_step};
use crate::note::store::find_by_id;

/// Score one note's yurufuwa level and fold it into the owner's meter.
///
/// When this update pushes the meter over the threshold, a small-step action
/// plan is suggested on the spot.
pub async fn run(config: &FukaboriConfig, note_id: &str) -> Result<()> {
    if !config.scoring.enabled {
        println!("Scoring is disabled ([scoring] enabled = false).");
        return Ok(());
    }

    let user_id = super::resolve_user(config)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    super::check_llm_model(&conn, &config.llm);

    let db = Mutex::new(conn);
    let generator = llm::create_generator(&config.llm)?;

    let result = score_note(&db, generator.as_ref(), note_id, &user_id, &config.scoring).await?;

    println!("Yurufuwa score: {:.2}", result.score);
    if let Some(reason) = &result.reason {
        println!("  {reason}");
    }
    println!(
        "Meter: {:.2} / {:.2}",
        result.meter, config.scoring.meter_threshold
    );

    if result.threshold_crossed {
        println!();
        println!("Meter threshold crossed — time for a small first step.");
        let text = {
            let conn = db.lock().map_err(|_| NoteError::StoreUnavailable)?;
            let note = find_by_id(&conn, note_id, &user_id)?;
            extract_text(&note.body)
        };
        match suggest_small_step(generator.as_ref(), &text).await {
            Some(step) => println!("  → {step}"),
            None => println!("  (no suggestion this time — try again later)"),
        }
    }

    let conn = db.lock().map_err(|_| NoteError::StoreUnavailable)?;
    super::record_llm_model(&conn, &config.llm);
    Ok(())
}
