//! Yurufuwa (abstractness) scoring and the per-user meter.
//!
//! Each note gets a 0.0–1.0 score from the model: how far the written idea
//! still is from something actionable. Scores accumulate in the owner's
//! meter; when the meter crosses the configured threshold the caller is told
//! to offer a small-step action plan, and the threshold is subtracted inside
//! the same transaction so concurrent scorers cannot double-trigger.
//!
//! Scoring is best-effort throughout: an unreachable model or an unparsable
//! verdict scores 0.0 and never surfaces as an error.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::document::extract_text;
use crate::error::NoteError;
use crate::llm::TextGenerator;
use crate::note::store::write_audit_log;

/// Outcome of scoring one note.
#[derive(Debug, Serialize)]
pub struct ScoreResult {
    pub note_id: String,
    /// Score in `[0.0, 1.0]`, rounded to two decimals.
    pub score: f64,
    /// The model's stated reasoning, when it gave one.
    pub reason: Option<String>,
    /// The owner's meter after this update (threshold already subtracted if
    /// crossed).
    pub meter: f64,
    /// `true` exactly when this update pushed the meter over the threshold.
    pub threshold_crossed: bool,
}

/// Score a note and fold the result into the owner's meter.
///
/// The model call happens without the store lock held; only the final
/// note-update + meter-increment pair runs in a transaction.
pub async fn score_note(
    db: &Mutex<Connection>,
    generator: &dyn TextGenerator,
    note_id: &str,
    user_id: &str,
    config: &ScoringConfig,
) -> Result<ScoreResult, NoteError> {
    let text = {
        let conn = db.lock().map_err(|_| NoteError::StoreUnavailable)?;
        let note = super::store::find_by_id(&conn, note_id, user_id)?;
        extract_text(&note.body)
    };

    let (score, reason) = judge(generator, &text, config).await;

    let mut conn = db.lock().map_err(|_| NoteError::StoreUnavailable)?;
    apply_score(&mut conn, note_id, user_id, score, reason, config)
}

/// Decide the score for extracted text, calling the model only when the text
/// is long enough to be worth judging.
async fn judge(
    generator: &dyn TextGenerator,
    text: &str,
    config: &ScoringConfig,
) -> (f64, Option<String>) {
    if text.is_empty() {
        return (0.0, None);
    }
    if text.chars().count() < config.min_text_len {
        return (config.short_text_score, None);
    }

    match generator.generate(&scoring_prompt(text)).await {
        Ok(response) => parse_score_response(&response).unwrap_or_else(|| {
            tracing::warn!("unparsable scoring verdict, scoring 0.0");
            (0.0, None)
        }),
        Err(e) => {
            tracing::warn!(error = %e, "scoring call failed, scoring 0.0");
            (0.0, None)
        }
    }
}

fn scoring_prompt(text: &str) -> String {
    format!(
        "以下の文章の「ゆるふわ度」を0.0から1.0の数値で評価してください。
ゆるふわ度とは、アイデアが具体的でなく、抽象的で、まだ行動計画に落とし込める段階にない度合いを指します。
例えば、「なんかすごいサービスを作りたい」はゆるふわ度が高く、「顧客管理機能を持つWebアプリを開発する」はゆるふわ度が低いです。
評価理由と最終的なスコアをJSON形式で {{\"reason\": \"評価理由\", \"score\": 0.8}} のように返してください。レスポンスはJSONのみとし、他のテキストは含めないでください。

文章:
---
{text}
---"
    )
}

/// Pull the first `{{...}}` block out of the response and read its `score`
/// (clamped to `[0, 1]`, two decimals) and optional `reason`.
fn parse_score_response(response: &str) -> Option<(f64, Option<String>)> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&response[start..=end]).ok()?;
    let score = value.get("score")?.as_f64()?;
    let score = (score.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    let reason = value
        .get("reason")
        .and_then(|r| r.as_str())
        .map(str::to_string);
    Some((score, reason))
}

/// Persist a score: the note's `yurufuwa_score` and the owner's meter move in
/// one transaction, with a `score` audit row.
pub fn apply_score(
    conn: &mut Connection,
    note_id: &str,
    user_id: &str,
    score: f64,
    reason: Option<String>,
    config: &ScoringConfig,
) -> Result<ScoreResult, NoteError> {
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();

    let updated = tx.execute(
        "UPDATE notes SET yurufuwa_score = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        params![score, now, note_id, user_id],
    )?;
    if updated == 0 {
        return Err(NoteError::NotFound {
            id: note_id.to_string(),
        });
    }

    let meter: Option<f64> = tx
        .query_row(
            "SELECT yurufuwa_meter FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    let meter = meter.ok_or_else(|| NoteError::NotFound {
        id: user_id.to_string(),
    })?;

    let raised = meter + score;
    let threshold_crossed = config.meter_threshold > 0.0 && raised >= config.meter_threshold;
    // Crossing consumes the threshold and carries the remainder
    let meter = if threshold_crossed {
        raised - config.meter_threshold
    } else {
        raised
    };

    tx.execute(
        "UPDATE users SET yurufuwa_meter = ?1, updated_at = ?2 WHERE id = ?3",
        params![meter, now, user_id],
    )?;

    write_audit_log(
        &tx,
        "score",
        note_id,
        Some(&serde_json::json!({
            "score": score,
            "meter": meter,
            "threshold_crossed": threshold_crossed,
        })),
    )?;

    tx.commit()?;
    tracing::debug!(note_id = %note_id, score, meter, threshold_crossed, "note scored");

    Ok(ScoreResult {
        note_id: note_id.to_string(),
        score,
        reason,
        meter,
        threshold_crossed,
    })
}

/// Ask the model for one concrete, small first action toward the note's idea.
///
/// Advisory only: any failure degrades to `None` and must never block the
/// surrounding flow.
pub async fn suggest_small_step(generator: &dyn TextGenerator, note_text: &str) -> Option<String> {
    let prompt = format!(
        "以下の文章は、まだ具体的な行動に落とし込めていないアイデアやモヤモヤです。
この人が明日から始められる、小さくて具体的な最初の一歩を1つだけ提案してください。
提案は1〜2文で、すぐ実行できる行動にしてください。
提案文だけを返してください。余計な説明は不要です。

文章:
---
{note_text}
---"
    );

    match generator.generate(&prompt).await {
        Ok(step) => {
            let step = step.trim().to_string();
            (!step.is_empty()).then_some(step)
        }
        Err(e) => {
            tracing::warn!(error = %e, "small-step suggestion failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::note::store::create_root;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    fn config() -> ScoringConfig {
        ScoringConfig {
            enabled: true,
            min_text_len: 10,
            short_text_score: 0.1,
            meter_threshold: 1.0,
        }
    }

    #[test]
    fn parses_verdict_with_surrounding_noise() {
        let response = "```json\n{\"reason\": \"抽象的\", \"score\": 0.83}\n```";
        let (score, reason) = parse_score_response(response).unwrap();
        assert_eq!(score, 0.83);
        assert_eq!(reason.as_deref(), Some("抽象的"));
    }

    #[test]
    fn clamps_and_rounds_score() {
        let (score, _) = parse_score_response(r#"{"score": 1.7}"#).unwrap();
        assert_eq!(score, 1.0);
        let (score, _) = parse_score_response(r#"{"score": -0.2}"#).unwrap();
        assert_eq!(score, 0.0);
        let (score, _) = parse_score_response(r#"{"score": 0.456}"#).unwrap();
        assert_eq!(score, 0.46);
    }

    #[test]
    fn garbage_verdicts_parse_to_none() {
        assert!(parse_score_response("no json here").is_none());
        assert!(parse_score_response(r#"{"reason": "missing score"}"#).is_none());
        assert!(parse_score_response(r#"{"score": "high"}"#).is_none());
    }

    #[test]
    fn meter_accumulates_until_threshold() {
        let mut conn = test_db();
        let a = create_root(&mut conn, "u1", "note a").unwrap();
        let b = create_root(&mut conn, "u1", "note b").unwrap();

        let result = apply_score(&mut conn, &a.id, "u1", 0.4, None, &config()).unwrap();
        assert!(!result.threshold_crossed);
        assert!((result.meter - 0.4).abs() < 1e-9);

        // 0.4 + 0.8 crosses 1.0 and carries the remainder
        let result = apply_score(&mut conn, &b.id, "u1", 0.8, None, &config()).unwrap();
        assert!(result.threshold_crossed);
        assert!((result.meter - 0.2).abs() < 1e-9);

        let stored: f64 = conn
            .query_row(
                "SELECT yurufuwa_meter FROM users WHERE id = 'u1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!((stored - 0.2).abs() < 1e-9);
    }

    #[test]
    fn score_lands_on_the_note_row() {
        let mut conn = test_db();
        let note = create_root(&mut conn, "u1", "note").unwrap();

        apply_score(&mut conn, &note.id, "u1", 0.7, None, &config()).unwrap();

        let stored: f64 = conn
            .query_row(
                "SELECT yurufuwa_score FROM notes WHERE id = ?1",
                params![note.id],
                |r| r.get(0),
            )
            .unwrap();
        assert!((stored - 0.7).abs() < 1e-9);
    }

    #[test]
    fn foreign_note_cannot_be_scored() {
        let mut conn = test_db();
        let note = create_root(&mut conn, "u1", "note").unwrap();

        assert!(matches!(
            apply_score(&mut conn, &note.id, "u2", 0.5, None, &config()),
            Err(NoteError::NotFound { .. })
        ));
    }

    #[test]
    fn score_audit_row_is_written() {
        let mut conn = test_db();
        let note = create_root(&mut conn, "u1", "note").unwrap();

        apply_score(&mut conn, &note.id, "u1", 0.5, None, &config()).unwrap();

        let details_str: String = conn
            .query_row(
                "SELECT details FROM note_log WHERE note_id = ?1 AND operation = 'score'",
                params![note.id],
                |r| r.get(0),
            )
            .unwrap();
        let details: serde_json::Value = serde_json::from_str(&details_str).unwrap();
        assert_eq!(details["score"], 0.5);
        assert_eq!(details["threshold_crossed"], false);
    }
}
