use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::config::FukaboriConfig;
use crate::dive::{DiveSession, DiveState, FailReason};
use crate::llm::{self, TextGenerator};
use crate::note::types::Persona;

/// Run an interactive deep-dive session on stdin/stdout.
///
/// The session ends on its own after the configured number of rounds; an
/// empty answer aborts early. Either way every answered round is already
/// saved, and `--resume` continues from the deepest branch.
pub async fn run(
    config: &FukaboriConfig,
    note_id: &str,
    persona: Persona,
    resume: bool,
) -> Result<()> {
    let user_id = super::resolve_user(config)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    super::check_llm_model(&conn, &config.llm);

    let db = Arc::new(Mutex::new(conn));
    let generator: Arc<dyn TextGenerator> = Arc::from(llm::create_generator(&config.llm)?);
    let max_depth = config.dive.max_depth;

    let mut session = if resume {
        DiveSession::resume(
            db.clone(),
            generator,
            &user_id,
            note_id,
            persona,
            max_depth,
        )?
    } else {
        DiveSession::start(
            db.clone(),
            generator,
            &user_id,
            note_id,
            persona,
            max_depth,
        )
    };

    println!("{}「{}」", persona.display_name(), persona.catchphrase());
    println!(
        "Up to {max_depth} questions. An empty answer ends the session."
    );

    let stdin = std::io::stdin();
    let mut pending_answer: Option<String> = None;

    loop {
        match session.state().clone() {
            DiveState::AwaitingQuestion { .. } => {
                session.request_question().await;
            }
            DiveState::AwaitingAnswer {
                depth, question, ..
            } => {
                println!();
                println!("{} [{}/{}]", persona.display_name(), depth + 1, max_depth);
                println!("  {question}");
                print!("> ");
                std::io::stdout().flush()?;

                let mut line = String::new();
                stdin.lock().read_line(&mut line)?;
                let answer = line.trim();
                if answer.is_empty() {
                    session.abort();
                } else {
                    pending_answer = Some(answer.to_string());
                    session.submit_answer(answer).await;
                }
            }
            DiveState::Terminated => {
                println!();
                println!("Deep dive complete. The whole chain is saved.");
                println!("See it with: fukabori note tree {}", session.root_id());
                break;
            }
            DiveState::Aborted => {
                println!();
                println!("Session ended. Answers so far are saved; pick the chain back up with:");
                println!("  fukabori dive {} --resume", session.root_id());
                break;
            }
            DiveState::Failed(reason) => {
                report_failure(&reason, pending_answer.as_deref());
                anyhow::bail!("deep-dive session failed");
            }
            DiveState::Idle => unreachable!("sessions start in AwaitingQuestion"),
        }
    }

    if let Ok(conn) = db.lock() {
        super::record_llm_model(&conn, &config.llm);
    }
    Ok(())
}

fn report_failure(reason: &FailReason, pending_answer: Option<&str>) {
    eprintln!();
    match reason {
        FailReason::QuestionGenerationFailed { depth, .. } => {
            eprintln!(
                "Could not generate question {} — the model returned nothing usable.",
                depth + 1
            );
            eprintln!("Run the same dive again with --resume to retry this round.");
        }
        FailReason::PersistFailed { depth, .. } => {
            eprintln!("Your answer for round {} could not be saved.", depth + 1);
            if let Some(answer) = pending_answer {
                eprintln!("It was:");
                eprintln!("  {answer}");
            }
            eprintln!("Run the same dive again with --resume and re-enter it.");
        }
    }
}
