mod auth;
mod cli;
mod config;
mod db;
mod dive;
mod document;
mod error;
mod llm;
mod note;
mod prompt;
mod transcript;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use note::types::Persona;

#[derive(Parser)]
#[command(name = "fukabori", version, about = "Deep-dive journaling — AI question chains over a note tree")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage journal notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Run a deep-dive question session anchored at a note
    Dive {
        /// Id of the note to dive into
        note_id: String,
        /// Persona asking the questions: doitkun or listener
        #[arg(long, default_value = "doitkun")]
        persona: Persona,
        /// Continue an interrupted session instead of starting over
        #[arg(long)]
        resume: bool,
    },
    /// Score a note's yurufuwa (abstractness) level into the meter
    Score {
        /// Id of the note to score
        note_id: String,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Create a new root note
    Add {
        /// Note text (plain, or a serialized rich-text document)
        text: String,
    },
    /// List root notes, newest first
    List,
    /// Show one note
    Show { id: String },
    /// Show a note with its deep-dive chains
    Tree { id: String },
    /// Delete a note and its whole subtree
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::FukaboriConfig::load()?;

    // Log to stderr so stdout stays clean for note output and piping.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Note { action } => match action {
            NoteAction::Add { text } => cli::note::add(&config, &text)?,
            NoteAction::List => cli::note::list(&config)?,
            NoteAction::Show { id } => cli::note::show(&config, &id)?,
            NoteAction::Tree { id } => cli::note::tree(&config, &id)?,
            NoteAction::Delete { id } => cli::note::delete(&config, &id)?,
        },
        Command::Dive {
            note_id,
            persona,
            resume,
        } => {
            cli::dive::run(&config, &note_id, persona, resume).await?;
        }
        Command::Score { note_id } => {
            cli::score::run(&config, &note_id).await?;
        }
    }

    Ok(())
}
