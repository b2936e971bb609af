#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fukabori::db;
use fukabori::llm::{LlmError, TextGenerator};
use fukabori::note::store::{create_child, create_root};
use fukabori::note::types::{Note, Persona};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Same database, wrapped for session use.
pub fn shared_test_db() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(test_db()))
}

/// Build a linear question chain of `len` answers under `root_id`.
/// Returns the notes tip-last.
pub fn seed_chain(
    conn: &mut Connection,
    root_id: &str,
    user_id: &str,
    len: u32,
    persona: Persona,
) -> Vec<Note> {
    let mut notes = Vec::new();
    let mut parent_id = root_id.to_string();
    for i in 0..len {
        let child = create_child(
            conn,
            &parent_id,
            user_id,
            &format!("answer {i}"),
            &format!("question {i}?"),
            persona,
            5,
        )
        .unwrap();
        parent_id = child.id.clone();
        notes.push(child);
    }
    notes
}

/// Create a root note for `user_id` and return it.
pub fn seed_root(conn: &mut Connection, user_id: &str, body: &str) -> Note {
    create_root(conn, user_id, body).unwrap()
}

/// Generator double that replays scripted responses and records every prompt.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// A generator that answers `n` numbered questions, then runs dry.
    pub fn questions(n: usize) -> Arc<Self> {
        Self::new((1..=n).map(|i| Ok(format!("質問{i}？"))).collect())
    }

    /// How many times `generate` was called.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The `i`-th prompt handed to the generator.
    pub fn prompt(&self, i: usize) -> String {
        self.prompts.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}
