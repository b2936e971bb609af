//! Conversation reconstruction from a persisted note tree.
//!
//! A deep-dive session never keeps its transcript in memory — each round
//! re-derives it from the store. [`build_history`] turns a root note and its
//! descendants into ordered question/answer turns, in creation order rather
//! than depth order: when a user has run several deep-dive branches under one
//! root, the turns interleave exactly as they were written.

use crate::document::extract_text;
use crate::note::types::Note;

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// The reconstructed conversation up to a given depth.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// All turns, creation order ascending.
    pub turns: Vec<Turn>,
    /// The most recent turn at exactly the requested depth — the one persona
    /// prompts weight over the rest of the history. Latest `created_at` wins
    /// among siblings. `None` when the requested depth is 0.
    pub previous: Option<Turn>,
}

impl Transcript {
    /// Render the full history as numbered Q/A lines for prompt assembly.
    pub fn history_text(&self) -> String {
        let mut out = String::new();
        for (i, turn) in self.turns.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("Q{}. {}\nA{}. {}", i + 1, turn.question, i + 1, turn.answer));
        }
        out
    }
}

/// Reconstruct the conversation from `root`'s descendants, including turns at
/// depth 1 through `up_to_depth`.
///
/// The root itself carries no question and is always excluded; `descendants`
/// may or may not include it. Answer bodies are flattened to plain text —
/// a note whose stored document does not parse degrades to its raw text
/// rather than failing the reconstruction.
pub fn build_history(root: &Note, descendants: &[Note], up_to_depth: u32) -> Transcript {
    let mut children: Vec<&Note> = descendants
        .iter()
        .filter(|n| n.id != root.id && n.depth >= 1 && n.depth <= up_to_depth)
        .collect();
    children.sort_by(|a, b| {
        (a.created_at.as_str(), a.id.as_str()).cmp(&(b.created_at.as_str(), b.id.as_str()))
    });

    let turns = children.iter().map(|n| to_turn(n)).collect();

    let previous = if up_to_depth > 0 {
        children
            .iter()
            .filter(|n| n.depth == up_to_depth)
            .max_by(|a, b| {
                (a.created_at.as_str(), a.id.as_str()).cmp(&(b.created_at.as_str(), b.id.as_str()))
            })
            .map(|n| to_turn(n))
    } else {
        None
    };

    Transcript { turns, previous }
}

fn to_turn(note: &Note) -> Turn {
    Turn {
        question: note.question.clone().unwrap_or_default(),
        answer: extract_text(&note.body),
    }
}
