//! Core note type definitions.
//!
//! Defines [`Persona`] (the two AI questioners), [`Note`] (a row of the
//! `notes` table), and [`NoteTree`] (a note with its nested descendants).

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// The AI personas that pose deep-dive questions.
///
/// Each persona has a fixed voice but shares the same coaching strategy; see
/// [`Persona::render_prompt`](crate::prompt) for the prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// ドゥイットくん — blunt, action-first personal trainer.
    Doitkun,
    /// リスナーさん — gentle, supportive recovery coach.
    Listener,
}

impl Persona {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doitkun => "doitkun",
            Self::Listener => "listener",
        }
    }

    /// Display name shown in the CLI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Doitkun => "ドゥイットくん",
            Self::Listener => "リスナーさん",
        }
    }

    /// The persona's opening line.
    pub fn catchphrase(&self) -> &'static str {
        match self {
            Self::Doitkun => "オレが「なぜ？」を繰り返して、君の思考を深堀りしてやるぜ",
            Self::Listener => "焦らなくても大丈夫。一緒にゆっくり考えていこう",
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doitkun" => Ok(Self::Doitkun),
            "listener" => Ok(Self::Listener),
            _ => Err(format!("unknown persona: {s}")),
        }
    }
}

/// A note record, matching the `notes` table schema.
///
/// Roots have `parent_id = None`, `depth = 0`, and no question or persona.
/// Children carry the question they answer and the persona that asked it,
/// at `depth = parent.depth + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Owning user. Every lookup is scoped to this id.
    pub user_id: String,
    /// Note content — plain text or a serialized rich-text document.
    pub body: String,
    /// Parent note, or `None` for roots.
    pub parent_id: Option<String>,
    /// Distance from the root: 0 for roots, `parent.depth + 1` for children.
    pub depth: u32,
    /// The question this note answers. `None` for roots.
    pub question: Option<String>,
    /// The persona that posed `question`. `None` for roots.
    pub persona: Option<Persona>,
    /// Yurufuwa (abstractness) score in `[0.0, 1.0]`, or `None` if unscored.
    pub yurufuwa_score: Option<f64>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-modification timestamp.
    pub updated_at: String,
}

impl Note {
    /// `true` if this note has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A note and its descendants, nested. Children are ordered oldest-first
/// at every level.
#[derive(Debug, Clone, Serialize)]
pub struct NoteTree {
    pub note: Note,
    pub children: Vec<NoteTree>,
}

impl NoteTree {
    /// Total number of notes in this tree, the anchor included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NoteTree::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
