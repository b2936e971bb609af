//! Deep-dive session orchestration.
//!
//! A [`DiveSession`] walks a user through up to `max_depth` rounds of
//! AI-generated questioning anchored at one note: generate a question from the
//! persisted transcript, wait for the answer, persist it as a child note,
//! repeat. The only durable state is the note tree itself — every round's
//! question and answer are committed before the session advances, and the
//! transcript is re-read from the store each round rather than cached. A
//! session that dies mid-chain can therefore be picked up again with
//! [`DiveSession::resume`], which re-derives the current branch from the
//! persisted tree.
//!
//! Store and generator failures never escape the session. They land in
//! [`DiveState::Failed`] with enough context to retry the one failed step;
//! callers observe outcomes by inspecting [`DiveSession::state`].

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::document::extract_text;
use crate::error::NoteError;
use crate::llm::TextGenerator;
use crate::note::store::create_child;
use crate::note::tree::{collect_subtree, deepest_descendant, find_ancestor_root};
use crate::note::types::Persona;
use crate::prompt::PromptContext;
use crate::transcript::build_history;

/// Where a session stopped making progress.
///
/// Both variants carry the parent note id and its depth so the caller can
/// retry the exact step that failed; [`PersistFailed`](FailReason::PersistFailed)
/// also keeps the pending question, since the user's answer is still unsaved
/// and must be re-acceptable as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// The generator returned an error or blank text.
    QuestionGenerationFailed { parent_id: String, depth: u32 },
    /// The child-note write failed; no note was created and the depth did not
    /// advance.
    PersistFailed {
        parent_id: String,
        depth: u32,
        question: String,
    },
}

/// The session state machine.
///
/// `parent_id`/`depth` always name the note the next child will hang under —
/// the root at depth 0 on the first round, then each freshly created answer
/// note. `Terminated` and `Aborted` are final; `Failed` can re-enter the
/// failed step via [`DiveSession::retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiveState {
    Idle,
    AwaitingQuestion {
        parent_id: String,
        depth: u32,
    },
    AwaitingAnswer {
        parent_id: String,
        depth: u32,
        question: String,
    },
    Terminated,
    Aborted,
    Failed(FailReason),
}

impl Default for DiveState {
    fn default() -> Self {
        Self::Idle
    }
}

impl DiveState {
    /// `true` once the session can make no further progress, even with a
    /// retry.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Terminated | Self::Aborted)
    }
}

/// One deep-dive run from `start` (or `resume`) to a terminal state.
pub struct DiveSession {
    db: Arc<Mutex<Connection>>,
    generator: Arc<dyn TextGenerator>,
    user_id: String,
    root_id: String,
    persona: Persona,
    max_depth: u32,
    state: DiveState,
}

impl DiveSession {
    /// Begin a session anchored at `root_id`.
    ///
    /// Construction never touches the store; the root's existence and
    /// ownership are checked on the first question fetch, which is where a
    /// bad id surfaces as a `Failed` state.
    pub fn start(
        db: Arc<Mutex<Connection>>,
        generator: Arc<dyn TextGenerator>,
        user_id: impl Into<String>,
        root_id: impl Into<String>,
        persona: Persona,
        max_depth: u32,
    ) -> Self {
        let root_id = root_id.into();
        tracing::info!(root_id = %root_id, persona = %persona, "deep-dive session started");
        Self {
            db,
            generator,
            user_id: user_id.into(),
            root_id: root_id.clone(),
            persona,
            max_depth,
            state: DiveState::AwaitingQuestion {
                parent_id: root_id,
                depth: 0,
            },
        }
    }

    /// Pick up an interrupted session on `root_id` from persisted data alone.
    ///
    /// The current branch is the deepest descendant of the root, ties broken
    /// by latest creation — most recent activity wins among sibling branches.
    /// A branch already at the depth cap resumes straight into `Terminated`.
    pub fn resume(
        db: Arc<Mutex<Connection>>,
        generator: Arc<dyn TextGenerator>,
        user_id: impl Into<String>,
        root_id: impl Into<String>,
        persona: Persona,
        max_depth: u32,
    ) -> Result<Self, NoteError> {
        let user_id = user_id.into();
        let root_id = root_id.into();

        let tip = {
            let conn = db.lock().map_err(|_| NoteError::StoreUnavailable)?;
            deepest_descendant(&conn, &root_id, &user_id, max_depth)?
        };

        let state = if tip.depth >= max_depth {
            DiveState::Terminated
        } else {
            DiveState::AwaitingQuestion {
                parent_id: tip.id.clone(),
                depth: tip.depth,
            }
        };
        tracing::info!(
            root_id = %root_id,
            tip_id = %tip.id,
            depth = tip.depth,
            "deep-dive session resumed"
        );

        Ok(Self {
            db,
            generator,
            user_id,
            root_id,
            persona,
            max_depth,
            state,
        })
    }

    pub fn state(&self) -> &DiveState {
        &self.state
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Generate the next question for the current parent note.
    ///
    /// Re-reads the persisted tree, rebuilds the transcript, renders the
    /// persona prompt, and calls the generator. Non-empty trimmed text moves
    /// the session to `AwaitingAnswer`; anything else — a store error, a
    /// generator error, blank output — lands in
    /// `Failed(QuestionGenerationFailed)`. Outside `AwaitingQuestion` this is
    /// a no-op.
    pub async fn request_question(&mut self) -> &DiveState {
        let DiveState::AwaitingQuestion { parent_id, depth } = self.state.clone() else {
            tracing::warn!(state = ?self.state, "request_question outside AwaitingQuestion");
            return &self.state;
        };

        let prompt = match self.build_question_prompt(&parent_id) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(parent_id = %parent_id, depth, error = %e, "transcript reconstruction failed");
                self.state = DiveState::Failed(FailReason::QuestionGenerationFailed {
                    parent_id,
                    depth,
                });
                return &self.state;
            }
        };

        // The store lock is released here; only the prompt text crosses into
        // the await.
        match self.generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                let question = text.trim().to_string();
                tracing::debug!(parent_id = %parent_id, depth, "question ready");
                self.state = DiveState::AwaitingAnswer {
                    parent_id,
                    depth,
                    question,
                };
            }
            Ok(_) => {
                tracing::warn!(parent_id = %parent_id, depth, "generator returned blank question");
                self.state = DiveState::Failed(FailReason::QuestionGenerationFailed {
                    parent_id,
                    depth,
                });
            }
            Err(e) => {
                tracing::warn!(parent_id = %parent_id, depth, error = %e, "question generation failed");
                self.state = DiveState::Failed(FailReason::QuestionGenerationFailed {
                    parent_id,
                    depth,
                });
            }
        }
        &self.state
    }

    /// Persist `body` as the answer to the pending question.
    ///
    /// Success creates a child note at `depth + 1` and either loops back to
    /// `AwaitingQuestion` anchored at the new child or, when the child sits at
    /// the depth cap, ends the session in `Terminated` — never a further
    /// question. A persist failure moves to `Failed(PersistFailed)` without
    /// advancing; nothing was written, and the caller still holds the answer
    /// for re-submission. Outside `AwaitingAnswer` this is a no-op.
    pub async fn submit_answer(&mut self, body: &str) -> &DiveState {
        let DiveState::AwaitingAnswer {
            parent_id,
            depth,
            question,
        } = self.state.clone()
        else {
            tracing::warn!(state = ?self.state, "submit_answer outside AwaitingAnswer");
            return &self.state;
        };

        let persisted = match self.db.lock() {
            Ok(mut conn) => create_child(
                &mut conn,
                &parent_id,
                &self.user_id,
                body,
                &question,
                self.persona,
                self.max_depth,
            ),
            Err(_) => Err(NoteError::StoreUnavailable),
        };

        match persisted {
            Ok(child) => {
                if child.depth < self.max_depth {
                    self.state = DiveState::AwaitingQuestion {
                        parent_id: child.id,
                        depth: child.depth,
                    };
                } else {
                    tracing::info!(root_id = %self.root_id, depth = child.depth, "deep-dive complete");
                    self.state = DiveState::Terminated;
                }
            }
            Err(e) => {
                tracing::warn!(parent_id = %parent_id, depth, error = %e, "answer persist failed");
                self.state = DiveState::Failed(FailReason::PersistFailed {
                    parent_id,
                    depth,
                    question,
                });
            }
        }
        &self.state
    }

    /// Abandon the session. Already-persisted answers stay — partial progress
    /// is a valid, if incomplete, branch of the tree. No-op once the session
    /// is closed.
    pub fn abort(&mut self) {
        if !self.state.is_closed() {
            tracing::info!(root_id = %self.root_id, "deep-dive session aborted");
            self.state = DiveState::Aborted;
        }
    }

    /// Re-enter the step recorded in a `Failed` state: question generation
    /// failures go back to `AwaitingQuestion`, persist failures back to
    /// `AwaitingAnswer` with the same question, ready to re-accept the
    /// answer. No-op in any other state.
    pub fn retry(&mut self) -> &DiveState {
        if let DiveState::Failed(reason) = self.state.clone() {
            self.state = match reason {
                FailReason::QuestionGenerationFailed { parent_id, depth } => {
                    DiveState::AwaitingQuestion { parent_id, depth }
                }
                FailReason::PersistFailed {
                    parent_id,
                    depth,
                    question,
                } => DiveState::AwaitingAnswer {
                    parent_id,
                    depth,
                    question,
                },
            };
        }
        &self.state
    }

    /// Render the persona prompt for the next question under `parent_id`,
    /// from the persisted tree as it stands right now.
    fn build_question_prompt(&self, parent_id: &str) -> Result<String, NoteError> {
        let conn = self.db.lock().map_err(|_| NoteError::StoreUnavailable)?;

        // The anchor may be mid-chain; history always builds from the true
        // root, up to the anchor's own depth.
        let root = find_ancestor_root(&conn, parent_id, &self.user_id)?;
        let parent = crate::note::store::find_by_id(&conn, parent_id, &self.user_id)?;
        let descendants = collect_subtree(&conn, &root.id, &self.user_id, self.max_depth)?;

        let transcript = build_history(&root, &descendants, parent.depth);
        let ctx = PromptContext::from_transcript(extract_text(&root.body), &transcript, parent.depth);
        Ok(self.persona.render_prompt(&ctx))
    }
}
