//! 深堀り (fukabori) — a deep-dive journaling engine.
//!
//! Users write freeform notes. Each note can be "deep-dived": an AI persona
//! asks up to five rounds of Socratic follow-up questions, and every answer is
//! persisted as a child note, forming a tree under the original entry. On the
//! side, a yurufuwa (abstractness) scorer rates how far each note still is
//! from something actionable and accumulates a per-user meter; crossing the
//! meter threshold triggers a small-step action plan.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one self-referential `notes` table with
//!   `ON DELETE CASCADE` on the parent link — a root and its question chain
//!   live and die together
//! - **Sessions**: the deep-dive state machine keeps no durable state of its
//!   own; every round is committed before the session advances, so an
//!   interrupted session resumes from the persisted tree alone
//! - **Generation**: a single `generate(prompt) -> text` capability (Gemini),
//!   injected as a trait object so tests script it
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`auth`] — User identity resolution
//! - [`note`] — The note tree: creation, tree queries, cascade delete, scoring
//! - [`transcript`] — Question/answer history reconstruction from a note tree
//! - [`prompt`] — Persona prompt rendering
//! - [`dive`] — The deep-dive session state machine
//! - [`llm`] — Text-generation collaborator trait and the Gemini client
//! - [`document`] — Plain-text extraction from rich-text note bodies

pub mod auth;
pub mod config;
pub mod db;
pub mod dive;
pub mod document;
pub mod error;
pub mod llm;
pub mod note;
pub mod prompt;
pub mod transcript;
