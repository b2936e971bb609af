//! CLI command implementations, one file per concern.

pub mod dive;
pub mod note;
pub mod score;

use crate::auth::{FixedUser, UserResolver};
use crate::config::{FukaboriConfig, LlmConfig};
use crate::error::NoteError;

/// Resolve the acting user from config. An empty `default_user` means no
/// identity and fails outright — nothing journals as anonymous.
pub(crate) fn resolve_user(config: &FukaboriConfig) -> Result<String, NoteError> {
    let resolver = if config.storage.default_user.is_empty() {
        FixedUser::unauthenticated()
    } else {
        FixedUser::new(config.storage.default_user.as_str())
    };
    resolver.current_user_id()
}

/// Warn when the configured model differs from the one that produced the
/// questions and scores already in this database.
pub(crate) fn check_llm_model(conn: &rusqlite::Connection, config: &LlmConfig) {
    if let Ok(Some(stored)) = crate::db::migrations::get_llm_model(conn) {
        if stored != config.model {
            tracing::warn!(
                stored = %stored,
                configured = %config.model,
                "llm model changed — existing questions and scores came from the old model"
            );
        }
    }
}

/// Record the model that just produced output, clearing the mismatch warning.
pub(crate) fn record_llm_model(conn: &rusqlite::Connection, config: &LlmConfig) {
    if let Err(e) = crate::db::migrations::set_llm_model(conn, &config.model) {
        tracing::warn!(error = %e, "failed to record llm model");
    }
}
