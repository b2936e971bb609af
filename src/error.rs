//! Typed errors for the note store and session layers.
//!
//! The library raises [`NoteError`]; the CLI edge wraps it in `anyhow`. The
//! deep-dive orchestrator never propagates these past its boundary — it maps
//! them into a `Failed` state instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoteError {
    /// No resolved user identity. Operations never fall back to an anonymous
    /// default.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Referenced note is absent — or owned by a different user, which is
    /// reported identically so note ids cannot be probed across users.
    #[error("note not found: {id}")]
    NotFound { id: String },

    /// Child creation would push past the configured depth cap.
    #[error("depth limit exceeded: parent {parent_id} is at depth {depth}, max is {max}")]
    DepthExceeded {
        parent_id: String,
        depth: u32,
        max: u32,
    },

    /// A parent link points at a note that no longer exists. Data-integrity
    /// error — not silently recoverable.
    #[error("broken parent chain: note {id} references missing parent {parent_id}")]
    BrokenChain { id: String, parent_id: String },

    /// Underlying SQLite failure.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The shared connection lock was poisoned by a panicking writer.
    #[error("store unavailable: connection lock poisoned")]
    StoreUnavailable,
}
