//! # Scoreboard - durable leaderboard storage
//!
//! Persistence core for a casual game's score table.
//!
//! Scoreboard provides:
//! - SQLite-backed storage of immutable score entries
//! - A bounded retention window, enforced after every write
//! - A one-time, idempotent import of scores from the legacy flat JSON file
//! - A pluggable backend interface selected by a string discriminator

pub mod entry;
pub mod identity;
pub mod normalize;
pub mod storage;
pub mod config;
pub mod server;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use entry::{ScoreEntry, StoredEntry};
pub use identity::identity_key;
pub use normalize::{normalize_entry, EntryRejected, NormalizeOptions, Normalizer};
pub use storage::{open_backend, BackendKind, ScoreBackend, SqliteStore, StoreDiagnostics};

/// Result type alias for Scoreboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Scoreboard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot open score database at {path}: {source}. {hint}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
        hint: &'static str,
    },

    #[error("Legacy migration from {path} failed: {source}")]
    Migration {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

/// Coarse classification of an [`Error`], so callers can branch on the
/// failure class without matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Open,
    Migration,
    Storage,
    Io,
    Parse,
    InvalidEntry,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Open { .. } => ErrorKind::Open,
            Error::Migration { .. } => ErrorKind::Migration,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Io(_) => ErrorKind::Io,
            Error::Parse(_) => ErrorKind::Parse,
            Error::InvalidEntry(_) => ErrorKind::InvalidEntry,
        }
    }

    /// True for failures caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::Parse | ErrorKind::InvalidEntry
        )
    }
}
