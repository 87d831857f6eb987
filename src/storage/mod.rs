//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - scores(id, name, time_ms, attempts, difficulty, emoji set, multiplier, score, auto-demo, created_at)
//! - meta(key, value), holding the legacy migration flag
//!
//! Backends sit behind the [`ScoreBackend`] trait and are chosen by name
//! through [`open_backend`].

pub mod durability;
pub mod migration;
pub mod repository;
pub mod schema;
pub mod sqlite;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::entry::{ScoreEntry, StoredEntry};
use crate::normalize::Normalizer;
use crate::{Error, Result};

pub use sqlite::SqliteStore;

/// Storage backends known to [`open_backend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database file
    Sqlite,
    /// Private in-memory SQLite database, discarded on close
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "file" => Ok(BackendKind::Sqlite),
            "memory" | "in-memory" | "mem" => Ok(BackendKind::Memory),
            _ => Err(Error::Configuration(format!("Unknown storage backend: {}", s))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations the HTTP facade and CLI perform against a score store.
pub trait ScoreBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Where the data lives (file path, or `:memory:`)
    fn location(&self) -> &str;

    fn read_recent(&self, limit: usize) -> Result<Vec<StoredEntry>>;

    /// Persist one validated entry, then trim to the retention cap.
    fn write_entry(&mut self, entry: &ScoreEntry) -> Result<()>;

    /// Import the legacy JSON file once. Returns the number of rows added.
    fn migrate_from_legacy_json(&mut self, path: &Path, normalize: &Normalizer) -> Result<usize>;

    fn diagnostics(&self) -> Result<StoreDiagnostics>;

    fn close(self: Box<Self>) -> Result<()>;
}

impl ScoreBackend for SqliteStore {
    fn kind(&self) -> BackendKind {
        SqliteStore::kind(self)
    }

    fn location(&self) -> &str {
        SqliteStore::location(self)
    }

    fn read_recent(&self, limit: usize) -> Result<Vec<StoredEntry>> {
        SqliteStore::read_recent(self, limit)
    }

    fn write_entry(&mut self, entry: &ScoreEntry) -> Result<()> {
        SqliteStore::write_entry(self, entry).map(|_| ())
    }

    fn migrate_from_legacy_json(&mut self, path: &Path, normalize: &Normalizer) -> Result<usize> {
        SqliteStore::migrate_from_legacy_json(self, path, normalize)
    }

    fn diagnostics(&self) -> Result<StoreDiagnostics> {
        SqliteStore::diagnostics(self)
    }

    fn close(self: Box<Self>) -> Result<()> {
        SqliteStore::close(*self)
    }
}

/// Open a backend by name. `location` is ignored by the memory backend.
pub fn open_backend(kind: &str, location: &str, retention_cap: usize) -> Result<Box<dyn ScoreBackend>> {
    let kind: BackendKind = kind.parse()?;
    let store = match kind {
        BackendKind::Sqlite => {
            if location.trim().is_empty() {
                return Err(Error::Configuration("database path must not be empty".into()));
            }
            SqliteStore::open(Path::new(location), retention_cap)?
        }
        BackendKind::Memory => SqliteStore::open_in_memory(retention_cap)?,
    };
    Ok(Box::new(store))
}

/// Storage diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct StoreDiagnostics {
    pub kind: BackendKind,
    pub location: String,
    pub journal_mode: String,
    pub entries: usize,
    pub retention_cap: usize,
    pub migration_complete: bool,
}

impl fmt::Display for StoreDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Storage Diagnostics:")?;
        writeln!(f, "  Backend: {}", self.kind)?;
        writeln!(f, "  Location: {}", self.location)?;
        writeln!(f, "  Journal: {}", self.journal_mode)?;
        writeln!(f, "  Entries: {}/{}", self.entries, self.retention_cap)?;
        write!(
            f,
            "  Legacy migration: {}",
            if self.migration_complete { "complete" } else { "pending" }
        )
    }
}
