//! SQLite storage implementation

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::durability::{self, JournalOutcome};
use super::{repository, schema, BackendKind, StoreDiagnostics};
use crate::entry::{ScoreEntry, StoredEntry};
use crate::{Error, Result};

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

const OPEN_HINT: &str = "Check that the parent directory exists and is writable, \
     that the process has permission to create and modify the file, \
     and that the filesystem is not mounted read-only";

/// SQLite-backed score store
pub struct SqliteStore {
    pub(super) conn: Connection,
    kind: BackendKind,
    location: String,
    retention_cap: usize,
    journal: Option<JournalOutcome>,
    /// In-process cache of the persisted migration flag; only ever set true
    pub(super) migration_complete: bool,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, retention_cap: usize) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::Configuration("database path must not be empty".into()));
        }
        validate_cap(retention_cap)?;

        let conn = Connection::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
            hint: OPEN_HINT,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let location = path.display().to_string();
        schema::initialize(&conn).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
            hint: OPEN_HINT,
        })?;
        let journal = durability::enable_write_ahead_log(&conn, &location);

        tracing::debug!(location = %location, retention_cap, "opened score store");
        Ok(Self {
            conn,
            kind: BackendKind::Sqlite,
            location,
            retention_cap,
            journal: Some(journal),
            migration_complete: false,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(retention_cap: usize) -> Result<Self> {
        validate_cap(retention_cap)?;
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        tracing::debug!("in-memory score store keeps its memory journal");
        Ok(Self {
            conn,
            kind: BackendKind::Memory,
            location: ":memory:".to_string(),
            retention_cap,
            journal: None,
            migration_complete: false,
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn retention_cap(&self) -> usize {
        self.retention_cap
    }

    /// Outcome of the write-ahead log request made at open, if one was made
    pub fn journal_outcome(&self) -> Option<&JournalOutcome> {
        self.journal.as_ref()
    }

    // ========== Entry Operations ==========

    /// Insert one entry without trimming. Prefer [`SqliteStore::write_entry`].
    pub fn insert(&self, entry: &ScoreEntry) -> Result<i64> {
        Ok(repository::insert_entry(&self.conn, entry)?)
    }

    /// Insert an entry and trim to the retention cap, atomically.
    pub fn write_entry(&mut self, entry: &ScoreEntry) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = repository::insert_entry(&tx, entry)?;
        let pruned = repository::trim_to_cap(&tx, self.retention_cap)?;
        tx.commit()?;
        if pruned > 0 {
            tracing::debug!(pruned, cap = self.retention_cap, "trimmed score table");
        }
        Ok(id)
    }

    /// Up to `limit` entries, most recently created first
    pub fn read_recent(&self, limit: usize) -> Result<Vec<StoredEntry>> {
        Ok(repository::read_recent(&self.conn, limit)?)
    }

    /// Delete everything past the `cap` most recent entries
    pub fn trim(&self, cap: usize) -> Result<usize> {
        Ok(repository::trim_to_cap(&self.conn, cap)?)
    }

    /// Count all entries
    pub fn count_entries(&self) -> Result<usize> {
        Ok(repository::count_entries(&self.conn)?)
    }

    /// Whether the legacy migration has been committed, per the database
    pub fn migration_flag(&self) -> Result<bool> {
        Ok(repository::migration_flag(&self.conn)?)
    }

    /// Get database diagnostics
    pub fn diagnostics(&self) -> Result<StoreDiagnostics> {
        Ok(StoreDiagnostics {
            kind: self.kind,
            location: self.location.clone(),
            journal_mode: durability::current_journal_mode(&self.conn)?,
            entries: self.count_entries()?,
            retention_cap: self.retention_cap,
            migration_complete: self.migration_flag()?,
        })
    }

    /// Release the database handle
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Storage(e))
    }
}

fn validate_cap(retention_cap: usize) -> Result<()> {
    if retention_cap == 0 {
        return Err(Error::Configuration("retention cap must be at least 1".into()));
    }
    Ok(())
}
