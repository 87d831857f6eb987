//! Write-ahead journaling setup
//!
//! WAL is requested on every file-backed open. SQLite can silently keep the
//! old journal mode (network or read-only filesystems, builds without WAL),
//! so the achieved mode is read back and compared. A miss is logged once and
//! never fails the open: the store stays correct under the rollback journal,
//! only slower under write contention.

use rusqlite::Connection;

pub const REQUESTED_JOURNAL_MODE: &str = "wal";

/// What happened when write-ahead journaling was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalOutcome {
    pub requested: &'static str,
    /// Mode reported by SQLite afterwards, `None` if the pragma itself failed
    pub achieved: Option<String>,
}

impl JournalOutcome {
    pub fn is_write_ahead(&self) -> bool {
        self.achieved.as_deref() == Some(self.requested)
    }
}

/// Try to switch `conn` to WAL, warning if it does not take effect.
pub fn enable_write_ahead_log(conn: &Connection, location: &str) -> JournalOutcome {
    let attempt = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    });

    match attempt {
        Ok(mode) => {
            let outcome = JournalOutcome {
                requested: REQUESTED_JOURNAL_MODE,
                achieved: Some(mode.to_lowercase()),
            };
            if outcome.is_write_ahead() {
                tracing::debug!(location, "write-ahead journaling enabled");
            } else {
                tracing::warn!(
                    location,
                    requested = REQUESTED_JOURNAL_MODE,
                    achieved = %mode,
                    "Write-ahead journaling not enabled; continuing with the '{}' journal. \
                     Likely causes: no write permission on the database directory, a read-only \
                     or network filesystem, or a SQLite build without WAL support. Scores stay \
                     durable, but concurrent writes may be slower.",
                    mode
                );
            }
            outcome
        }
        Err(e) => {
            tracing::warn!(
                location,
                requested = REQUESTED_JOURNAL_MODE,
                error = %e,
                "Could not request write-ahead journaling; continuing with the default rollback \
                 journal. Check directory permissions and that the filesystem is local and \
                 writable."
            );
            JournalOutcome {
                requested: REQUESTED_JOURNAL_MODE,
                achieved: None,
            }
        }
    }
}

/// Current journal mode as reported by SQLite.
pub fn current_journal_mode(conn: &Connection) -> rusqlite::Result<String> {
    conn.pragma_query_value(None, "journal_mode", |row| row.get::<_, String>(0))
        .map(|mode| mode.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_database_gets_wal() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("scores.db")).unwrap();
        let outcome = enable_write_ahead_log(&conn, "scores.db");
        assert!(outcome.is_write_ahead());
        assert_eq!(current_journal_mode(&conn).unwrap(), "wal");
    }

    #[test]
    fn test_memory_database_degrades_without_error() {
        let conn = Connection::open_in_memory().unwrap();
        let outcome = enable_write_ahead_log(&conn, ":memory:");
        assert!(!outcome.is_write_ahead());
        assert_eq!(outcome.achieved.as_deref(), Some("memory"));
    }
}
