//! Database schema definitions

use rusqlite::Connection;

/// SQL to create the scores table
pub const CREATE_SCORES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    time_ms INTEGER NOT NULL,
    attempts INTEGER NOT NULL,
    difficulty_id TEXT NOT NULL,
    difficulty_label TEXT NOT NULL,
    emoji_set_id TEXT NOT NULL,
    emoji_set_label TEXT NOT NULL,
    score_multiplier REAL NOT NULL,
    score_value INTEGER NOT NULL,
    is_auto_demo INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the key/value metadata table
pub const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// Recency index backing both `read_recent` and retention trimming
pub const CREATE_RECENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_scores_recent ON scores(created_at DESC, id DESC)";

/// Metadata key holding the legacy migration flag.
///
/// The key and its two values are persisted in existing installations;
/// changing any of them makes migrated databases import again.
pub const LEGACY_MIGRATION_KEY: &str = "legacy_json_migrated";
pub const MIGRATION_INCOMPLETE: &str = "0";
pub const MIGRATION_COMPLETE: &str = "1";

/// All schema creation statements
pub fn all_schema_statements() -> [&'static str; 3] {
    [CREATE_SCORES_TABLE, CREATE_RECENT_INDEX, CREATE_META_TABLE]
}

/// Create any missing table or index. Safe to run on every open.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    for stmt in all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        let objects: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name IN ('scores', 'meta', 'idx_scores_recent')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(objects, 3);
    }
}
