//! Prepared operations on the scores and meta tables.
//!
//! Every function takes a plain `&Connection`, so the same code runs against
//! the store's connection and inside a `rusqlite::Transaction`.

use std::collections::HashSet;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schema::{LEGACY_MIGRATION_KEY, MIGRATION_COMPLETE};
use crate::entry::{parse_timestamp, ScoreEntry, StoredEntry};
use crate::identity::IdentityFields;

const SELECT_COLUMNS: &str = "id, name, time_ms, attempts, difficulty_id, difficulty_label, \
     emoji_set_id, emoji_set_label, score_multiplier, score_value, is_auto_demo, created_at";

/// Insert one already-normalized entry. Returns the new row id.
pub fn insert_entry(conn: &Connection, entry: &ScoreEntry) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO scores (name, time_ms, attempts, difficulty_id, difficulty_label,
                            emoji_set_id, emoji_set_label, score_multiplier, score_value,
                            is_auto_demo, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )?;
    stmt.execute(params![
        entry.name,
        entry.time_ms,
        entry.attempts,
        entry.difficulty_id,
        entry.difficulty_label,
        entry.emoji_set_id,
        entry.emoji_set_label,
        entry.multiplier,
        entry.score,
        entry.auto_demo,
        entry.created_at_text(),
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Most recently created entries first, at most `limit` of them.
pub fn read_recent(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<StoredEntry>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SELECT_COLUMNS} FROM scores ORDER BY created_at DESC, id DESC LIMIT ?1"
    ))?;
    let entries = stmt
        .query_map([limit], row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Delete every row ranked past `cap` by recency. Returns the number removed.
pub fn trim_to_cap(conn: &Connection, cap: usize) -> rusqlite::Result<usize> {
    let cap = i64::try_from(cap).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(
        r#"
        DELETE FROM scores WHERE id IN (
            SELECT id FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY created_at DESC, id DESC) AS recency
                FROM scores
            ) WHERE recency > ?1
        )
        "#,
    )?;
    stmt.execute([cap])
}

/// Count all stored entries
pub fn count_entries(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Whether the persisted legacy migration flag says "complete".
/// An absent row reads as incomplete.
pub fn migration_flag(conn: &Connection) -> rusqlite::Result<bool> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            [LEGACY_MIGRATION_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.as_deref() == Some(MIGRATION_COMPLETE))
}

pub fn mark_migration_complete(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![LEGACY_MIGRATION_KEY, MIGRATION_COMPLETE],
    )?;
    Ok(())
}

/// Identity keys of every stored row.
///
/// Walks a cursor and builds each key from borrowed column values; no
/// [`ScoreEntry`] is materialized per row.
pub fn collect_identity_keys(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name, time_ms, attempts, difficulty_id, difficulty_label, emoji_set_id, \
         emoji_set_label, score_multiplier, score_value, is_auto_demo, created_at FROM scores",
    )?;
    let mut rows = stmt.query([])?;
    let mut keys = HashSet::new();
    while let Some(row) = rows.next()? {
        let fields = IdentityFields {
            name: get_text(row, 0)?,
            time_ms: get_unsigned(row, 1)?,
            attempts: get_unsigned(row, 2)?,
            difficulty_id: get_text(row, 3)?,
            difficulty_label: get_text(row, 4)?,
            emoji_set_id: get_text(row, 5)?,
            emoji_set_label: get_text(row, 6)?,
            multiplier: row.get(7)?,
            score: get_unsigned(row, 8)?,
            auto_demo: row.get(9)?,
            created_at: get_text(row, 10)?,
        };
        keys.insert(fields.key());
    }
    Ok(keys)
}

fn get_text<'r>(row: &'r Row<'_>, idx: usize) -> rusqlite::Result<&'r str> {
    row.get_ref(idx)?
        .as_str()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read an INTEGER column into an unsigned type.
fn get_unsigned<T: TryFrom<i64>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: i64 = row.get(idx)?;
    T::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}

/// Helper to convert a row to a StoredEntry
fn row_to_entry(row: &Row) -> rusqlite::Result<StoredEntry> {
    let created_at_str: String = row.get(11)?;
    let created_at = parse_timestamp(&created_at_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            Type::Text,
            format!("invalid created_at: {created_at_str}").into(),
        )
    })?;

    Ok(StoredEntry {
        id: row.get(0)?,
        entry: ScoreEntry {
            name: row.get(1)?,
            time_ms: get_unsigned(row, 2)?,
            attempts: get_unsigned(row, 3)?,
            difficulty_id: row.get(4)?,
            difficulty_label: row.get(5)?,
            emoji_set_id: row.get(6)?,
            emoji_set_label: row.get(7)?,
            multiplier: row.get(8)?,
            score: get_unsigned(row, 9)?,
            auto_demo: row.get(10)?,
            created_at,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::identity_key;
    use crate::storage::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::initialize(&conn).unwrap();
        conn
    }

    fn sample(name: &str, created_at: &str) -> ScoreEntry {
        ScoreEntry {
            name: name.into(),
            time_ms: 45_250,
            attempts: 16,
            difficulty_id: "easy".into(),
            difficulty_label: "Easy".into(),
            emoji_set_id: "animals".into(),
            emoji_set_label: "Animals".into(),
            multiplier: 1.25,
            score: 640,
            auto_demo: false,
            created_at: parse_timestamp(created_at).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = conn();
        let entry = sample("ada", "2024-02-01T12:00:00Z");
        let id = insert_entry(&conn, &entry).unwrap();

        let rows = read_recent(&conn, 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].entry, entry);
    }

    #[test]
    fn test_read_recent_orders_by_created_then_id() {
        let conn = conn();
        insert_entry(&conn, &sample("old", "2024-01-01T00:00:00Z")).unwrap();
        insert_entry(&conn, &sample("tie-a", "2024-01-02T00:00:00Z")).unwrap();
        insert_entry(&conn, &sample("tie-b", "2024-01-02T00:00:00Z")).unwrap();

        let names: Vec<_> = read_recent(&conn, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.entry.name)
            .collect();
        assert_eq!(names, ["tie-b", "tie-a", "old"]);

        assert_eq!(read_recent(&conn, 2).unwrap().len(), 2);
        assert!(read_recent(&conn, 0).unwrap().is_empty());
    }

    #[test]
    fn test_trim_keeps_most_recent() {
        let conn = conn();
        for day in 1..=5 {
            insert_entry(&conn, &sample(&format!("p{day}"), &format!("2024-01-0{day}T00:00:00Z")))
                .unwrap();
        }
        assert_eq!(trim_to_cap(&conn, 3).unwrap(), 2);
        assert_eq!(count_entries(&conn).unwrap(), 3);

        let names: Vec<_> = read_recent(&conn, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.entry.name)
            .collect();
        assert_eq!(names, ["p5", "p4", "p3"]);
        assert_eq!(trim_to_cap(&conn, 3).unwrap(), 0);
    }

    #[test]
    fn test_migration_flag_defaults_incomplete() {
        let conn = conn();
        assert!(!migration_flag(&conn).unwrap());
        mark_migration_complete(&conn).unwrap();
        mark_migration_complete(&conn).unwrap();
        assert!(migration_flag(&conn).unwrap());
    }

    #[test]
    fn test_identity_scan_matches_entry_keys() {
        let conn = conn();
        let entry = sample("ada", "2024-02-01T12:00:00.125Z");
        insert_entry(&conn, &entry).unwrap();

        let keys = collect_identity_keys(&conn).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&identity_key(&entry)));
    }
}
