//! One-time import of the legacy flat JSON score file.
//!
//! The legacy file looks like `{ "entries": [ {...}, ... ] }`. Each element
//! is run through the caller's normalizer; rejected elements are dropped.
//! Survivors are deduplicated by identity key against the stored rows and
//! against each other, then committed together with the completion flag in
//! a single transaction.
//!
//! A missing legacy file does not complete the migration: a later call (for
//! example after a restart once the file has appeared) tries again.

use std::collections::HashSet;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use rusqlite::TransactionBehavior;
use serde_json::Value;

use super::repository;
use super::sqlite::SqliteStore;
use crate::entry::ScoreEntry;
use crate::identity::identity_key;
use crate::normalize::{NormalizeOptions, Normalizer};
use crate::{Error, Result};

/// Retention caps above this get a memory estimate logged before the scan.
pub const LARGE_RETENTION_ADVISORY: usize = 10_000;

/// Rough heap cost of one identity key in the dedup set.
pub const APPROX_IDENTITY_KEY_BYTES: usize = 160;

impl SqliteStore {
    /// Import the legacy JSON file at `path`. Returns the number of rows
    /// inserted; 0 when the migration already ran or the file is absent.
    pub fn migrate_from_legacy_json(&mut self, path: &Path, normalize: &Normalizer) -> Result<usize> {
        if self.migration_complete {
            return Ok(0);
        }
        if repository::migration_flag(&self.conn)? {
            self.migration_complete = true;
            return Ok(0);
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no legacy score file; migration stays pending");
                return Ok(0);
            }
            Err(e) => return Err(migration_error(path, e.into())),
        };

        let document: Value =
            serde_json::from_str(&contents).map_err(|e| migration_error(path, e.into()))?;
        let candidates = normalize_legacy_entries(&document, normalize);

        self.advise_dedup_memory();

        let inserted = self
            .commit_legacy_entries(candidates)
            .map_err(|e| migration_error(path, e))?;

        self.migration_complete = true;
        tracing::info!(
            path = %path.display(),
            inserted,
            "legacy score migration complete"
        );
        Ok(inserted)
    }

    /// Insert, trim and flag inside one immediate transaction.
    ///
    /// The write lock is taken before the flag is re-read and the dedup scan
    /// runs, so a second process migrating the same file waits here and then
    /// sees the committed flag.
    fn commit_legacy_entries(&mut self, candidates: Vec<ScoreEntry>) -> Result<usize> {
        let cap = self.retention_cap();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if repository::migration_flag(&tx)? {
            tracing::info!("legacy migration was committed by another connection");
            return Ok(0);
        }

        let mut seen = repository::collect_identity_keys(&tx)?;
        let fresh = dedup_against(&mut seen, candidates);
        drop(seen);

        for entry in &fresh {
            repository::insert_entry(&tx, entry)?;
        }
        let pruned = repository::trim_to_cap(&tx, cap)?;
        repository::mark_migration_complete(&tx)?;
        tx.commit()?;

        if pruned > 0 {
            tracing::debug!(pruned, cap, "trimmed score table after migration");
        }
        Ok(fresh.len())
    }

    /// Log the dedup scan's memory estimate when the retention cap is large.
    /// Returns the estimate in bytes when the advisory fired.
    fn advise_dedup_memory(&self) -> Option<usize> {
        let cap = self.retention_cap();
        if cap <= LARGE_RETENTION_ADVISORY {
            return None;
        }
        let estimated_bytes = cap.saturating_mul(APPROX_IDENTITY_KEY_BYTES);
        tracing::info!(
            retention_cap = cap,
            estimated_bytes,
            "Legacy migration holds one identity key per stored row while deduplicating; \
             with this retention cap that is roughly {} MiB",
            estimated_bytes / (1024 * 1024)
        );
        Some(estimated_bytes)
    }
}

/// Normalize every element of the document's `entries` array, dropping
/// anything the normalizer rejects. A missing or non-array `entries` field
/// yields nothing.
fn normalize_legacy_entries(document: &Value, normalize: &Normalizer) -> Vec<ScoreEntry> {
    let Some(raw_entries) = document.get("entries").and_then(Value::as_array) else {
        tracing::debug!("legacy document has no entries array");
        return Vec::new();
    };

    let options = NormalizeOptions::trusted();
    let mut accepted = Vec::with_capacity(raw_entries.len());
    for (index, raw) in raw_entries.iter().enumerate() {
        match normalize(raw, options) {
            Ok(entry) => accepted.push(entry),
            Err(rejected) => {
                tracing::debug!(index, reason = %rejected.reason, "skipping legacy entry");
            }
        }
    }
    accepted
}

/// Keep the entries whose identity is not yet in `seen`, in order, adding
/// each kept key so later duplicates in the same batch are dropped too.
fn dedup_against(seen: &mut HashSet<String>, candidates: Vec<ScoreEntry>) -> Vec<ScoreEntry> {
    candidates
        .into_iter()
        .filter(|entry| seen.insert(identity_key(entry)))
        .collect()
}

fn migration_error(path: &Path, source: Error) -> Error {
    tracing::error!(path = %path.display(), error = %source, "legacy score migration failed");
    Error::Migration {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}
