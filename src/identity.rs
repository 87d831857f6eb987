//! Identity keys for duplicate detection during legacy migration.
//!
//! The key is the pipe-joined concatenation of all eleven semantic fields of
//! an entry. It is never stored; rows are keyed by their surrogate id.

use crate::entry::ScoreEntry;

/// Borrowed view of the fields that make up an entry's identity.
///
/// Lets the migration scan build keys straight from database rows without
/// materializing a [`ScoreEntry`] per row.
#[derive(Debug, Clone, Copy)]
pub struct IdentityFields<'a> {
    pub name: &'a str,
    pub time_ms: u64,
    pub attempts: u32,
    pub difficulty_id: &'a str,
    pub difficulty_label: &'a str,
    pub emoji_set_id: &'a str,
    pub emoji_set_label: &'a str,
    pub multiplier: f64,
    pub score: u64,
    pub auto_demo: bool,
    /// Canonical `created_at` text, see [`crate::entry::format_timestamp`]
    pub created_at: &'a str,
}

impl IdentityFields<'_> {
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.name,
            self.time_ms,
            self.attempts,
            self.difficulty_id,
            self.difficulty_label,
            self.emoji_set_id,
            self.emoji_set_label,
            // SQLite reads a stored -0.0 back as 0
            self.multiplier + 0.0,
            self.score,
            u8::from(self.auto_demo),
            self.created_at,
        )
    }
}

/// Compute the identity key of an entry.
pub fn identity_key(entry: &ScoreEntry) -> String {
    let created_at = entry.created_at_text();
    IdentityFields {
        name: &entry.name,
        time_ms: entry.time_ms,
        attempts: entry.attempts,
        difficulty_id: &entry.difficulty_id,
        difficulty_label: &entry.difficulty_label,
        emoji_set_id: &entry.emoji_set_id,
        emoji_set_label: &entry.emoji_set_label,
        multiplier: entry.multiplier,
        score: entry.score,
        auto_demo: entry.auto_demo,
        created_at: &created_at,
    }
    .key()
}
