//! Score entry types
//!
//! A score entry is immutable once persisted: rows are only ever inserted or
//! pruned by retention, never updated.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One finished game, as recorded on the leaderboard.
///
/// Field names serialize in the camelCase form used by the legacy JSON file
/// and by the HTTP facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    /// Player display name
    pub name: String,
    /// Elapsed play time in milliseconds
    pub time_ms: u64,
    /// Number of attempts (pair flips) taken
    pub attempts: u32,
    pub difficulty_id: String,
    pub difficulty_label: String,
    pub emoji_set_id: String,
    pub emoji_set_label: String,
    /// Multiplier applied by the difficulty when computing the score
    #[serde(rename = "scoreMultiplier")]
    pub multiplier: f64,
    /// Final computed score
    #[serde(rename = "scoreValue")]
    pub score: u64,
    /// Whether the game was played by the auto-demo rather than a person
    #[serde(rename = "isAutoDemo")]
    pub auto_demo: bool,
    pub created_at: DateTime<Utc>,
}

impl ScoreEntry {
    /// Canonical text form of `created_at`, as persisted.
    pub fn created_at_text(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// A score entry together with its surrogate storage id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: i64,
    #[serde(flatten)]
    pub entry: ScoreEntry,
}

/// Format an instant as RFC 3339 UTC with millisecond precision.
///
/// Every persisted timestamp goes through here so that lexical order of the
/// `created_at` column matches chronological order.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_canonical_form() {
        let t = parse_timestamp("2024-03-05T10:20:30+02:00").unwrap();
        assert_eq!(format_timestamp(&t), "2024-03-05T08:20:30.000Z");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_entry_serializes_legacy_field_names() {
        let entry = ScoreEntry {
            name: "ada".into(),
            time_ms: 42_000,
            attempts: 12,
            difficulty_id: "easy".into(),
            difficulty_label: "Easy".into(),
            emoji_set_id: "animals".into(),
            emoji_set_label: "Animals".into(),
            multiplier: 1.5,
            score: 900,
            auto_demo: false,
            created_at: parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["timeMs"], 42_000);
        assert_eq!(value["scoreMultiplier"], 1.5);
        assert_eq!(value["scoreValue"], 900);
        assert_eq!(value["isAutoDemo"], false);
        assert!(value.get("createdAt").is_some());
    }
}
