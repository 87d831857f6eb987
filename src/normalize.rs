//! Entry validation and normalization
//!
//! Turns an arbitrary JSON payload (an HTTP request body or one element of
//! the legacy `entries` array) into a well-formed [`ScoreEntry`], or rejects
//! it. The storage core never calls this directly; migration takes any
//! [`Normalizer`] as a parameter.

use chrono::{SubsecRound, Utc};
use serde_json::{Map, Value};

use crate::entry::{parse_timestamp, ScoreEntry};

/// Longest player name kept; longer names are truncated.
pub const MAX_NAME_CHARS: usize = 32;

/// Largest integer a legacy JSON number can hold exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Honor a `createdAt` supplied by the payload instead of stamping now.
    /// Only trusted sources (legacy migration) enable this.
    pub allow_created_at: bool,
}

impl NormalizeOptions {
    pub fn trusted() -> Self {
        Self { allow_created_at: true }
    }
}

/// A payload the normalizer refused, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entry rejected: {reason}")]
pub struct EntryRejected {
    pub reason: String,
}

impl EntryRejected {
    fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Signature of an entry normalizer.
pub type Normalizer = dyn Fn(&Value, NormalizeOptions) -> Result<ScoreEntry, EntryRejected>;

/// Default normalizer.
pub fn normalize_entry(raw: &Value, options: NormalizeOptions) -> Result<ScoreEntry, EntryRejected> {
    let obj = raw
        .as_object()
        .ok_or_else(|| EntryRejected::new("entry is not an object"))?;

    let name = required_string(obj, "name")?;
    let name: String = name.chars().take(MAX_NAME_CHARS).collect();

    let time_ms = required_count(obj, "timeMs")?;
    let attempts = u32::try_from(required_count(obj, "attempts")?)
        .map_err(|_| EntryRejected::new("attempts out of range"))?;
    let score = required_count(obj, "scoreValue")?;

    let difficulty_id = required_string(obj, "difficultyId")?;
    let difficulty_label =
        optional_string(obj, "difficultyLabel").unwrap_or_else(|| difficulty_id.clone());
    let emoji_set_id = required_string(obj, "emojiSetId")?;
    let emoji_set_label =
        optional_string(obj, "emojiSetLabel").unwrap_or_else(|| emoji_set_id.clone());

    let multiplier = match obj.get("scoreMultiplier") {
        None | Some(Value::Null) => 1.0,
        Some(v) => v
            .as_f64()
            .filter(|m| m.is_finite() && *m >= 0.0)
            // -0.0 passes the sign check; fold it into 0.0
            .map(|m| m + 0.0)
            .ok_or_else(|| EntryRejected::new("scoreMultiplier must be a non-negative number"))?,
    };

    let auto_demo = match obj.get("isAutoDemo") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(EntryRejected::new("isAutoDemo must be a boolean")),
    };

    let created_at = match obj.get("createdAt") {
        Some(Value::String(text)) if options.allow_created_at => parse_timestamp(text)
            .ok_or_else(|| EntryRejected::new(format!("createdAt is not a valid instant: {text}")))?,
        Some(Value::Null) | None => Utc::now(),
        Some(_) if options.allow_created_at => {
            return Err(EntryRejected::new("createdAt must be a string"));
        }
        Some(_) => Utc::now(),
    }
    .trunc_subsecs(3);

    Ok(ScoreEntry {
        name,
        time_ms,
        attempts,
        difficulty_id,
        difficulty_label,
        emoji_set_id,
        emoji_set_label,
        multiplier,
        score,
        auto_demo,
        created_at,
    })
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required_string(obj: &Map<String, Value>, field: &str) -> Result<String, EntryRejected> {
    optional_string(obj, field).ok_or_else(|| EntryRejected::new(format!("missing {field}")))
}

/// Non-negative whole number; fractional values are rounded.
fn required_count(obj: &Map<String, Value>, field: &str) -> Result<u64, EntryRejected> {
    let value = obj
        .get(field)
        .ok_or_else(|| EntryRejected::new(format!("missing {field}")))?;
    if let Some(n) = value.as_u64() {
        if n as f64 <= MAX_SAFE_INTEGER {
            return Ok(n);
        }
    } else if let Some(f) = value.as_f64() {
        if f.is_finite() && f >= 0.0 && f <= MAX_SAFE_INTEGER {
            return Ok(f.round() as u64);
        }
    }
    Err(EntryRejected::new(format!("{field} must be a non-negative number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "name": "  grace  ",
            "timeMs": 30500.4,
            "attempts": 14,
            "difficultyId": "medium",
            "difficultyLabel": "Medium",
            "emojiSetId": "space",
            "scoreMultiplier": 1.5,
            "scoreValue": 750,
            "createdAt": "2023-11-02T09:15:00.250Z"
        })
    }

    #[test]
    fn test_normalizes_well_formed_payload() {
        let entry = normalize_entry(&payload(), NormalizeOptions::trusted()).unwrap();
        assert_eq!(entry.name, "grace");
        assert_eq!(entry.time_ms, 30500);
        assert_eq!(entry.emoji_set_label, "space");
        assert!(!entry.auto_demo);
        assert_eq!(entry.created_at_text(), "2023-11-02T09:15:00.250Z");
    }

    #[test]
    fn test_untrusted_payload_is_stamped_now() {
        let before = Utc::now().trunc_subsecs(3);
        let entry = normalize_entry(&payload(), NormalizeOptions::default()).unwrap();
        assert!(entry.created_at >= before);
    }

    #[test]
    fn test_rejects_missing_name() {
        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("name");
        let err = normalize_entry(&raw, NormalizeOptions::trusted()).unwrap_err();
        assert_eq!(err.reason, "missing name");

        raw["name"] = json!("   ");
        assert!(normalize_entry(&raw, NormalizeOptions::trusted()).is_err());
    }

    #[test]
    fn test_rejects_negative_and_bad_values() {
        let mut raw = payload();
        raw["timeMs"] = json!(-5);
        assert!(normalize_entry(&raw, NormalizeOptions::trusted()).is_err());

        let mut raw = payload();
        raw["scoreMultiplier"] = json!("lots");
        assert!(normalize_entry(&raw, NormalizeOptions::trusted()).is_err());

        let mut raw = payload();
        raw["createdAt"] = json!("not a date");
        assert!(normalize_entry(&raw, NormalizeOptions::trusted()).is_err());

        assert!(normalize_entry(&json!([1, 2]), NormalizeOptions::trusted()).is_err());
    }

    #[test]
    fn test_negative_zero_multiplier_becomes_zero() {
        let mut raw = payload();
        raw["scoreMultiplier"] = json!(-0.0);
        let entry = normalize_entry(&raw, NormalizeOptions::trusted()).unwrap();
        assert_eq!(entry.multiplier, 0.0);
        assert!(entry.multiplier.is_sign_positive());
    }

    #[test]
    fn test_truncates_long_names() {
        let mut raw = payload();
        raw["name"] = json!("x".repeat(80));
        let entry = normalize_entry(&raw, NormalizeOptions::trusted()).unwrap();
        assert_eq!(entry.name.chars().count(), MAX_NAME_CHARS);
    }
}
