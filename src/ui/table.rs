use tabled::{settings::Style, Table, Tabled};

use crate::entry::StoredEntry;

#[derive(Tabled)]
pub struct ScoreRow {
    #[tabled(rename = "#")]
    pub id: i64,
    #[tabled(rename = "Player")]
    pub name: String,
    #[tabled(rename = "Score")]
    pub score: u64,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Attempts")]
    pub attempts: u32,
    #[tabled(rename = "Difficulty")]
    pub difficulty: String,
    #[tabled(rename = "Emoji set")]
    pub emoji_set: String,
    #[tabled(rename = "Created")]
    pub created_at: String,
}

impl From<&StoredEntry> for ScoreRow {
    fn from(stored: &StoredEntry) -> Self {
        let e = &stored.entry;
        let name = if e.auto_demo {
            format!("{} (demo)", e.name)
        } else {
            e.name.clone()
        };
        Self {
            id: stored.id,
            name,
            score: e.score,
            time: format_elapsed(e.time_ms),
            attempts: e.attempts,
            difficulty: e.difficulty_label.clone(),
            emoji_set: e.emoji_set_label.clone(),
            created_at: e.created_at_text(),
        }
    }
}

/// `m:ss.t` rendering of a play time
pub fn format_elapsed(time_ms: u64) -> String {
    let minutes = time_ms / 60_000;
    let seconds = (time_ms % 60_000) / 1_000;
    let tenths = (time_ms % 1_000) / 100;
    format!("{minutes}:{seconds:02}.{tenths}")
}

pub fn recent_table(entries: &[StoredEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let rows: Vec<ScoreRow> = entries.iter().map(ScoreRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00.0");
        assert_eq!(format_elapsed(61_250), "1:01.2");
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert!(recent_table(&[]).is_empty());
    }
}
