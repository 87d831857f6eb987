use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_DATABASE: &str = "scoreboard.db";
pub const DEFAULT_LEGACY_JSON: &str = "scores.json";
pub const DEFAULT_RETENTION_CAP: usize = 100;
pub const DEFAULT_PORT: u16 = 8787;

/// Contents of `scoreboard.toml`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScoreboardConfig {
    pub backend: Option<String>,
    pub database: Option<String>,
    pub retention_cap: Option<usize>,
    pub legacy_json: Option<String>,
    pub port: Option<u16>,
}

/// Config with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub backend: String,
    pub database: PathBuf,
    pub retention_cap: usize,
    pub legacy_json: PathBuf,
    pub port: u16,
}

impl ScoreboardConfig {
    /// Defaults written by `scoreboard init`.
    pub fn starter() -> Self {
        Self {
            backend: Some(DEFAULT_BACKEND.to_string()),
            database: Some(DEFAULT_DATABASE.to_string()),
            retention_cap: Some(DEFAULT_RETENTION_CAP),
            legacy_json: Some(DEFAULT_LEGACY_JSON.to_string()),
            port: Some(DEFAULT_PORT),
        }
    }

    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            backend: self.backend.clone().unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            database: PathBuf::from(self.database.as_deref().unwrap_or(DEFAULT_DATABASE)),
            retention_cap: self.retention_cap.unwrap_or(DEFAULT_RETENTION_CAP),
            legacy_json: PathBuf::from(self.legacy_json.as_deref().unwrap_or(DEFAULT_LEGACY_JSON)),
            port: self.port.unwrap_or(DEFAULT_PORT),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("scoreboard.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ScoreboardConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ScoreboardConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ScoreboardConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_defaults() {
        let config: ScoreboardConfig = toml::from_str("retention_cap = 20").unwrap();
        let resolved = config.resolve();
        assert_eq!(resolved.retention_cap, 20);
        assert_eq!(resolved.backend, DEFAULT_BACKEND);
        assert_eq!(resolved.database, PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(resolved.port, DEFAULT_PORT);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoreboard.toml");
        write_config(&path, &ScoreboardConfig::starter(), false).unwrap();
        assert!(write_config(&path, &ScoreboardConfig::starter(), false).is_err());

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.resolve(), ScoreboardConfig::starter().resolve());
        assert!(load_config(Some(&dir.path().join("absent.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_force_replaces_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoreboard.toml");
        std::fs::write(&path, "retention_cap = \"lots").unwrap();
        assert!(load_config(Some(&path)).is_err());

        write_config(&path, &ScoreboardConfig::starter(), true).unwrap();
        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.retention_cap, Some(DEFAULT_RETENTION_CAP));
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data").join("scores.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
