//! Scoreboard CLI - manage the leaderboard score store

use clap::{Parser, Subcommand};
use scoreboard::config::{self, ResolvedConfig, ScoreboardConfig};
use scoreboard::normalize::{normalize_entry, NormalizeOptions};
use scoreboard::storage::{open_backend, BackendKind, ScoreBackend};
use scoreboard::ui::{self, Icons};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scoreboard")]
#[command(version)]
#[command(about = "Durable leaderboard score store")]
#[command(long_about = r#"
Scoreboard keeps the most recent game scores in a SQLite database,
prunes anything past the retention cap, and imports the legacy
scores.json file exactly once.

Example usage:
  scoreboard init
  scoreboard migrate --legacy ./scores.json
  scoreboard recent --limit 20
  scoreboard serve --port 8787
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Storage backend: sqlite or memory (overrides the config file)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Maximum number of scores retained (overrides the config file)
    #[arg(long, global = true)]
    retention_cap: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter scoreboard.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Import the legacy JSON score file (runs once per database)
    Migrate {
        /// Legacy JSON file (defaults to the configured path)
        #[arg(short, long)]
        legacy: Option<PathBuf>,
    },

    /// Show the most recently recorded scores
    Recent {
        /// Maximum number of scores
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate and record one score given as JSON
    Add {
        /// Score payload, e.g. '{"name":"ada","timeMs":41000,...}'
        #[arg(short, long)]
        entry: String,
    },

    /// Show storage diagnostics
    Stats,

    /// Migrate once, then serve the HTTP score API
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Legacy JSON file to import before serving
        #[arg(short, long)]
        legacy: Option<PathBuf>,
    },
}

impl Cli {
    fn resolved_config(&self) -> anyhow::Result<ResolvedConfig> {
        let file = config::load_config(self.config.as_deref())?.unwrap_or_default();
        let mut resolved = file.resolve();
        if let Some(database) = &self.database {
            resolved.database = database.clone();
        }
        if let Some(backend) = &self.backend {
            resolved.backend = backend.clone();
        }
        if let Some(cap) = self.retention_cap {
            resolved.retention_cap = cap;
        }
        Ok(resolved)
    }
}

fn open_store(config: &ResolvedConfig) -> anyhow::Result<Box<dyn ScoreBackend>> {
    if config.backend.eq_ignore_ascii_case("sqlite") {
        config::ensure_db_dir(&config.database)?;
    }
    let location = config.database.to_string_lossy();
    Ok(open_backend(&config.backend, &location, config.retention_cap)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init must not read the config it may be replacing.
    if let Commands::Init { force } = cli.command {
        let path = cli.config.clone().unwrap_or_else(config::default_config_path);
        config::write_config(&path, &ScoreboardConfig::starter(), force)?;
        ui::success(&format!("Wrote {}", path.display()));
        return Ok(());
    }

    let settings = cli.resolved_config()?;

    match cli.command {
        // Written above, before the config is loaded
        Commands::Init { .. } => {}

        Commands::Migrate { legacy } => {
            let legacy = legacy.unwrap_or_else(|| settings.legacy_json.clone());
            let mut store = open_store(&settings)?;
            ui::header(&format!("Migrating legacy scores from {}", legacy.display()));

            let inserted = store.migrate_from_legacy_json(&legacy, &normalize_entry)?;
            if inserted == 0 && !store.diagnostics()?.migration_complete {
                ui::warn("Legacy file not found; migration will run again next time");
            } else {
                ui::success(&format!("Imported {} legacy scores", inserted));
            }
            store.close()?;
        }

        Commands::Recent { limit, format } => {
            let store = open_store(&settings)?;
            let entries = store.read_recent(limit)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("{} No scores recorded.", Icons::EMPTY);
            } else {
                ui::header(&format!("{} most recent scores", entries.len()));
                println!("{}", ui::recent_table(&entries));
            }
            store.close()?;
        }

        Commands::Add { entry } => {
            let raw: serde_json::Value = serde_json::from_str(&entry)?;
            let entry = normalize_entry(&raw, NormalizeOptions::default())?;
            let mut store = open_store(&settings)?;
            store.write_entry(&entry)?;
            ui::success(&format!("Recorded {} points for {}", entry.score, entry.name));
            store.close()?;
        }

        Commands::Stats => {
            let store = open_store(&settings)?;
            let diagnostics = store.diagnostics()?;

            println!("{} Scoreboard Statistics", Icons::DATABASE);
            println!("------------------------------------");
            println!("{}", diagnostics);
            if diagnostics.journal_mode != "wal" && diagnostics.kind == BackendKind::Sqlite {
                ui::warn("Write-ahead journaling is off; see the log above for likely causes");
            }
            store.close()?;
        }

        Commands::Serve { port, legacy } => {
            let legacy = legacy.unwrap_or_else(|| settings.legacy_json.clone());
            let port = port.unwrap_or(settings.port);
            let mut store = open_store(&settings)?;

            // A failed import is logged and retried on the next start; scores
            // already stored keep being served.
            match store.migrate_from_legacy_json(&legacy, &normalize_entry) {
                Ok(inserted) if inserted > 0 => {
                    ui::info("Legacy import", &format!("{} scores", inserted));
                }
                Ok(_) => {}
                Err(e) => {
                    ui::error(&format!("Legacy migration failed, retrying next start: {}", e));
                }
            }

            ui::summary_row("Backend:", &format!("{} ({})", store.kind(), store.location()));
            println!("{} Listening on http://0.0.0.0:{}", Icons::GLOBE, port);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(scoreboard::server::start_server(port, store, 10))?;
        }
    }

    Ok(())
}
