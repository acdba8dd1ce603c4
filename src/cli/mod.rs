use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, ConfigLoader};
use crate::posts::{self, PostIndex};

pub mod commands;

use self::commands::{DayArgs, GridArgs};

#[derive(Parser, Debug)]
#[command(
    name = "postcal",
    version,
    about = "Month and week calendar for scheduled social posts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over POSTCAL_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file with the posts to show (takes precedence over `seed_file` in the config)
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive calendar (default)
    Tui,
    /// Print the month or week grid for a date
    Grid(GridArgs),
    /// Print the posts scheduled on one day
    Day(DayArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("POSTCAL_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = matches!(command, Commands::Tui).then(|| loader.paths().log_file());
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = Arc::new(loader.load_or_init()?);
    let posts = load_posts(cli.seed.as_deref(), &config)?;

    match command {
        Commands::Tui => commands::run_tui(config, posts),
        Commands::Grid(args) => commands::print_grid(&config, &posts, args),
        Commands::Day(args) => commands::print_day(&posts, args),
    }
}

/// Seed precedence: `--seed`, then the config's `seed_file`, then the
/// built-in sample posts.
pub fn load_posts(seed: Option<&Path>, config: &AppConfig) -> Result<PostIndex> {
    let seed_path = seed.or(config.seed_file.as_deref());
    let records = match seed_path {
        Some(path) => posts::load_seed_file(path)
            .with_context(|| format!("loading posts from {}", path.display()))?,
        None => {
            tracing::info!("no seed file configured, using sample posts");
            posts::sample_posts()
        }
    };
    Ok(PostIndex::from_seed(records))
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn cli_parses_grid_arguments() {
        let cli = Cli::parse_from([
            "postcal",
            "--seed",
            "posts.json",
            "grid",
            "--view",
            "week",
            "--date",
            "2024-06-19",
        ]);
        assert_eq!(cli.seed, Some(PathBuf::from("posts.json")));
        match cli.command {
            Some(Commands::Grid(args)) => {
                assert_eq!(args.view, Some(crate::calendar::ViewMode::Week));
                assert_eq!(args.date.as_deref(), Some("2024-06-19"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn seed_flag_wins_over_config() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let flag = temp.path().join("flag.json");
        let configured = temp.path().join("configured.json");
        fs::write(&flag, r#"[{"date":"2024-01-02","title":"Flag","platform":"X"}]"#)?;
        fs::write(&configured, "[]")?;
        let mut config = AppConfig::default();
        config.seed_file = Some(configured);

        let from_flag = load_posts(Some(&flag), &config)?;
        assert_eq!(from_flag.len(), 1);
        let from_config = load_posts(None, &config)?;
        assert!(from_config.is_empty());
        let fallback = load_posts(None, &AppConfig::default())?;
        assert_eq!(fallback.len(), 2);
        Ok(())
    }

    #[test]
    fn broken_seed_file_is_reported_with_path() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("broken.json");
        fs::write(&path, "[{")?;
        let err = load_posts(Some(&path), &AppConfig::default()).expect_err("bad json");
        assert!(err.to_string().contains("loading posts from"));
        Ok(())
    }
}
