//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cauldron::config;
use cauldron::defaults::default_cauldron_root;
use cauldron::output::OutputConfig;

use crate::commands;

/// Cauldron - Track native application releases in a git repository
#[derive(Parser, Debug)]
#[command(name = "cauldron")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,

    /// Path to the configuration file.
    ///
    /// Defaults to `./.cauldron.yaml` when it exists, `~/.cauldron/config.yaml`
    /// otherwise.
    #[arg(long, global = true, value_name = "FILE", env = "CAULDRON_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding local Cauldron working copies.
    ///
    /// Defaults to `~/.cauldron/cauldrons`.
    #[arg(long, global = true, value_name = "DIR", env = "CAULDRON_ROOT")]
    cauldron_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage Cauldron repositories
    Repo(commands::repo::RepoArgs),
    /// Add entries to the Cauldron
    Add(commands::add::AddArgs),
    /// Remove entries from the Cauldron
    Del(commands::del::DelArgs),
    /// Read the Cauldron
    Get(commands::get::GetArgs),
    /// Update entries of the Cauldron
    Update(commands::update::UpdateArgs),
    /// Manage the Cauldron's target dependencies
    Manifest(commands::manifest::ManifestArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = commands::Context {
            config_path: config::locate(self.config.as_deref()),
            cauldron_root: self.cauldron_root.unwrap_or_else(default_cauldron_root),
            output: OutputConfig::from_env_and_flag(&self.color),
        };
        log::debug!("Using configuration {}", ctx.config_path.display());

        match self.command {
            Commands::Repo(args) => commands::repo::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Del(args) => commands::del::execute(args, &ctx),
            Commands::Get(args) => commands::get::execute(args, &ctx),
            Commands::Update(args) => commands::update::execute(args, &ctx),
            Commands::Manifest(args) => commands::manifest::execute(args, &ctx),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filters) if !filters.is_empty() => builder.parse_filters(&filters),
        _ => builder.parse_filters(level),
    };
    builder.format_timestamp(None);
    let _ = builder.try_init();
}
