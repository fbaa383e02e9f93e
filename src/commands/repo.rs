//! # Repo Command Implementation
//!
//! This module implements the `repo` subcommand, which manages the Cauldron
//! repositories known to the CLI configuration.
//!
//! ## Subcommands
//!
//! - **`add`**: Register a Cauldron repository under an alias
//! - **`use`**: Switch the repository in use
//! - **`list`**: List registered repositories
//! - **`current`**: Show the repository in use

use anyhow::Result;
use clap::{Args, Subcommand};

use cauldron::output::emoji;

use super::Context;

/// Manage Cauldron repositories
#[derive(Args, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// Register a Cauldron repository under an alias
    Add {
        /// Alias of the repository
        alias: String,
        /// URL (or path) of the git repository
        url: String,
        /// Make it the repository in use
        #[arg(long)]
        current: bool,
    },
    /// Switch the repository in use
    Use {
        /// Alias of a registered repository
        alias: String,
    },
    /// List registered repositories
    List,
    /// Show the repository in use
    Current,
}

/// Execute the `repo` command.
pub fn execute(args: RepoArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.load_config()?;

    match args.command {
        RepoSubcommand::Add {
            alias,
            url,
            current,
        } => {
            config.add_repository(&alias, &url)?;
            if current {
                config.use_repository(&alias)?;
            }
            config.save(&ctx.config_path)?;
            println!(
                "{} Added Cauldron repository {} ({})",
                emoji(&ctx.output, "✅", "[OK]"),
                alias,
                url
            );
            if config.repository_in_use.as_deref() == Some(alias.as_str()) {
                println!("   {} is now the repository in use", alias);
            }
        }
        RepoSubcommand::Use { alias } => {
            config.use_repository(&alias)?;
            config.save(&ctx.config_path)?;
            println!(
                "{} Now using Cauldron repository {}",
                emoji(&ctx.output, "✅", "[OK]"),
                alias
            );
        }
        RepoSubcommand::List => {
            if config.repositories.is_empty() {
                println!("No Cauldron repository registered.");
                return Ok(());
            }
            for (alias, url) in &config.repositories {
                let marker = if config.repository_in_use.as_deref() == Some(alias.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {} {}", marker, alias, url);
            }
        }
        RepoSubcommand::Current => {
            let (alias, url) = config.current()?;
            println!("{} {}", alias, url);
        }
    }

    Ok(())
}
