//! # Update Command Implementation
//!
//! This module implements the `update` subcommand, which changes existing
//! entries of the Cauldron in use: dependency and mini-app versions, the
//! release flag, the container version and layered config.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use cauldron::output::emoji;

use super::{change_entries, parse_descriptor, Context, EntriesArgs};

/// Update entries of the Cauldron
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub command: UpdateSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum UpdateSubcommand {
    /// Change the version of native dependencies of a non-released version
    Dependency(EntriesArgs),
    /// Change the version of container mini-apps of a non-released version
    #[command(name = "miniapp")]
    MiniApp(EntriesArgs),
    /// Mark a version as released (or not)
    Release {
        /// Native application version (name:platform:version)
        descriptor: String,
        /// Mark the version as not released instead
        #[arg(long)]
        unreleased: bool,
    },
    /// Set the container version of a version
    ContainerVersion {
        /// Native application version (name:platform:version)
        descriptor: String,
        /// Container version, as x.y.z
        version: String,
    },
    /// Set the config of an application, platform or version
    Config {
        /// Descriptor (name[:platform[:version]])
        descriptor: String,
        /// Config as a JSON object
        json: String,
    },
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, ctx: &Context) -> Result<()> {
    match args.command {
        UpdateSubcommand::Dependency(entries) => change_entries(
            ctx,
            entries,
            |d, n| format!("Update {} native dependency in {}", d, n),
            |c, n, d| c.update_native_dependency(n, d).map(|_| d.clone()),
        ),
        UpdateSubcommand::MiniApp(entries) => change_entries(
            ctx,
            entries,
            |m, n| format!("Update {} mini-app in {}", m, n),
            |c, n, m| c.update_mini_app_version(n, m).map(|_| m.clone()),
        ),
        UpdateSubcommand::Release {
            descriptor,
            unreleased,
        } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let released = !unreleased;
            let mut cauldron = ctx.open_cauldron()?;
            cauldron.with_transaction(
                format!("Set {} release status to {}", descriptor, released),
                |c| c.update_native_app_is_released(&descriptor, released),
            )?;
            println!(
                "{} {} is now {}",
                emoji(&ctx.output, "✅", "[OK]"),
                descriptor,
                if released { "released" } else { "not released" }
            );
            Ok(())
        }
        UpdateSubcommand::ContainerVersion {
            descriptor,
            version,
        } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let mut cauldron = ctx.open_cauldron()?;
            cauldron.with_transaction(
                format!("Set container version of {} to {}", descriptor, version),
                |c| c.update_container_version(&descriptor, &version),
            )?;
            println!(
                "{} Container version of {} is now {}",
                emoji(&ctx.output, "✅", "[OK]"),
                descriptor,
                version
            );
            Ok(())
        }
        UpdateSubcommand::Config { descriptor, json } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let config: serde_json::Value =
                serde_json::from_str(&json).context("Config must be valid JSON")?;
            let mut cauldron = ctx.open_cauldron()?;
            cauldron.with_transaction(format!("Update config of {}", descriptor), |c| {
                c.set_config(&descriptor, config)
            })?;
            println!(
                "{} Updated config of {}",
                emoji(&ctx.output, "✅", "[OK]"),
                descriptor
            );
            Ok(())
        }
    }
}
