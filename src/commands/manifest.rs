//! # Manifest Command Implementation
//!
//! This module implements the `manifest` subcommand, which reads and extends
//! the target dependency lists recorded in the Cauldron in use.

use anyhow::Result;
use clap::{Args, Subcommand};

use cauldron::dependency::Dependency;
use cauldron::output::emoji;

use super::Context;

/// Manage the Cauldron's target dependencies
#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[command(subcommand)]
    pub command: ManifestSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ManifestSubcommand {
    /// Print the target dependencies
    Get,
    /// Add or replace a target native dependency
    AddNative {
        /// Dependency, as [@scope/]name@version
        dependency: String,
    },
    /// Add or replace a target JS dependency
    AddJs {
        /// Dependency, as [@scope/]name@version
        dependency: String,
    },
}

/// Execute the `manifest` command.
pub fn execute(args: ManifestArgs, ctx: &Context) -> Result<()> {
    let mut cauldron = ctx.open_cauldron()?;

    match args.command {
        ManifestSubcommand::Get => {
            let manifest = cauldron.get_manifest()?;
            println!("Target native dependencies:");
            for dependency in &manifest.target_native_dependencies {
                println!("  {}", dependency);
            }
            println!("Target JS dependencies:");
            for dependency in &manifest.target_js_dependencies {
                println!("  {}", dependency);
            }
        }
        ManifestSubcommand::AddNative { dependency } => {
            let dependency: Dependency = dependency.parse()?;
            cauldron.with_transaction(
                format!("Add {} to manifest target native dependencies", dependency),
                |c| c.add_target_native_dependency_to_manifest(&dependency),
            )?;
            println!(
                "{} Manifest now targets {}",
                emoji(&ctx.output, "✅", "[OK]"),
                dependency
            );
        }
        ManifestSubcommand::AddJs { dependency } => {
            let dependency: Dependency = dependency.parse()?;
            cauldron.with_transaction(
                format!("Add {} to manifest target JS dependencies", dependency),
                |c| c.add_target_js_dependency_to_manifest(&dependency),
            )?;
            println!(
                "{} Manifest now targets {}",
                emoji(&ctx.output, "✅", "[OK]"),
                dependency
            );
        }
    }

    Ok(())
}
