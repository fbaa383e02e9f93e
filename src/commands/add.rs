//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which adds native
//! applications, native dependencies, mini-apps, binaries, source maps and
//! code push batches to the Cauldron in use.
//!
//! ## Subcommands
//!
//! - **`nativeapp`**: Create an application, platform or version (cascading)
//! - **`dependency`**: Add native dependencies to a non-released version
//! - **`miniapp`**: Add container mini-apps to a non-released version
//! - **`binary`** / **`sourcemap`**: Store a binary or source map for a version
//! - **`codepush`**: Record a batch of mini-apps shipped over the air

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use cauldron::output::emoji;

use super::{change_entries, parse_dependencies, parse_descriptor, Context, EntriesArgs};

/// Add entries to the Cauldron
#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(subcommand)]
    pub command: AddSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AddSubcommand {
    /// Add a native application, platform or version
    #[command(name = "nativeapp")]
    NativeApp {
        /// Descriptor (name[:platform[:version]])
        descriptor: String,
        /// Electrode Native platform version of a new version
        #[arg(long, value_name = "VERSION")]
        platform_version: Option<String>,
    },
    /// Add native dependencies to a non-released version
    Dependency(EntriesArgs),
    /// Add container mini-apps to a non-released version
    #[command(name = "miniapp")]
    MiniApp(EntriesArgs),
    /// Store the binary of a version
    Binary {
        /// Path of the binary to store
        path: PathBuf,
        /// Native application version (name:platform:version)
        #[arg(short, long, value_name = "DESCRIPTOR")]
        descriptor: String,
    },
    /// Store the source map of a version
    #[command(name = "sourcemap")]
    SourceMap {
        /// Path of the source map to store
        path: PathBuf,
        /// Native application version (name:platform:version)
        #[arg(short, long, value_name = "DESCRIPTOR")]
        descriptor: String,
    },
    /// Record mini-apps shipped over the air to a version
    #[command(name = "codepush")]
    CodePush {
        /// Mini-apps, as [@scope/]name@version
        #[arg(required = true, value_name = "PACKAGE")]
        mini_apps: Vec<String>,
        /// Native application version (name:platform:version)
        #[arg(short, long, value_name = "DESCRIPTOR")]
        descriptor: String,
    },
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AddSubcommand::NativeApp {
            descriptor,
            platform_version,
        } => add_native_app(ctx, &descriptor, platform_version.as_deref()),
        AddSubcommand::Dependency(entries) => change_entries(
            ctx,
            entries,
            |d, n| format!("Add {} native dependency to {}", d, n),
            |c, n, d| c.add_native_dependency(n, d),
        ),
        AddSubcommand::MiniApp(entries) => change_entries(
            ctx,
            entries,
            |m, n| format!("Add {} mini-app to {}", m, n),
            |c, n, m| c.add_container_mini_app(n, m).map(|_| m.clone()),
        ),
        AddSubcommand::Binary { path, descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let mut cauldron = ctx.open_cauldron()?;
            let stored = cauldron.with_transaction(
                format!("Add binary for {}", descriptor),
                |c| c.create_native_binary(&descriptor, &path),
            )?;
            println!(
                "{} Stored binary for {} at {}",
                emoji(&ctx.output, "✅", "[OK]"),
                descriptor,
                stored.display()
            );
            Ok(())
        }
        AddSubcommand::SourceMap { path, descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let mut cauldron = ctx.open_cauldron()?;
            let stored = cauldron.create_source_map(&descriptor, &path)?;
            println!(
                "{} Stored source map for {} at {}",
                emoji(&ctx.output, "✅", "[OK]"),
                descriptor,
                stored.display()
            );
            Ok(())
        }
        AddSubcommand::CodePush {
            mini_apps,
            descriptor,
        } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let mini_apps = parse_dependencies(&mini_apps)?;
            let mut cauldron = ctx.open_cauldron()?;
            cauldron.with_transaction(
                format!("Code push {} mini-app(s) to {}", mini_apps.len(), descriptor),
                |c| c.add_code_push_mini_apps(&descriptor, &mini_apps),
            )?;
            println!(
                "{} Recorded code push of {} mini-app(s) to {}",
                emoji(&ctx.output, "✅", "[OK]"),
                mini_apps.len(),
                descriptor
            );
            Ok(())
        }
    }
}

fn add_native_app(ctx: &Context, descriptor: &str, platform_version: Option<&str>) -> Result<()> {
    let descriptor = parse_descriptor(descriptor)?;
    if descriptor.version.is_some() && platform_version.is_none() {
        bail!("--platform-version is required to add a native application version");
    }
    let mut cauldron = ctx.open_cauldron()?;
    cauldron.with_transaction(format!("Add {} native application", descriptor), |c| {
        c.add_native_app(&descriptor, platform_version.unwrap_or_default())
    })?;
    println!(
        "{} Added {} to the Cauldron",
        emoji(&ctx.output, "✅", "[OK]"),
        descriptor
    );
    Ok(())
}
