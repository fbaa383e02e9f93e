//! # Del Command Implementation
//!
//! This module implements the `del` subcommand, which removes native
//! applications (at any granularity), native dependencies and container
//! mini-apps from the Cauldron in use.

use anyhow::Result;
use clap::{Args, Subcommand};

use cauldron::output::emoji;

use super::{change_entries, parse_descriptor, Context, EntriesArgs};

/// Remove entries from the Cauldron
#[derive(Args, Debug)]
pub struct DelArgs {
    #[command(subcommand)]
    pub command: DelSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum DelSubcommand {
    /// Remove a native application, platform or version, with everything below it
    #[command(name = "nativeapp")]
    NativeApp {
        /// Descriptor (name[:platform[:version]])
        descriptor: String,
    },
    /// Remove native dependencies from a non-released version
    Dependency(EntriesArgs),
    /// Remove container mini-apps from a non-released version
    #[command(name = "miniapp")]
    MiniApp(EntriesArgs),
}

/// Execute the `del` command.
pub fn execute(args: DelArgs, ctx: &Context) -> Result<()> {
    match args.command {
        DelSubcommand::NativeApp { descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            let mut cauldron = ctx.open_cauldron()?;
            cauldron.with_transaction(format!("Remove {} native application", descriptor), |c| {
                c.remove_native_app(&descriptor)
            })?;
            println!(
                "{} Removed {} from the Cauldron",
                emoji(&ctx.output, "🗑️ ", "[OK]"),
                descriptor
            );
            Ok(())
        }
        DelSubcommand::Dependency(entries) => change_entries(
            ctx,
            entries,
            |d, n| format!("Remove {} native dependency from {}", d, n),
            |c, n, d| c.remove_native_dependency(n, d).map(|_| d.clone()),
        ),
        DelSubcommand::MiniApp(entries) => change_entries(
            ctx,
            entries,
            |m, n| format!("Remove {} mini-app from {}", m, n),
            |c, n, m| c.remove_container_mini_app(n, m).map(|_| m.clone()),
        ),
    }
}
