//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `cauldron`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`] and performs the command's logic.
//!
//! Commands that change the Cauldron bracket their facade calls in a single
//! transaction, committed when every call succeeds and discarded otherwise.

pub mod add;
pub mod del;
pub mod get;
pub mod manifest;
pub mod repo;
pub mod update;

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

use cauldron::cauldron::Cauldron;
use cauldron::config::{self, CliConfig};
use cauldron::dependency::Dependency;
use cauldron::descriptor::NativeApplicationDescriptor;
use cauldron::manifest::Manifest;
use cauldron::output::{emoji, spinner, OutputConfig};

/// Settings shared by every command, from the global flags.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub cauldron_root: PathBuf,
    pub output: OutputConfig,
}

impl Context {
    pub fn load_config(&self) -> Result<CliConfig> {
        config::load_or_default(&self.config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_path.display()
            )
        })
    }

    /// Open and sync the Cauldron in use.
    pub fn open_cauldron(&self) -> Result<Cauldron> {
        let config = self.load_config()?;
        let settings = config.store_settings(&self.cauldron_root)?;
        let mut cauldron = Cauldron::open(&settings)?;
        if let Some(path) = &config.manifest {
            let manifest = Manifest::from_file(path)
                .with_context(|| format!("Failed to load manifest from {}", path.display()))?;
            cauldron = cauldron.with_manifest(Box::new(manifest));
        }

        let bar = spinner(
            &self.output,
            format!("Syncing Cauldron {}", settings.repository),
        );
        let synced = cauldron.sync();
        bar.finish_and_clear();
        synced?;
        Ok(cauldron)
    }
}

/// Entries (dependencies or mini-apps) to change in one version.
#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Entries, as [@scope/]name[@version]
    #[arg(required = true, value_name = "PACKAGE")]
    pub entries: Vec<String>,

    /// Native application version to change (name:platform:version).
    ///
    /// Prompted for among non-released versions when omitted.
    #[arg(short, long, value_name = "DESCRIPTOR")]
    pub descriptor: Option<String>,

    /// Container version to record.
    ///
    /// Defaults to the current container version with its patch bumped.
    #[arg(long, value_name = "VERSION")]
    pub container_version: Option<String>,
}

/// Apply `change` to every entry in one transaction, then record the new
/// container version.
pub fn change_entries<M, F>(ctx: &Context, args: EntriesArgs, message: M, change: F) -> Result<()>
where
    M: Fn(&Dependency, &NativeApplicationDescriptor) -> String,
    F: FnMut(&mut Cauldron, &NativeApplicationDescriptor, &Dependency) -> cauldron::error::Result<Dependency>,
{
    let entries = parse_dependencies(&args.entries)?;
    let mut cauldron = ctx.open_cauldron()?;
    let descriptor = descriptor_or_prompt(&mut cauldron, args.descriptor.as_deref())?;
    let current = cauldron.get_container_version(&descriptor)?;
    let container_version =
        next_container_version(args.container_version.as_deref(), current.as_deref())?;

    let messages = apply_entries(
        &mut cauldron,
        &descriptor,
        &entries,
        &container_version,
        message,
        change,
    )?;

    for line in &messages {
        println!("{} {}", emoji(&ctx.output, "✅", "[OK]"), line);
    }
    println!(
        "   Container version of {} is now {}",
        descriptor, container_version
    );
    Ok(())
}

/// Apply `change` to `entries` and set the container version in one
/// transaction.
///
/// `change` returns the entry as recorded, which may differ from the one
/// asked for (a versionless dependency gets its version from the manifest).
/// The commit message and the returned lines describe the recorded entries.
fn apply_entries<M, F>(
    cauldron: &mut Cauldron,
    descriptor: &NativeApplicationDescriptor,
    entries: &[Dependency],
    container_version: &str,
    message: M,
    mut change: F,
) -> cauldron::error::Result<Vec<String>>
where
    M: Fn(&Dependency, &NativeApplicationDescriptor) -> String,
    F: FnMut(&mut Cauldron, &NativeApplicationDescriptor, &Dependency) -> cauldron::error::Result<Dependency>,
{
    cauldron.with_transaction_described(
        |c| {
            let mut messages = Vec::with_capacity(entries.len());
            for entry in entries {
                let recorded = change(c, descriptor, entry)?;
                messages.push(message(&recorded, descriptor));
            }
            c.update_container_version(descriptor, container_version)?;
            Ok(messages)
        },
        |messages: &Vec<String>| messages.clone().into(),
    )
}

/// Parse descriptor arguments.
pub fn parse_descriptor(s: &str) -> Result<NativeApplicationDescriptor> {
    Ok(s.parse()?)
}

pub fn parse_dependencies(values: &[String]) -> Result<Vec<Dependency>> {
    values
        .iter()
        .map(|v| v.parse::<Dependency>().map_err(anyhow::Error::from))
        .collect()
}

/// The descriptor given on the command line, or one picked interactively
/// among the versions not yet released.
pub fn descriptor_or_prompt(
    cauldron: &mut Cauldron,
    descriptor: Option<&str>,
) -> Result<NativeApplicationDescriptor> {
    if let Some(descriptor) = descriptor {
        return parse_descriptor(descriptor);
    }

    let candidates = cauldron.non_released_versions()?;
    if candidates.is_empty() {
        bail!("No non-released native application version found in the Cauldron");
    }
    if !console::Term::stdout().is_term() {
        bail!("A --descriptor is required when not running interactively");
    }

    let labels: Vec<String> = candidates.iter().map(|d| d.to_string()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a non-released native application version")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(candidates[selection].clone())
}

/// The container version to record: the explicit one, or the current one
/// with its patch bumped (`1.0.0` when there is none).
pub fn next_container_version(explicit: Option<&str>, current: Option<&str>) -> Result<String> {
    if let Some(version) = explicit {
        return Ok(version.to_string());
    }
    match current {
        Some(current) => {
            let mut version = semver::Version::parse(current)
                .with_context(|| format!("Invalid container version {}", current))?;
            version.patch += 1;
            version.pre = semver::Prerelease::EMPTY;
            version.build = semver::BuildMetadata::EMPTY;
            Ok(version.to_string())
        }
        None => Ok("1.0.0".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cauldron::memory::{InMemoryGitOperations, InMemoryRemote};
    use cauldron::repository::{StoreSettings, VersionedRepository};
    use tempfile::TempDir;

    fn memory_cauldron(dir: &TempDir, remote: &InMemoryRemote) -> Cauldron {
        let settings = StoreSettings {
            repository: "memory://cauldron".to_string(),
            branch: "master".to_string(),
            path: dir.path().join("cauldron"),
        };
        let repo = VersionedRepository::with_operations(
            &settings,
            Box::new(InMemoryGitOperations::new(remote.clone())),
        )
        .unwrap();
        Cauldron::new(repo)
    }

    #[test]
    fn test_apply_entries_reports_recorded_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::from_yaml(
            r#"
platforms:
  "10":
    targetNativeDependencies: [react-native@0.40.0]
"#,
        )
        .unwrap();
        let mut c =
            memory_cauldron(&temp_dir, &InMemoryRemote::new()).with_manifest(Box::new(manifest));
        let descriptor = parse_descriptor("MyApp:ios:1.0.0").unwrap();
        c.with_transaction("Seed", |c| c.add_native_app(&descriptor, "10"))
            .unwrap();

        let messages = apply_entries(
            &mut c,
            &descriptor,
            &parse_dependencies(&["react-native".to_string()]).unwrap(),
            "1.0.0",
            |d, n| format!("Add {} native dependency to {}", d, n),
            |c, n, d| c.add_native_dependency(n, d),
        )
        .unwrap();

        assert_eq!(
            messages,
            vec!["Add react-native@0.40.0 native dependency to MyApp:ios:1.0.0"]
        );
        assert!(!c.repository().is_pending());
        assert_eq!(
            c.get_container_version(&descriptor).unwrap(),
            Some("1.0.0".to_string())
        );
    }

    #[test]
    fn test_next_container_version() {
        assert_eq!(next_container_version(None, None).unwrap(), "1.0.0");
        assert_eq!(next_container_version(None, Some("1.2.3")).unwrap(), "1.2.4");
        assert_eq!(
            next_container_version(Some("2.0.0"), Some("1.2.3")).unwrap(),
            "2.0.0"
        );
        assert!(next_container_version(None, Some("abc")).is_err());
    }

    #[test]
    fn test_parse_dependencies() {
        let deps =
            parse_dependencies(&["react-native@0.40.0".to_string(), "@org/x".to_string()])
                .unwrap();
        assert_eq!(deps.len(), 2);
        assert!(parse_dependencies(&["bad@".to_string()]).is_err());
    }

    #[test]
    fn test_parse_descriptor() {
        assert!(parse_descriptor("MyApp:android:1.0.0").is_ok());
        assert!(parse_descriptor("MyApp:windows").is_err());
    }
}
