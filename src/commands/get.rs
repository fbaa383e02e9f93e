//! # Get Command Implementation
//!
//! This module implements the `get` subcommand, which reads the Cauldron in
//! use. This command is a safe, read-only operation: it never opens a
//! transaction.
//!
//! - **`nativeapp`**: Display applications, platforms and versions as a tree
//! - **`dependencies`** / **`miniapps`**: List the entries of a version
//! - **`config`**: Print the effective config of a node as JSON
//! - **`container-version`**: Print the container version of a version
//! - **`binary`** / **`sourcemap`**: Write a stored blob to a file

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use ptree::{print_tree, TreeItem};
use std::fs;
use std::path::PathBuf;

use cauldron::cauldron::NativeAppNode;
use cauldron::dependency::Dependency;
use cauldron::schema::{NativeApplication, NativeApplicationPlatform, NativeApplicationVersion};

use super::{parse_descriptor, Context};

/// Read the Cauldron
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(subcommand)]
    pub command: GetSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum GetSubcommand {
    /// Display native applications as a tree
    #[command(name = "nativeapp")]
    NativeApp {
        /// Descriptor (name[:platform[:version]]); every application when omitted
        descriptor: Option<String>,
    },
    /// List the native dependencies of a version
    Dependencies {
        /// Native application version (name:platform:version)
        descriptor: String,
    },
    /// List the mini-apps of a version
    #[command(name = "miniapps")]
    MiniApps {
        /// Native application version (name:platform:version)
        descriptor: String,
        /// List code push batches instead of container mini-apps
        #[arg(long)]
        codepush: bool,
    },
    /// Print the effective config of an application, platform or version
    Config {
        /// Descriptor (name[:platform[:version]])
        descriptor: String,
    },
    /// Print the container version of a version
    ContainerVersion {
        /// Native application version (name:platform:version)
        descriptor: String,
    },
    /// Write the binary of a version to a file
    Binary {
        /// Native application version (name:platform:version)
        descriptor: String,
        /// Destination file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Write the source map of a version to a file
    #[command(name = "sourcemap")]
    SourceMap {
        /// Native application version (name:platform:version)
        descriptor: String,
        /// Destination file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Execute the `get` command.
pub fn execute(args: GetArgs, ctx: &Context) -> Result<()> {
    let mut cauldron = ctx.open_cauldron()?;

    match args.command {
        GetSubcommand::NativeApp { descriptor } => {
            let roots: Vec<TreeNode> = match descriptor {
                None => {
                    let apps = cauldron.get_native_applications()?;
                    if apps.is_empty() {
                        println!("The Cauldron has no native application.");
                        return Ok(());
                    }
                    apps.iter().map(app_node).collect()
                }
                Some(descriptor) => {
                    let descriptor = parse_descriptor(&descriptor)?;
                    let node = match cauldron.get_native_app(&descriptor)? {
                        NativeAppNode::Application(app) => app_node(&app),
                        NativeAppNode::Platform(platform) => platform_node(&platform),
                        NativeAppNode::Version(version) => version_node(&version),
                    };
                    vec![node]
                }
            };
            for root in &roots {
                print_tree(root).map_err(|e| anyhow!("Failed to display tree: {}", e))?;
            }
        }
        GetSubcommand::Dependencies { descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            print_entries(&cauldron.get_native_dependencies(&descriptor)?);
        }
        GetSubcommand::MiniApps {
            descriptor,
            codepush,
        } => {
            let descriptor = parse_descriptor(&descriptor)?;
            if codepush {
                for (i, batch) in cauldron
                    .get_code_push_mini_apps(&descriptor)?
                    .iter()
                    .enumerate()
                {
                    println!("#{}", i + 1);
                    for mini_app in batch {
                        println!("  {}", mini_app);
                    }
                }
            } else {
                print_entries(&cauldron.get_container_mini_apps(&descriptor)?);
            }
        }
        GetSubcommand::Config { descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            match cauldron.get_config(&descriptor)? {
                Some(config) => println!("{}", serde_json::to_string_pretty(&config)?),
                None => println!("No config found for {}", descriptor),
            }
        }
        GetSubcommand::ContainerVersion { descriptor } => {
            let descriptor = parse_descriptor(&descriptor)?;
            match cauldron.get_container_version(&descriptor)? {
                Some(version) => println!("{}", version),
                None => println!("No container version recorded for {}", descriptor),
            }
        }
        GetSubcommand::Binary { descriptor, output } => {
            let descriptor = parse_descriptor(&descriptor)?;
            fs::write(&output, cauldron.get_native_binary(&descriptor)?)?;
            println!("Wrote binary of {} to {}", descriptor, output.display());
        }
        GetSubcommand::SourceMap { descriptor, output } => {
            let descriptor = parse_descriptor(&descriptor)?;
            fs::write(&output, cauldron.get_source_map(&descriptor)?)?;
            println!("Wrote source map of {} to {}", descriptor, output.display());
        }
    }

    Ok(())
}

fn print_entries(entries: &[Dependency]) {
    for entry in entries {
        println!("{}", entry);
    }
}

fn app_node(app: &NativeApplication) -> TreeNode {
    TreeNode {
        label: app.name.clone(),
        children: app.platforms.iter().map(platform_node).collect(),
    }
}

fn platform_node(platform: &NativeApplicationPlatform) -> TreeNode {
    TreeNode {
        label: platform.name.clone(),
        children: platform.versions.iter().map(version_node).collect(),
    }
}

fn version_node(version: &NativeApplicationVersion) -> TreeNode {
    let mut label = format!("{} (ern {})", version.name, version.ern_platform_version);
    if version.is_released {
        label.push_str(" [released]");
    }
    if let Some(container_version) = &version.container_version {
        label.push_str(&format!(" container {}", container_version));
    }

    let mut children = Vec::new();
    if !version.native_deps.is_empty() {
        children.push(list_node("nativeDeps", &version.native_deps));
    }
    if !version.mini_apps.container.is_empty() {
        children.push(list_node("miniApps", &version.mini_apps.container));
    }
    if !version.mini_apps.ota.is_empty() {
        children.push(TreeNode {
            label: "codePush".to_string(),
            children: version
                .mini_apps
                .ota
                .iter()
                .enumerate()
                .map(|(i, batch)| list_node(&format!("#{}", i + 1), batch))
                .collect(),
        });
    }
    TreeNode { label, children }
}

fn list_node(label: &str, entries: &[Dependency]) -> TreeNode {
    TreeNode {
        label: label.to_string(),
        children: entries
            .iter()
            .map(|e| TreeNode {
                label: e.to_string(),
                children: vec![],
            })
            .collect(),
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
