//! # Cauldron
//!
//! This library provides a Cauldron: a versioned, transactional store for the
//! release metadata of native applications. Each native application has
//! platforms (android, ios), each platform has versions, and each version
//! tracks its native dependencies, the mini-apps baked into its container,
//! the mini-apps shipped over the air, and its binary.
//!
//! The whole store lives in a single git repository shared by every machine
//! that works on the Cauldron.
//!
//! ## Quick Example
//!
//! ```
//! use cauldron::cauldron::Cauldron;
//! use cauldron::descriptor::NativeApplicationDescriptor;
//! use cauldron::memory::{InMemoryGitOperations, InMemoryRemote};
//! use cauldron::repository::{StoreSettings, VersionedRepository};
//!
//! # fn main() -> cauldron::error::Result<()> {
//! # let temp_dir = tempfile::TempDir::new()?;
//! let settings = StoreSettings {
//!     repository: "memory://cauldron".to_string(),
//!     branch: "master".to_string(),
//!     path: temp_dir.path().join("cauldron"),
//! };
//! let git = InMemoryGitOperations::new(InMemoryRemote::new());
//! let mut cauldron = Cauldron::new(VersionedRepository::with_operations(&settings, Box::new(git))?);
//!
//! let descriptor: NativeApplicationDescriptor = "MyApp:android:1.0.0".parse()?;
//! cauldron.with_transaction("Add MyApp:android:1.0.0", |c| c.add_native_app(&descriptor, "10"))?;
//!
//! assert_eq!(cauldron.get_native_applications()?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! - **Versioned repository (`repository`, `git`)**: the local working copy of
//!   the Cauldron remote, synced once per session, with begin/commit/discard
//!   transactions (`transaction`).
//! - **Schema (`schema`, `dependency`, `descriptor`)**: typed records for the
//!   hierarchy, validated before every write.
//! - **Document (`document`)**: the `cauldron.json` file holding the hierarchy.
//! - **Blob stores (`blob`)**: binaries and source maps, stored next to the
//!   document but committed on their own.
//! - **Facade (`cauldron`)**: the data access API used by the CLI.
//! - **In-memory backend (`memory`, `filesystem`)**: git emulation for tests
//!   and embedders without a git binary.

pub mod blob;
pub mod cauldron;
pub mod config;
pub mod defaults;
pub mod dependency;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod manifest;
pub mod memory;
pub mod output;
pub mod repository;
pub mod schema;
pub mod transaction;

#[cfg(test)]
mod dependency_proptest;
