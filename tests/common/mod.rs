//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_repository("default", "/srv/cauldron.git");
//!     fixture.command().args(["repo", "current"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

use cauldron::cauldron::Cauldron;
use cauldron::descriptor::NativeApplicationDescriptor;
use cauldron::dependency::Dependency;
use cauldron::memory::{InMemoryGitOperations, InMemoryRemote};
use cauldron::repository::{StoreSettings, VersionedRepository};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{dep, descriptor, git_available, init_bare_remote, memory_cauldron};
    pub use super::TestFixture;
}

/// Name of the CLI configuration file inside a fixture.
pub const CONFIG_FILE: &str = "config.yaml";

#[allow(dead_code)]
pub fn descriptor(s: &str) -> NativeApplicationDescriptor {
    s.parse().expect("valid descriptor")
}

#[allow(dead_code)]
pub fn dep(s: &str) -> Dependency {
    s.parse().expect("valid dependency")
}

/// A Cauldron over `remote` whose working copy lives in `dir/name`.
///
/// Two Cauldrons sharing one remote behave like two machines working on the
/// same Cauldron repository.
#[allow(dead_code)]
pub fn memory_cauldron(dir: &Path, name: &str, remote: &InMemoryRemote) -> Cauldron {
    let settings = StoreSettings {
        repository: "memory://cauldron".to_string(),
        branch: "master".to_string(),
        path: dir.join(name),
    };
    let repo = VersionedRepository::with_operations(
        &settings,
        Box::new(InMemoryGitOperations::new(remote.clone())),
    )
    .expect("Failed to create working copy");
    Cauldron::new(repo)
}

/// Whether a `git` binary can be run.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create an empty bare repository at `path` to act as the Cauldron remote.
#[allow(dead_code)]
pub fn init_bare_remote(path: &Path) {
    std::fs::create_dir_all(path).expect("Failed to create remote directory");
    let status = Command::new("git")
        .args(["init", "--bare", "--quiet"])
        .current_dir(path)
        .status()
        .expect("Failed to run git init --bare");
    assert!(status.success(), "git init --bare failed");
}

/// A test fixture holding a CLI configuration and a directory for local
/// Cauldron working copies.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_repository("default", "/srv/cauldron.git");
///
/// fixture
///     .command()
///     .args(["repo", "list"])
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the CLI configuration file with the given content.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(CONFIG_FILE)
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Register `url` as the repository in use under `alias`.
    #[allow(dead_code)]
    pub fn with_repository(self, alias: &str, url: &str) -> Self {
        let content = format!(
            "repositories:\n  {alias}: {url}\nrepositoryInUse: {alias}\nbranch: master\n",
            alias = alias,
            url = url
        );
        self.with_config(&content)
    }

    /// Create a bare git repository inside the fixture and register it as
    /// the repository in use.
    #[allow(dead_code)]
    pub fn with_bare_remote(self, alias: &str) -> Self {
        let remote = self.path().join("remote.git");
        init_bare_remote(&remote);
        let url = remote.display().to_string();
        self.with_repository(alias, &url)
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(CONFIG_FILE)
    }

    /// Directory holding the local working copies.
    pub fn cauldron_root(&self) -> PathBuf {
        self.temp_dir.path().join("cauldrons")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command for the cauldron binary, pointed at this fixture's
    /// configuration and working copies, with a git identity for commits.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cauldron");
        cmd.current_dir(self.path())
            .env("CAULDRON_CONFIG", self.config_path())
            .env("CAULDRON_ROOT", self.cauldron_root())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env("GIT_AUTHOR_NAME", "Cauldron Test")
            .env("GIT_AUTHOR_EMAIL", "cauldron@example.com")
            .env("GIT_COMMITTER_NAME", "Cauldron Test")
            .env("GIT_COMMITTER_EMAIL", "cauldron@example.com");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_repository_is_valid_config() {
        let fixture = TestFixture::new().with_repository("default", "/srv/cauldron.git");
        let config = cauldron::config::from_file(&fixture.config_path()).unwrap();
        assert_eq!(
            config.current().unwrap(),
            ("default", "/srv/cauldron.git")
        );
    }
}
