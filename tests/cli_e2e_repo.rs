//! End-to-end tests for the `cauldron repo` command and global CLI behavior.
//!
//! These tests only touch the CLI configuration file and never contact a
//! Cauldron repository.

mod common;

use common::prelude::*;

#[test]
fn test_help_lists_commands() {
    TestFixture::new()
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("repo"))
        .stdout(predicate::str::contains("manifest"));
}

#[test]
fn test_version_flag() {
    TestFixture::new()
        .command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cauldron"));
}

#[test]
fn test_repo_add_creates_config() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["repo", "add", "default", "/srv/git/cauldron.git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Cauldron repository default"))
        .stdout(predicate::str::contains("default is now the repository in use"));

    fixture
        .child("config.yaml")
        .assert(predicate::str::contains("repositoryInUse: default"));
}

#[test]
fn test_repo_use_and_list() {
    let fixture = TestFixture::new().with_repository("prod", "/srv/git/prod.git");

    fixture
        .command()
        .args(["repo", "add", "qa", "/srv/git/qa.git"])
        .assert()
        .success();

    fixture
        .command()
        .args(["repo", "use", "qa"])
        .assert()
        .success();

    fixture
        .command()
        .args(["repo", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  prod /srv/git/prod.git"))
        .stdout(predicate::str::contains("* qa /srv/git/qa.git"));

    fixture
        .command()
        .args(["repo", "current"])
        .assert()
        .success()
        .stdout("qa /srv/git/qa.git\n");
}

#[test]
fn test_repo_use_unknown_alias() {
    TestFixture::new()
        .with_repository("prod", "/srv/git/prod.git")
        .command()
        .args(["repo", "use", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No Cauldron repository is registered as staging",
        ));
}

#[test]
fn test_repo_add_duplicate_alias() {
    TestFixture::new()
        .with_repository("prod", "/srv/git/prod.git")
        .command()
        .args(["repo", "add", "prod", "/srv/git/other.git"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already exists"));
}

#[test]
fn test_commands_require_repository_in_use() {
    TestFixture::new()
        .command()
        .args(["get", "nativeapp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Cauldron repository in use"));
}

#[test]
fn test_invalid_descriptor_is_rejected_before_sync() {
    TestFixture::new()
        .with_repository("prod", "/nonexistent/cauldron.git")
        .command()
        .args(["update", "release", "MyApp:windows:1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("windows"));
}
