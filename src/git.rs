//! Thin wrappers around the system `git` binary.
//!
//! Every function runs one or two git commands inside a working copy and maps
//! failures to [`Error::StoreTransport`]. Using the system git means SSH keys,
//! credential helpers and anything configured in `~/.gitconfig` work without
//! extra setup.

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// Run `git <args>` in `dir` and return its stdout.
fn run(dir: &Path, args: &[&str]) -> Result<String> {
    let command = format!("git {}", args.join(" "));
    debug!("[git] {} (in {})", command, dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::StoreTransport {
            command: command.clone(),
            stderr: e.to_string(),
            hint: Some("Make sure git is installed and available on PATH".to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let hint = hint_for(&stderr);
        return Err(Error::StoreTransport {
            command,
            stderr,
            hint,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Suggest a recovery for well-known git failures.
fn hint_for(stderr: &str) -> Option<String> {
    if stderr.contains("non-fast-forward")
        || stderr.contains("[rejected]")
        || stderr.contains("fetch first")
    {
        Some(
            "The remote Cauldron moved ahead. Discard the transaction and run the command again"
                .to_string(),
        )
    } else if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "Make sure you have access to the Cauldron repository (SSH key, credentials or token)"
                .to_string(),
        )
    } else if stderr.contains("Please tell me who you are") {
        Some("Configure git user.name and user.email".to_string())
    } else {
        None
    }
}

/// Check whether `dir` holds a git working copy.
pub fn is_repository(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Initialize a repository whose unborn HEAD points at `branch`.
pub fn init(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["init", "--quiet"])?;
    let head = format!("refs/heads/{}", branch);
    run(dir, &["symbolic-ref", "HEAD", &head])?;
    Ok(())
}

/// Point the remote `name` at `url`, adding it if it is not registered yet.
pub fn set_remote(dir: &Path, name: &str, url: &str) -> Result<()> {
    let remotes = run(dir, &["remote"])?;
    if remotes.lines().any(|r| r.trim() == name) {
        run(dir, &["remote", "set-url", name, url])?;
    } else {
        run(dir, &["remote", "add", name, url])?;
    }
    Ok(())
}

/// Returns `true` if the remote has at least one branch.
pub fn remote_has_heads(dir: &Path, remote: &str) -> Result<bool> {
    let heads = run(dir, &["ls-remote", "--heads", remote])?;
    Ok(!heads.trim().is_empty())
}

/// Fetch all refs from all remotes.
pub fn fetch_all(dir: &Path) -> Result<()> {
    run(dir, &["fetch", "--all", "--quiet"])?;
    Ok(())
}

/// Hard-reset the working copy to `target` (or to `HEAD`) and drop untracked
/// files.
pub fn reset_hard(dir: &Path, target: Option<&str>) -> Result<()> {
    match target {
        Some(target) => run(dir, &["reset", "--hard", "--quiet", target])?,
        None => run(dir, &["reset", "--hard", "--quiet"])?,
    };
    run(dir, &["clean", "-fd", "--quiet"])?;
    Ok(())
}

/// Returns `true` if the working copy differs from `HEAD`, untracked files
/// included.
pub fn has_changes(dir: &Path) -> Result<bool> {
    let status = run(dir, &["status", "--porcelain"])?;
    Ok(!status.trim().is_empty())
}

/// Stage every change in the working copy and commit it.
pub fn commit_all(dir: &Path, message: &str) -> Result<()> {
    run(dir, &["add", "--all"])?;
    run(dir, &["commit", "--quiet", "-m", message])?;
    Ok(())
}

/// Commit only `paths`, leaving any other change in the working copy alone.
pub fn commit_paths(dir: &Path, paths: &[&Path], message: &str) -> Result<()> {
    let paths: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();

    let mut add = vec!["add", "--all", "--"];
    add.extend(paths.iter().map(String::as_str));
    run(dir, &add)?;

    let mut commit = vec!["commit", "--quiet", "-m", message, "--only", "--"];
    commit.extend(paths.iter().map(String::as_str));
    run(dir, &commit)?;
    Ok(())
}

/// Push the local `branch` to `remote`.
pub fn push(dir: &Path, remote: &str, branch: &str) -> Result<()> {
    let refspec = format!("HEAD:refs/heads/{}", branch);
    run(dir, &["push", "--quiet", remote, &refspec])?;
    Ok(())
}
