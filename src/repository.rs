//! # Versioned Repository
//!
//! This module provides `VersionedRepository`, the local working copy of the
//! single remote git repository that holds a Cauldron. It offers the
//! primitives the rest of the store is built on (sync, commit, push) and
//! implements the begin/commit/discard transaction protocol.
//!
//! ## Design
//!
//! Git access goes through the **`GitOperations`** trait. In the application,
//! `DefaultGitOperations` wraps the system `git` command (see [`crate::git`]).
//! Tests and embedders can swap in another implementation, such as
//! [`crate::memory::InMemoryGitOperations`], to run without git or a network.
//!
//! ## Sync policy
//!
//! The working copy is synchronized with the remote at most once per session
//! (one `VersionedRepository` value). Syncing is skipped while a transaction
//! is pending. Changes pushed by others after the sync are not seen until a
//! new session starts, or until a failed push invalidates the sync.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::Result;
use crate::transaction::{CommitMessage, TransactionState, Transactional};

/// Name under which the Cauldron remote is registered in the working copy.
pub const GIT_REMOTE_NAME: &str = "upstream";

/// Placeholder written by the initial commit of an empty Cauldron.
pub const README_FILE: &str = "README.md";
const README: &str = "### Cauldron Repository";

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Whether `dir` already holds a working copy.
    fn is_repository(&self, dir: &Path) -> bool;

    /// Create a new working copy whose unborn HEAD points at `branch`.
    fn init(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Register `url` as the remote `name`, replacing any previous URL.
    fn set_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()>;

    /// Whether the remote has any branch at all.
    fn remote_has_heads(&self, dir: &Path, remote: &str) -> Result<bool>;

    /// Fetch all refs from the remote.
    fn fetch_all(&self, dir: &Path) -> Result<()>;

    /// Reset the working copy to `target` (or to the local `HEAD` when `None`),
    /// dropping untracked files.
    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()>;

    /// Whether the working copy differs from the local `HEAD`.
    fn has_changes(&self, dir: &Path) -> Result<bool>;

    /// Commit every change in the working copy.
    fn commit_all(&self, dir: &Path, message: &str) -> Result<()>;

    /// Commit only the given paths (relative to `dir`).
    fn commit_paths(&self, dir: &Path, paths: &[&Path], message: &str) -> Result<()>;

    /// Push the local branch to the remote.
    fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn is_repository(&self, dir: &Path) -> bool {
        crate::git::is_repository(dir)
    }

    fn init(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::init(dir, branch)
    }

    fn set_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()> {
        crate::git::set_remote(dir, name, url)
    }

    fn remote_has_heads(&self, dir: &Path, remote: &str) -> Result<bool> {
        crate::git::remote_has_heads(dir, remote)
    }

    fn fetch_all(&self, dir: &Path) -> Result<()> {
        crate::git::fetch_all(dir)
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()> {
        crate::git::reset_hard(dir, target)
    }

    fn has_changes(&self, dir: &Path) -> Result<bool> {
        crate::git::has_changes(dir)
    }

    fn commit_all(&self, dir: &Path, message: &str) -> Result<()> {
        crate::git::commit_all(dir, message)
    }

    fn commit_paths(&self, dir: &Path, paths: &[&Path], message: &str) -> Result<()> {
        crate::git::commit_paths(dir, paths, message)
    }

    fn push(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        crate::git::push(dir, remote, branch)
    }
}

/// Where a Cauldron lives: remote URL, branch, and local working copy path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// URL (or path) of the remote git repository.
    pub repository: String,
    /// Branch holding the Cauldron.
    pub branch: String,
    /// Local working copy, owned exclusively by one store instance.
    pub path: PathBuf,
}

/// Local working copy of a Cauldron's remote repository.
pub struct VersionedRepository {
    path: PathBuf,
    repository: String,
    branch: String,
    git_ops: Box<dyn GitOperations>,
    state: TransactionState,
}

impl VersionedRepository {
    /// Creates a repository handle backed by the system `git` command.
    ///
    /// The working copy directory is created if needed; nothing is fetched
    /// until the first sync.
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        Self::with_operations(settings, Box::new(DefaultGitOperations))
    }

    /// Creates a repository handle with a custom `GitOperations`
    /// implementation.
    pub fn with_operations(
        settings: &StoreSettings,
        git_ops: Box<dyn GitOperations>,
    ) -> Result<Self> {
        fs::create_dir_all(&settings.path)?;
        Ok(Self {
            path: settings.path.clone(),
            repository: settings.repository.clone(),
            branch: settings.branch.clone(),
            git_ops,
            state: TransactionState::new(),
        })
    }

    /// Root of the local working copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn is_synced(&self) -> bool {
        self.state.is_synced()
    }

    /// Brings the working copy in line with the remote branch tip.
    ///
    /// No-op while a transaction is pending or once this session has synced.
    /// A fresh remote gets an initial commit; otherwise the working copy is
    /// hard-reset to the remote branch, discarding any local divergence.
    pub fn sync(&mut self) -> Result<()> {
        if self.state.is_pending() || self.state.is_synced() {
            return Ok(());
        }

        debug!("[repository] Syncing {}", self.path.display());

        if !self.git_ops.is_repository(&self.path) {
            debug!("[repository] New local git repository creation");
            self.git_ops.init(&self.path, &self.branch)?;
        }
        self.git_ops
            .set_remote(&self.path, GIT_REMOTE_NAME, &self.repository)?;

        if self
            .git_ops
            .remote_has_heads(&self.path, GIT_REMOTE_NAME)?
        {
            debug!(
                "[repository] Fetching from {} {}",
                GIT_REMOTE_NAME, self.branch
            );
            self.git_ops.fetch_all(&self.path)?;
            let target = format!("{}/{}", GIT_REMOTE_NAME, self.branch);
            self.git_ops.reset_hard(&self.path, Some(&target))?;
        } else {
            self.initial_commit()?;
        }

        self.state.mark_synced();
        Ok(())
    }

    fn initial_commit(&self) -> Result<()> {
        let readme = self.path.join(README_FILE);
        if readme.exists() {
            return Ok(());
        }
        info!("[repository] Performing initial commit in {}", self.repository);
        fs::write(&readme, README)?;
        self.git_ops
            .commit_paths(&self.path, &[Path::new(README_FILE)], "First Commit!")?;
        self.push()
    }

    fn push(&self) -> Result<()> {
        self.git_ops
            .push(&self.path, GIT_REMOTE_NAME, &self.branch)
    }

    /// Push, forgetting the sync on failure so the next sync resets the
    /// working copy to whatever the remote holds now.
    fn push_or_invalidate(&mut self) -> Result<()> {
        self.push().map_err(|e| {
            self.state.invalidate_sync();
            e
        })
    }

    /// Commit only `paths` and push them, independently of any pending
    /// transaction.
    pub fn publish_paths(&mut self, paths: &[&Path], message: &str) -> Result<()> {
        self.git_ops.commit_paths(&self.path, paths, message)?;
        if let Err(e) = self.push_or_invalidate() {
            warn!("[repository] Push of '{}' failed: {}", message, e);
            return Err(e);
        }
        Ok(())
    }
}

impl Transactional for VersionedRepository {
    fn begin_transaction(&mut self) -> Result<()> {
        if self.state.is_pending() {
            // Report the state error before touching the remote.
            return self.state.open();
        }
        self.sync()?;
        self.state.open()
    }

    fn discard_transaction(&mut self) -> Result<()> {
        self.state.ensure_pending("discard")?;
        self.git_ops.reset_hard(&self.path, None)?;
        self.state.close();
        Ok(())
    }

    fn commit_transaction(&mut self, message: CommitMessage) -> Result<()> {
        self.state.ensure_pending("commit")?;

        if self.git_ops.has_changes(&self.path)? {
            self.git_ops
                .commit_all(&self.path, &message.to_string())?;
        } else {
            debug!("[repository] Nothing to commit");
        }

        if let Err(e) = self.push_or_invalidate() {
            warn!("[repository] Push failed, transaction is still pending: {}", e);
            return Err(e);
        }

        self.state.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Mock git operations recording every call
    #[derive(Default)]
    struct MockGitOperations {
        calls: Arc<Mutex<Vec<String>>>,
        is_repository: bool,
        remote_has_heads: bool,
        has_changes: bool,
        fail_push: bool,
    }

    impl MockGitOperations {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl GitOperations for MockGitOperations {
        fn is_repository(&self, _dir: &Path) -> bool {
            self.is_repository
        }

        fn init(&self, _dir: &Path, branch: &str) -> Result<()> {
            self.record(format!("init {}", branch));
            Ok(())
        }

        fn set_remote(&self, _dir: &Path, name: &str, url: &str) -> Result<()> {
            self.record(format!("set_remote {} {}", name, url));
            Ok(())
        }

        fn remote_has_heads(&self, _dir: &Path, _remote: &str) -> Result<bool> {
            Ok(self.remote_has_heads)
        }

        fn fetch_all(&self, _dir: &Path) -> Result<()> {
            self.record("fetch_all");
            Ok(())
        }

        fn reset_hard(&self, _dir: &Path, target: Option<&str>) -> Result<()> {
            self.record(format!("reset_hard {}", target.unwrap_or("HEAD")));
            Ok(())
        }

        fn has_changes(&self, _dir: &Path) -> Result<bool> {
            Ok(self.has_changes)
        }

        fn commit_all(&self, _dir: &Path, message: &str) -> Result<()> {
            self.record(format!("commit_all {}", message));
            Ok(())
        }

        fn commit_paths(&self, _dir: &Path, paths: &[&Path], message: &str) -> Result<()> {
            let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            self.record(format!("commit_paths {} {}", paths.join(","), message));
            Ok(())
        }

        fn push(&self, _dir: &Path, remote: &str, branch: &str) -> Result<()> {
            self.record(format!("push {} {}", remote, branch));
            if self.fail_push {
                Err(Error::StoreTransport {
                    command: "git push".to_string(),
                    stderr: "! [rejected] (fetch first)".to_string(),
                    hint: None,
                })
            } else {
                Ok(())
            }
        }
    }

    fn settings(dir: &TempDir) -> StoreSettings {
        StoreSettings {
            repository: "git@example.com:org/cauldron.git".to_string(),
            branch: "master".to_string(),
            path: dir.path().join("cauldron"),
        }
    }

    fn repository(dir: &TempDir, mock: MockGitOperations) -> VersionedRepository {
        VersionedRepository::with_operations(&settings(dir), Box::new(mock)).unwrap()
    }

    #[test]
    fn test_new_creates_working_copy_directory() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repository(&temp_dir, MockGitOperations::default());
        assert!(repo.path().is_dir());
        assert_eq!(repo.branch(), "master");
        assert!(!repo.is_pending());
        assert!(!repo.is_synced());
    }

    #[test]
    fn test_sync_on_empty_remote_performs_initial_commit() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations::default();
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.sync().unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "init master".to_string(),
                "set_remote upstream git@example.com:org/cauldron.git".to_string(),
                "commit_paths README.md First Commit!".to_string(),
                "push upstream master".to_string(),
            ]
        );
        assert!(repo.path().join(README_FILE).exists());
        assert!(repo.is_synced());
    }

    #[test]
    fn test_sync_with_existing_remote_fetches_and_resets() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.sync().unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "set_remote upstream git@example.com:org/cauldron.git".to_string(),
                "fetch_all".to_string(),
                "reset_hard upstream/master".to_string(),
            ]
        );
    }

    #[test]
    fn test_sync_happens_once_per_session() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.sync().unwrap();
        repo.sync().unwrap();
        repo.begin_transaction().unwrap();

        let fetches = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == "fetch_all")
            .count();
        assert_eq!(fetches, 1);
    }

    #[test]
    fn test_begin_twice_fails_without_syncing_again() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = repository(&temp_dir, MockGitOperations::default());

        repo.begin_transaction().unwrap();
        let err = repo.begin_transaction().unwrap_err();
        assert!(matches!(err, Error::IllegalTransactionState { .. }));
        assert!(repo.is_pending());
    }

    #[test]
    fn test_commit_and_discard_require_pending_transaction() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = repository(&temp_dir, MockGitOperations::default());

        let err = repo.commit_transaction("message".into()).unwrap_err();
        assert!(matches!(err, Error::IllegalTransactionState { .. }));

        let err = repo.discard_transaction().unwrap_err();
        assert!(matches!(err, Error::IllegalTransactionState { .. }));
    }

    #[test]
    fn test_commit_commits_changes_and_pushes() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            has_changes: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.begin_transaction().unwrap();
        repo.commit_transaction(vec!["line one".to_string(), "line two".to_string()].into())
            .unwrap();

        let calls = calls.lock().unwrap();
        assert!(calls.contains(&"commit_all line one\nline two".to_string()));
        assert_eq!(calls.last().unwrap(), "push upstream master");
        assert!(!repo.is_pending());
    }

    #[test]
    fn test_commit_without_changes_still_pushes() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.begin_transaction().unwrap();
        repo.commit_transaction("nothing".into()).unwrap();

        let calls = calls.lock().unwrap();
        assert!(!calls.iter().any(|c| c.starts_with("commit_all")));
        assert_eq!(calls.last().unwrap(), "push upstream master");
    }

    #[test]
    fn test_failed_push_keeps_transaction_pending_and_invalidates_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            has_changes: true,
            fail_push: true,
            ..Default::default()
        };
        let mut repo = repository(&temp_dir, mock);

        repo.begin_transaction().unwrap();
        let err = repo.commit_transaction("change".into()).unwrap_err();
        assert!(matches!(err, Error::StoreTransport { .. }));
        assert!(repo.is_pending());
        assert!(!repo.is_synced());

        repo.discard_transaction().unwrap();
        assert!(!repo.is_pending());
    }

    #[test]
    fn test_discard_resets_to_local_head() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.begin_transaction().unwrap();
        repo.discard_transaction().unwrap();

        assert_eq!(calls.lock().unwrap().last().unwrap(), "reset_hard HEAD");
        assert!(!repo.is_pending());
    }

    #[test]
    fn test_failed_publish_forces_a_fresh_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mock = MockGitOperations {
            is_repository: true,
            remote_has_heads: true,
            fail_push: true,
            ..Default::default()
        };
        let calls = mock.calls.clone();
        let mut repo = repository(&temp_dir, mock);

        repo.sync().unwrap();
        let err = repo
            .publish_paths(&[Path::new("binaries/app")], "Add binary")
            .unwrap_err();
        assert!(matches!(err, Error::StoreTransport { .. }));
        assert!(!repo.is_synced());

        calls.lock().unwrap().clear();
        repo.sync().unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "set_remote upstream git@example.com:org/cauldron.git".to_string(),
                "fetch_all".to_string(),
                "reset_hard upstream/master".to_string(),
            ]
        );
    }
}
