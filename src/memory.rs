//! In-memory git backend.
//!
//! `InMemoryGitOperations` implements [`GitOperations`] without a git binary
//! or a network. Commits are [`MemoryFS`] snapshots of the working directory,
//! and the remote is an [`InMemoryRemote`] that several backends can share to
//! play the part of several machines pushing to one Cauldron.
//!
//! The remote keeps a generation counter that increases on every accepted
//! push. A push is rejected as non-fast-forward when the pusher's last known
//! generation is behind the remote's, which is the same race the real remote
//! reports.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::filesystem::{restore_dir, snapshot_dir, MemoryFS};
use crate::repository::GitOperations;

fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| Error::LockPoisoned {
        context: context.to_string(),
    })
}

#[derive(Debug, Default)]
struct RemoteState {
    tip: Option<MemoryFS>,
    generation: u64,
    pushes: usize,
}

/// A remote branch held in memory. Clones share the same branch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current branch tip, if anything has been pushed.
    pub fn tip(&self) -> Result<Option<MemoryFS>> {
        Ok(lock(&self.state, "in-memory remote")?.tip.clone())
    }

    /// Number of accepted pushes.
    pub fn push_count(&self) -> Result<usize> {
        Ok(lock(&self.state, "in-memory remote")?.pushes)
    }
}

#[derive(Debug, Default)]
struct LocalState {
    initialized: bool,
    remote_url: Option<String>,
    head: Option<MemoryFS>,
    fetched: Option<(u64, MemoryFS)>,
    base_generation: u64,
}

/// [`GitOperations`] over an [`InMemoryRemote`].
pub struct InMemoryGitOperations {
    remote: InMemoryRemote,
    local: Mutex<LocalState>,
}

impl InMemoryGitOperations {
    pub fn new(remote: InMemoryRemote) -> Self {
        Self {
            remote,
            local: Mutex::new(LocalState::default()),
        }
    }

    /// URL registered for the remote, if any.
    pub fn remote_url(&self) -> Result<Option<String>> {
        Ok(lock(&self.local, "in-memory working copy")?.remote_url.clone())
    }
}

impl GitOperations for InMemoryGitOperations {
    fn is_repository(&self, _dir: &Path) -> bool {
        self.local
            .lock()
            .map(|local| local.initialized)
            .unwrap_or(false)
    }

    fn init(&self, _dir: &Path, _branch: &str) -> Result<()> {
        let mut local = lock(&self.local, "in-memory working copy")?;
        local.initialized = true;
        Ok(())
    }

    fn set_remote(&self, _dir: &Path, _name: &str, url: &str) -> Result<()> {
        let mut local = lock(&self.local, "in-memory working copy")?;
        local.remote_url = Some(url.to_string());
        Ok(())
    }

    fn remote_has_heads(&self, _dir: &Path, _remote: &str) -> Result<bool> {
        Ok(lock(&self.remote.state, "in-memory remote")?.tip.is_some())
    }

    fn fetch_all(&self, _dir: &Path) -> Result<()> {
        let (generation, tip) = {
            let remote = lock(&self.remote.state, "in-memory remote")?;
            (remote.generation, remote.tip.clone())
        };
        let mut local = lock(&self.local, "in-memory working copy")?;
        local.fetched = tip.map(|tip| (generation, tip));
        Ok(())
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()> {
        let mut local = lock(&self.local, "in-memory working copy")?;
        match target {
            Some(target) => {
                let (generation, fetched) =
                    local.fetched.clone().ok_or_else(|| Error::StoreTransport {
                        command: format!("git reset --hard {}", target),
                        stderr: format!("unknown revision '{}'", target),
                        hint: None,
                    })?;
                restore_dir(dir, &fetched)?;
                local.head = Some(fetched);
                local.base_generation = generation;
            }
            None => {
                let head = local.head.clone().unwrap_or_default();
                restore_dir(dir, &head)?;
            }
        }
        Ok(())
    }

    fn has_changes(&self, dir: &Path) -> Result<bool> {
        let local = lock(&self.local, "in-memory working copy")?;
        let head = local.head.clone().unwrap_or_default();
        Ok(snapshot_dir(dir)? != head)
    }

    fn commit_all(&self, dir: &Path, _message: &str) -> Result<()> {
        let snapshot = snapshot_dir(dir)?;
        let mut local = lock(&self.local, "in-memory working copy")?;
        if local.head.as_ref() == Some(&snapshot) {
            return Err(Error::StoreTransport {
                command: "git commit".to_string(),
                stderr: "nothing to commit, working tree clean".to_string(),
                hint: None,
            });
        }
        local.head = Some(snapshot);
        Ok(())
    }

    fn commit_paths(&self, dir: &Path, paths: &[&Path], _message: &str) -> Result<()> {
        let working = snapshot_dir(dir)?;
        let mut local = lock(&self.local, "in-memory working copy")?;
        let mut head = local.head.clone().unwrap_or_default();
        for path in paths {
            match working.get_file(path) {
                Some(file) => head.add_file(path, file.clone()),
                None => {
                    head.remove_file(path);
                }
            }
        }
        local.head = Some(head);
        Ok(())
    }

    fn push(&self, _dir: &Path, remote_name: &str, branch: &str) -> Result<()> {
        let mut local = lock(&self.local, "in-memory working copy")?;
        let mut remote = lock(&self.remote.state, "in-memory remote")?;
        let command = format!("git push {} HEAD:refs/heads/{}", remote_name, branch);

        let head = local.head.clone().ok_or_else(|| Error::StoreTransport {
            command: command.clone(),
            stderr: "src refspec HEAD does not match any".to_string(),
            hint: None,
        })?;

        if remote.tip.is_some() && remote.generation != local.base_generation {
            return Err(Error::StoreTransport {
                command,
                stderr: format!(
                    "! [rejected] HEAD -> {} (fetch first): non-fast-forward",
                    branch
                ),
                hint: Some(
                    "The remote Cauldron moved ahead. Discard the transaction and run the command again"
                        .to_string(),
                ),
            });
        }

        if remote.tip.as_ref() != Some(&head) {
            remote.generation += 1;
            remote.tip = Some(head);
            remote.pushes += 1;
        }
        local.base_generation = remote.generation;
        Ok(())
    }
}
