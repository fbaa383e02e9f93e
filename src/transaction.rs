//! # Transactional Sessions
//!
//! A store instance moves between two states:
//!
//! ```text
//!   Idle --begin--> Pending --commit--> Idle
//!                      |
//!                      +----discard---> Idle
//! ```
//!
//! Beginning a transaction while one is pending, or committing/discarding
//! while none is, fails with `Error::IllegalTransactionState`. The session
//! also remembers whether the working copy was synchronized with the remote,
//! since synchronization happens at most once per session.

use std::fmt;

use crate::error::{Error, Result};

/// Ephemeral session state attached to a store instance. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionState {
    pending: bool,
    synced: bool,
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Idle -> Pending
    pub fn open(&mut self) -> Result<()> {
        if self.pending {
            return Err(Error::IllegalTransactionState {
                message: "A transaction is already pending".to_string(),
            });
        }
        self.pending = true;
        Ok(())
    }

    /// Fails unless a transaction is pending. `action` is `"commit"` or
    /// `"discard"`.
    pub fn ensure_pending(&self, action: &str) -> Result<()> {
        if !self.pending {
            return Err(Error::IllegalTransactionState {
                message: format!("No pending transaction to {}", action),
            });
        }
        Ok(())
    }

    /// Pending -> Idle
    pub fn close(&mut self) {
        self.pending = false;
    }

    pub fn mark_synced(&mut self) {
        self.synced = true;
    }

    /// Forget the sync so the next session fetches from the remote again.
    pub fn invalidate_sync(&mut self) {
        self.synced = false;
    }
}

/// A commit message given either as one string or as ordered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitMessage {
    Single(String),
    Lines(Vec<String>),
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMessage::Single(message) => f.write_str(message),
            CommitMessage::Lines(lines) => f.write_str(&lines.join("\n")),
        }
    }
}

impl From<&str> for CommitMessage {
    fn from(message: &str) -> Self {
        CommitMessage::Single(message.to_string())
    }
}

impl From<String> for CommitMessage {
    fn from(message: String) -> Self {
        CommitMessage::Single(message)
    }
}

impl From<Vec<String>> for CommitMessage {
    fn from(lines: Vec<String>) -> Self {
        CommitMessage::Lines(lines)
    }
}

impl From<&[&str]> for CommitMessage {
    fn from(lines: &[&str]) -> Self {
        CommitMessage::Lines(lines.iter().map(|l| l.to_string()).collect())
    }
}

/// Begin/commit/discard protocol implemented by versioned stores.
pub trait Transactional {
    /// Synchronize with the remote (once per session) and open a transaction.
    fn begin_transaction(&mut self) -> Result<()>;

    /// Drop every uncommitted change in the working copy.
    fn discard_transaction(&mut self) -> Result<()>;

    /// Commit all working-copy changes and push them upstream.
    ///
    /// If the push fails the transaction stays pending: the caller may call
    /// this again to retry the push, or discard.
    fn commit_transaction(&mut self, message: CommitMessage) -> Result<()>;
}
