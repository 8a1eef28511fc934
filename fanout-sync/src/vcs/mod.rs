//! Version-control capability boundary.
//!
//! The engine never shells out directly; it talks to a [`Vcs`]. Production
//! runs use [`GitCli`], tests use [`MemoryVcs`].

mod git;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use fanout_core::Hash;

pub use git::GitCli;
pub use memory::{MemoryVcs, PushRecord};

/// A failed version-control invocation.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// The git binary could not be started at all.
    #[error("failed to run git {args}: {reason}")]
    Spawn { args: String, reason: String },

    /// git ran and exited non-zero.
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    /// git succeeded but printed something we cannot interpret.
    #[error("unexpected output from git {args}: {output}")]
    Parse { args: String, output: String },
}

/// Operations the sync engine needs from a repository.
///
/// `remote` arguments accept either a configured remote name or a URL.
/// Only [`Vcs::push`] and [`Vcs::force_push`] mutate a remote;
/// [`Vcs::pull_rebase`] mutates the local repository only.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the working directory is a git work tree.
    async fn is_repository(&self) -> bool;

    /// Names of all configured remotes.
    async fn remotes(&self) -> Result<Vec<String>, VcsError>;

    /// The checked-out branch.
    async fn current_branch(&self) -> Result<String, VcsError>;

    /// Commit the local `branch` points to.
    async fn local_ref(&self, branch: &str) -> Result<Hash, VcsError>;

    /// Subject line of `commit`.
    async fn commit_subject(&self, commit: &Hash) -> Result<String, VcsError>;

    /// Commit `branch` points to on `remote`; `Ok(None)` if the branch is absent.
    async fn remote_ref(&self, remote: &str, branch: &str) -> Result<Option<Hash>, VcsError>;

    /// Regular (fast-forward) update of `branch` on `remote`.
    async fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;

    /// Overwrite `branch` on `remote` regardless of its history.
    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;

    /// Rebase the local `branch` onto `source`'s copy of it.
    async fn pull_rebase(&self, source: &str, branch: &str) -> Result<(), VcsError>;
}
