//! External reference checker.
//!
//! Externally-owned repositories are read authority only: the checker can
//! look at the external branch and rebase a local clone onto it, and it has
//! no path that pushes. It runs outside the fan-out loop and its results
//! never count toward the run's failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fanout_core::{ExternalRepo, ExternalStatus, Hash, Mode};

use crate::prober::{probe, Probe};
use crate::vcs::{GitCli, Vcs};

/// An external repository paired with its local clone, if one is present.
#[derive(Clone)]
pub struct ExternalTarget {
    pub repo: ExternalRepo,
    pub local_clone: Option<Arc<dyn Vcs>>,
}

impl std::fmt::Debug for ExternalTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalTarget")
            .field("repo", &self.repo)
            .field("local_clone", &self.local_clone.is_some())
            .finish()
    }
}

impl ExternalTarget {
    /// Resolve the configured clone path against `repo_root` and open it
    /// with [`GitCli`] when the directory exists.
    pub fn resolve(repo_root: &Path, repo: &ExternalRepo) -> Self {
        let local_clone = repo
            .clone
            .as_ref()
            .map(|p| clone_path(repo_root, p))
            .filter(|p| p.is_dir())
            .map(|p| Arc::new(GitCli::new(p)) as Arc<dyn Vcs>);
        Self {
            repo: repo.clone(),
            local_clone,
        }
    }
}

fn clone_path(repo_root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        repo_root.join(configured)
    }
}

/// Result of checking one external repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCheck {
    pub name: String,
    pub url: String,
    pub status: ExternalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_hash: Option<Hash>,
    /// The local clone was rebased onto the external branch this run.
    pub pulled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Compare an external repository with its local clone.
///
/// `vcs` is used only for a read-only lookup of the external URL. On
/// divergence in Live mode the clone is pull-rebased; the status stays
/// `Diverged` (the comparison predates the pull) with `pulled` set.
/// `pull --rebase` moves the checked-out branch, so a clone with some
/// other branch checked out is left alone.
pub async fn check_external(
    vcs: &dyn Vcs,
    clone: Option<&dyn Vcs>,
    repo: &ExternalRepo,
    branch: &str,
    mode: Mode,
    timeout: Duration,
) -> ExternalCheck {
    let branch = repo.branch.as_deref().unwrap_or(branch);
    let mut check = ExternalCheck {
        name: repo.name.clone(),
        url: repo.url.clone(),
        status: ExternalStatus::Unreachable,
        remote_hash: None,
        local_hash: None,
        pulled: false,
        detail: None,
    };

    let remote_hash = match probe(vcs, &repo.url, branch, timeout).await {
        Probe::Present(hash) => hash,
        Probe::Absent => {
            check.detail = Some(format!("branch '{branch}' not found"));
            return check;
        }
        Probe::Unreachable(reason) => {
            check.detail = Some(reason);
            return check;
        }
    };
    check.remote_hash = Some(remote_hash.clone());

    let Some(clone) = clone else {
        check.status = ExternalStatus::NoLocalClone;
        return check;
    };

    let local_hash = match clone.local_ref(branch).await {
        Ok(hash) => hash,
        Err(err) => {
            check.status = ExternalStatus::NoLocalClone;
            check.detail = Some(err.to_string());
            return check;
        }
    };
    check.local_hash = Some(local_hash.clone());

    if local_hash == remote_hash {
        check.status = ExternalStatus::InSync;
        return check;
    }
    check.status = ExternalStatus::Diverged;

    if mode.is_read_only() {
        tracing::debug!(external = %repo.name, %mode, "diverged; not pulling in read-only mode");
        return check;
    }

    match clone.current_branch().await {
        Ok(head) if head == branch => {}
        Ok(head) => {
            tracing::warn!(
                external = %repo.name,
                head = %head,
                branch,
                "local clone on another branch; not rebasing"
            );
            check.detail = Some(format!(
                "local clone has '{head}' checked out, not '{branch}'; not rebasing"
            ));
            return check;
        }
        Err(err) => {
            tracing::warn!(
                external = %repo.name,
                error = %err,
                "cannot read local clone HEAD; not rebasing"
            );
            check.detail = Some(err.to_string());
            return check;
        }
    }

    match clone.pull_rebase(&repo.url, branch).await {
        Ok(()) => {
            tracing::info!(external = %repo.name, "rebased local clone onto external branch");
            check.pulled = true;
        }
        Err(err) => {
            tracing::warn!(external = %repo.name, error = %err, "pull --rebase failed");
            check.detail = Some(err.to_string());
        }
    }
    check
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
