//! State prober — non-mutating lookup of a remote's branch hash.

use std::fmt;
use std::time::Duration;

use fanout_core::{Hash, ReferenceState, RemoteName};

use crate::vcs::Vcs;

/// What a single remote lookup found.
///
/// [`Probe::hash`] collapses `Absent` and `Unreachable` to `None`; the
/// distinction is kept so an absent branch can still be created by a push
/// while an unreachable host is reported as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Present(Hash),
    Absent,
    Unreachable(String),
}

impl Probe {
    pub fn hash(&self) -> Option<&Hash> {
        match self {
            Probe::Present(hash) => Some(hash),
            Probe::Absent | Probe::Unreachable(_) => None,
        }
    }

    /// Collapse into the per-run reference record.
    pub fn reference_state(&self, remote: &RemoteName, local_hash: &Hash) -> ReferenceState {
        ReferenceState {
            remote: remote.clone(),
            local_hash: local_hash.clone(),
            remote_hash: self.hash().cloned(),
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Present(hash) => write!(f, "at {}", hash.short()),
            Probe::Absent => write!(f, "branch absent"),
            Probe::Unreachable(reason) => write!(f, "unreachable: {reason}"),
        }
    }
}

/// Look up `branch` on `remote`, giving up after `timeout`.
///
/// A timeout drops the in-flight lookup (killing the git child) and is
/// reported as [`Probe::Unreachable`].
pub async fn probe(vcs: &dyn Vcs, remote: &str, branch: &str, timeout: Duration) -> Probe {
    match tokio::time::timeout(timeout, vcs.remote_ref(remote, branch)).await {
        Ok(Ok(Some(hash))) => {
            tracing::debug!(remote, branch, hash = %hash, "probed remote");
            Probe::Present(hash)
        }
        Ok(Ok(None)) => {
            tracing::debug!(remote, branch, "branch absent on remote");
            Probe::Absent
        }
        Ok(Err(err)) => {
            tracing::warn!(remote, error = %err, "remote lookup failed");
            Probe::Unreachable(err.to_string())
        }
        Err(_) => {
            tracing::warn!(remote, timeout_secs = timeout.as_secs_f64(), "remote lookup timed out");
            Probe::Unreachable(format!("timed out after {}s", timeout.as_secs_f64()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
