//! Error types for fanout-sync.

use std::path::PathBuf;

use thiserror::Error;

use fanout_core::ConfigError;

use crate::vcs::VcsError;

/// Run-level errors. Per-remote failures never surface here; they are
/// recorded as [`fanout_core::SyncOutcome`]s instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The working directory is not inside a git work tree.
    #[error("not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// `git remote` listed nothing.
    #[error("no remotes configured in {path}")]
    NoRemotesConfigured { path: PathBuf },

    /// A local git query (branch, commit, remote list) failed.
    #[error("git error: {0}")]
    Vcs(#[from] VcsError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Status report JSON serialization/deserialization error.
    #[error("status report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
