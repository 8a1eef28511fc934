//! Report aggregator and the persisted status report.
//!
//! Outcomes are recorded from concurrently running remote tasks into an
//! [`Aggregator`]; [`Aggregator::finalize`] summarises it into a
//! [`SyncReport`], which [`persist`] writes as pretty JSON using the
//! `.tmp` + rename pattern. Each run overwrites the previous report.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fanout_core::{Category, Hash, Mode, ReferenceState, Remote, RemoteName, SyncOutcome};

use crate::error::{io_err, SyncError};
use crate::external::ExternalCheck;

/// One remote's line in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub name: RemoteName,
    pub category: Category,
    /// Where the remote's branch pointed before this run touched it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_hash: Option<Hash>,
    pub outcome: SyncOutcome,
}

/// Aggregate counts. `excluded` is the number of `Excluded` outcomes, so
/// `total == pushed + in_sync + failed + excluded` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub total: usize,
    pub pushed: usize,
    pub in_sync: usize,
    pub failed: usize,
    pub excluded: usize,
}

/// The durable artifact of a run, read back by `fanout status` and by
/// whatever scheduled the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,
    pub commit: Hash,
    pub commit_short: String,
    pub commit_message: String,
    pub branch: String,
    pub mode: Mode,
    pub forced: bool,
    #[serde(flatten)]
    pub counts: SyncCounts,
    pub failed_remotes: Vec<String>,
    pub remotes: Vec<RemoteRecord>,
    #[serde(default)]
    pub external: Vec<ExternalCheck>,
}

/// Run-level facts the aggregator does not see through outcomes.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub commit: Hash,
    pub commit_message: String,
    pub branch: String,
    pub mode: Mode,
    pub forced: bool,
}

/// Overall result of a run, for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    AllSynced,
    SomeFailed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::AllSynced => 0,
            ExitStatus::SomeFailed => 1,
        }
    }
}

/// Derived purely from `counts.failed`.
pub fn exit_status(report: &SyncReport) -> ExitStatus {
    if report.counts.failed > 0 {
        ExitStatus::SomeFailed
    } else {
        ExitStatus::AllSynced
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Append-only accumulator. Recording order does not matter.
#[derive(Debug, Default)]
pub struct Aggregator {
    remotes: Mutex<Vec<RemoteRecord>>,
    external: Mutex<Vec<ExternalCheck>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome for a remote whose branch state is unknown.
    pub fn record(&self, remote: &Remote, outcome: SyncOutcome) {
        lock(&self.remotes).push(RemoteRecord {
            name: remote.name.clone(),
            category: remote.category,
            remote_hash: None,
            outcome,
        });
    }

    /// Record an outcome along with the state the remote was found in.
    pub fn record_state(&self, remote: &Remote, state: ReferenceState, outcome: SyncOutcome) {
        lock(&self.remotes).push(RemoteRecord {
            name: remote.name.clone(),
            category: remote.category,
            remote_hash: state.remote_hash,
            outcome,
        });
    }

    pub fn record_external(&self, check: ExternalCheck) {
        lock(&self.external).push(check);
    }

    /// Produce the report from everything recorded so far.
    ///
    /// Does not drain the aggregator: calling it again yields the same
    /// counts and ordering (only `timestamp` moves).
    pub fn finalize(&self, meta: ReportMeta) -> SyncReport {
        let mut remotes = lock(&self.remotes).clone();
        remotes.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));
        let mut external = lock(&self.external).clone();
        external.sort_by(|a, b| a.name.cmp(&b.name));

        let mut counts = SyncCounts {
            total: remotes.len(),
            ..SyncCounts::default()
        };
        let mut failed_remotes = Vec::new();
        for record in &remotes {
            match &record.outcome {
                SyncOutcome::AlreadyInSync => counts.in_sync += 1,
                SyncOutcome::Excluded => counts.excluded += 1,
                outcome if outcome.is_push() => counts.pushed += 1,
                outcome if outcome.is_failure() => {
                    counts.failed += 1;
                    failed_remotes.push(record.name.0.clone());
                }
                _ => {}
            }
        }

        SyncReport {
            timestamp: Utc::now(),
            commit_short: meta.commit.short().to_string(),
            commit: meta.commit,
            commit_message: meta.commit_message,
            branch: meta.branch,
            mode: meta.mode,
            forced: meta.forced,
            counts,
            failed_remotes,
            remotes,
            external,
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.tmp", path.display()))
}

/// Write `report` to `path`, replacing whatever was there.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn persist(report: &SyncReport, path: &Path) -> Result<(), SyncError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(report)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!(path = %path.display(), "status report written");
    Ok(())
}

/// Read a report previously written by [`persist`].
pub fn load(path: &Path) -> Result<SyncReport, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
