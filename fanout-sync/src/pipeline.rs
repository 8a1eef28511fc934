//! Shared run pipeline used by `fanout sync` and `fanout remotes`.
//!
//! Preconditions (repository, remotes, local branch) are checked up front
//! and are the only errors that abort a run. After that every remote runs
//! as its own task: probe under a concurrency permit, then decide and (in
//! Live mode) push under the branch's push lock. Outcomes go straight into
//! the shared [`Aggregator`].

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use fanout_core::{
    config::{DEFAULT_CONCURRENCY, DEFAULT_PROBE_TIMEOUT_SECS},
    Hash, Registry, Remote, RemoteName, SyncOutcome,
};

use crate::error::{io_err, SyncError};
use crate::executor::{execute, ExecOptions};
use crate::external::{check_external, ExternalTarget};
use crate::prober::probe;
use crate::report::{Aggregator, ReportMeta, SyncReport};
use crate::vcs::Vcs;

/// Everything a run needs besides the repository and the registry.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Repository root, used for error messages.
    pub repo_path: PathBuf,
    pub exec: ExecOptions,
    /// Branch to distribute; `None` means the checked-out branch.
    pub branch: Option<String>,
    pub probe_timeout: Duration,
    pub concurrency: usize,
    pub externals: Vec<ExternalTarget>,
}

impl RunOptions {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            exec: ExecOptions::default(),
            branch: None,
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            externals: Vec::new(),
        }
    }
}

/// Check the repository preconditions and classify its remotes.
pub async fn classify_remotes(
    vcs: &dyn Vcs,
    registry: &Registry,
    repo_path: &std::path::Path,
) -> Result<Vec<Remote>, SyncError> {
    if !vcs.is_repository().await {
        return Err(SyncError::NotARepository {
            path: repo_path.to_path_buf(),
        });
    }
    let names = vcs.remotes().await?;
    if names.is_empty() {
        return Err(SyncError::NoRemotesConfigured {
            path: repo_path.to_path_buf(),
        });
    }
    Ok(registry.remotes(names))
}

/// Run one sync / verify pass over every remote and return the finalized
/// report. Persisting it is left to the caller.
pub async fn run(
    vcs: Arc<dyn Vcs>,
    registry: &Registry,
    options: RunOptions,
) -> Result<SyncReport, SyncError> {
    let remotes = classify_remotes(vcs.as_ref(), registry, &options.repo_path).await?;

    let branch = match options.branch.clone() {
        Some(branch) => branch,
        None => vcs.current_branch().await?,
    };
    let local = vcs.local_ref(&branch).await?;
    let commit_message = match vcs.commit_subject(&local).await {
        Ok(subject) => subject,
        Err(err) => {
            tracing::warn!(error = %err, "could not read commit subject");
            String::new()
        }
    };

    let exec = options.exec;
    if exec.push.is_force() && exec.mode.is_read_only() {
        tracing::warn!(mode = %exec.mode, "--force has no effect outside live mode");
    }
    tracing::info!(
        branch = %branch,
        commit = local.short(),
        mode = %exec.mode,
        remotes = remotes.len(),
        "starting run"
    );

    let aggregator = Arc::new(Aggregator::new());
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let push_lock = Arc::new(Mutex::new(()));
    let branch: Arc<str> = Arc::from(branch);
    let local = Arc::new(local);

    let mut tasks = JoinSet::new();
    for remote in remotes.iter().cloned() {
        let vcs = Arc::clone(&vcs);
        let aggregator = Arc::clone(&aggregator);
        let permits = Arc::clone(&permits);
        let push_lock = Arc::clone(&push_lock);
        let branch = Arc::clone(&branch);
        let local = Arc::clone(&local);
        let timeout = options.probe_timeout;
        tasks.spawn(async move {
            let probed = {
                let _permit = permits.acquire_owned().await.ok();
                probe(vcs.as_ref(), &remote.name.0, &branch, timeout).await
            };
            let outcome = execute(
                vcs.as_ref(),
                &remote,
                &branch,
                &local,
                &probed,
                exec,
                &push_lock,
            )
            .await;
            tracing::info!(remote = %remote.name, outcome = outcome.key(), "remote done");
            let state = probed.reference_state(&remote.name, &local);
            aggregator.record_state(&remote, state, outcome);
            remote.name
        });
    }

    let mut externals = JoinSet::new();
    for target in options.externals.iter().cloned() {
        let vcs = Arc::clone(&vcs);
        let aggregator = Arc::clone(&aggregator);
        let permits = Arc::clone(&permits);
        let branch = Arc::clone(&branch);
        let timeout = options.probe_timeout;
        let mode = exec.mode;
        externals.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let check = check_external(
                vcs.as_ref(),
                target.local_clone.as_deref(),
                &target.repo,
                &branch,
                mode,
                timeout,
            )
            .await;
            aggregator.record_external(check);
        });
    }

    let mut finished: BTreeSet<RemoteName> = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(name) => {
                finished.insert(name);
            }
            Err(err) => tracing::error!(error = %err, "remote task failed"),
        }
    }
    // A task that died never recorded; give its remote an outcome anyway.
    for remote in remotes.iter().filter(|r| !finished.contains(&r.name)) {
        aggregator.record(
            remote,
            SyncOutcome::Unreachable {
                reason: "remote task aborted".to_string(),
            },
        );
    }
    while let Some(joined) = externals.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "external check failed");
        }
    }

    let report = aggregator.finalize(ReportMeta {
        commit: Hash::clone(&local),
        commit_message,
        branch: branch.to_string(),
        mode: exec.mode,
        forced: exec.push.is_force() && !exec.mode.is_read_only(),
    });
    tracing::info!(
        pushed = report.counts.pushed,
        in_sync = report.counts.in_sync,
        failed = report.counts.failed,
        "run finished"
    );
    Ok(report)
}

/// Drive a pipeline future to completion on a fresh multi-thread runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, SyncError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(future))
}

/// Blocking form of [`run`] for synchronous callers.
pub fn run_blocking(
    vcs: Arc<dyn Vcs>,
    registry: &Registry,
    options: RunOptions,
) -> Result<SyncReport, SyncError> {
    block_on(run(vcs, registry, options))?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::MemoryVcs;
    use fanout_core::Mode;

    #[tokio::test]
    async fn not_a_repository_aborts_before_remote_work() {
        let vcs: Arc<dyn Vcs> = Arc::new(MemoryVcs::not_a_repository());
        let err = run(vcs, &Registry::default(), RunOptions::new("/tmp/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotARepository { .. }));
    }

    #[tokio::test]
    async fn no_remotes_is_a_precondition_failure() {
        let vcs: Arc<dyn Vcs> = Arc::new(MemoryVcs::new("main", "abc123"));
        let err = run(vcs, &Registry::default(), RunOptions::new("/tmp/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NoRemotesConfigured { .. }));
    }

    #[tokio::test]
    async fn unknown_branch_is_fatal() {
        let vcs: Arc<dyn Vcs> =
            Arc::new(MemoryVcs::new("main", "abc123").with_remote("r1", Some("abc123")));
        let mut options = RunOptions::new("/tmp/x");
        options.branch = Some("release".to_string());
        let err = run(vcs, &Registry::default(), options).await.unwrap_err();
        assert!(matches!(err, SyncError::Vcs(_)));
    }

    #[tokio::test]
    async fn report_carries_commit_metadata() {
        let vcs: Arc<dyn Vcs> = Arc::new(
            MemoryVcs::new("main", "abc123def456")
                .with_subject("abc123def456", "Bump flavors")
                .with_remote("r1", Some("abc123def456")),
        );
        let report = run(vcs, &Registry::default(), RunOptions::new("/tmp/x"))
            .await
            .unwrap();
        assert_eq!(report.branch, "main");
        assert_eq!(report.commit_short, "abc123d");
        assert_eq!(report.commit_message, "Bump flavors");
        assert_eq!(report.mode, Mode::Live);
        assert!(!report.forced);
    }

    #[tokio::test]
    async fn forced_flag_is_only_reported_for_live_runs() {
        let vcs: Arc<dyn Vcs> =
            Arc::new(MemoryVcs::new("main", "abc123").with_remote("r1", Some("abc123")));
        let mut options = RunOptions::new("/tmp/x");
        options.exec = ExecOptions {
            mode: Mode::DryRun,
            push: fanout_core::PushPolicy::Force,
        };
        let report = run(vcs, &Registry::default(), options).await.unwrap();
        assert!(!report.forced);
    }

    #[test]
    fn run_blocking_drives_the_runtime() {
        let vcs: Arc<dyn Vcs> =
            Arc::new(MemoryVcs::new("main", "abc123").with_remote("r1", Some("abc123")));
        let report = run_blocking(vcs, &Registry::default(), RunOptions::new("/tmp/x")).unwrap();
        assert_eq!(report.counts.in_sync, 1);
    }
}
