//! Sync executor — turns a probe into exactly one [`SyncOutcome`].
//!
//! ## Decision table
//!
//! | remote                        | mode       | outcome                        |
//! |-------------------------------|------------|--------------------------------|
//! | at local hash                 | any        | `AlreadyInSync`                |
//! | excluded / external, other    | any        | `Excluded`                     |
//! | managed, unreachable          | any        | `Unreachable`                  |
//! | managed, differs or absent    | VerifyOnly | `Diverged`                     |
//! | managed, differs or absent    | DryRun     | `WouldPush`                    |
//! | managed, differs or absent    | Live       | push → `Pushed` / `PushRejected` |
//!
//! Only the last row mutates anything.

use tokio::sync::Mutex;

use fanout_core::{Hash, Mode, PushPolicy, Remote, SyncOutcome};

use crate::prober::Probe;
use crate::vcs::Vcs;

/// Mode plus the separately-gated push policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions {
    pub mode: Mode,
    pub push: PushPolicy,
}

/// What [`decide`] wants done for a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Final without touching the remote.
    Done(SyncOutcome),
    /// Live mode: move the remote from `prior` to the local hash.
    Push { prior: Option<Hash> },
}

/// Pure half of the executor: classify without side effects.
pub fn decide(remote: &Remote, local: &Hash, probe: &Probe, mode: Mode) -> Decision {
    if probe.hash() == Some(local) {
        return Decision::Done(SyncOutcome::AlreadyInSync);
    }
    if !remote.category.is_managed() {
        return Decision::Done(SyncOutcome::Excluded);
    }
    let prior = match probe {
        Probe::Unreachable(reason) => {
            return Decision::Done(SyncOutcome::Unreachable {
                reason: reason.clone(),
            })
        }
        Probe::Present(hash) => Some(hash.clone()),
        Probe::Absent => None,
    };
    match mode {
        Mode::VerifyOnly => Decision::Done(SyncOutcome::Diverged { remote_hash: prior }),
        Mode::DryRun => Decision::Done(SyncOutcome::WouldPush {
            local: local.clone(),
            prior,
        }),
        Mode::Live => Decision::Push { prior },
    }
}

/// Decide and, in Live mode, push.
///
/// `push_lock` serializes pushes of the branch across concurrently running
/// remotes; probing never takes it.
pub async fn execute(
    vcs: &dyn Vcs,
    remote: &Remote,
    branch: &str,
    local: &Hash,
    probe: &Probe,
    options: ExecOptions,
    push_lock: &Mutex<()>,
) -> SyncOutcome {
    let prior = match decide(remote, local, probe, options.mode) {
        Decision::Done(outcome) => return outcome,
        Decision::Push { prior } => prior,
    };

    let name = remote.name.0.as_str();
    let _guard = push_lock.lock().await;
    let result = match options.push {
        PushPolicy::FastForwardOnly => vcs.push(name, branch).await,
        PushPolicy::Force => {
            tracing::warn!(remote = name, branch, "force-pushing");
            vcs.force_push(name, branch).await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!(
                remote = name,
                from = prior.as_ref().map(Hash::short).unwrap_or("(new)"),
                to = local.short(),
                "pushed"
            );
            SyncOutcome::Pushed {
                local: local.clone(),
                prior,
            }
        }
        Err(err) => {
            tracing::warn!(remote = name, error = %err, "push rejected");
            SyncOutcome::PushRejected {
                reason: err.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::MemoryVcs;
    use fanout_core::Category;
    use rstest::rstest;

    fn local() -> Hash {
        Hash::from("abc123")
    }

    fn flavor() -> Remote {
        Remote::new("r2", Category::Flavor)
    }

    #[rstest]
    #[case(Mode::Live)]
    #[case(Mode::DryRun)]
    #[case(Mode::VerifyOnly)]
    fn matching_hash_is_in_sync_in_every_mode(#[case] mode: Mode) {
        let probe = Probe::Present(local());
        assert_eq!(
            decide(&flavor(), &local(), &probe, mode),
            Decision::Done(SyncOutcome::AlreadyInSync)
        );
        let excluded = Remote::new("r3", Category::Excluded);
        assert_eq!(
            decide(&excluded, &local(), &probe, mode),
            Decision::Done(SyncOutcome::AlreadyInSync)
        );
    }

    #[rstest]
    #[case(Category::Excluded, Probe::Present(Hash::from("def456")))]
    #[case(Category::External, Probe::Present(Hash::from("def456")))]
    #[case(Category::Excluded, Probe::Unreachable("down".into()))]
    #[case(Category::Excluded, Probe::Absent)]
    fn unmanaged_remotes_are_excluded(#[case] category: Category, #[case] probe: Probe) {
        let remote = Remote::new("r3", category);
        for mode in [Mode::Live, Mode::DryRun, Mode::VerifyOnly] {
            assert_eq!(
                decide(&remote, &local(), &probe, mode),
                Decision::Done(SyncOutcome::Excluded)
            );
        }
    }

    #[test]
    fn verify_reports_divergence() {
        let probe = Probe::Present(Hash::from("def456"));
        assert_eq!(
            decide(&flavor(), &local(), &probe, Mode::VerifyOnly),
            Decision::Done(SyncOutcome::Diverged {
                remote_hash: Some(Hash::from("def456"))
            })
        );
    }

    #[test]
    fn dry_run_reports_would_push() {
        let probe = Probe::Absent;
        assert_eq!(
            decide(&flavor(), &local(), &probe, Mode::DryRun),
            Decision::Done(SyncOutcome::WouldPush {
                local: local(),
                prior: None
            })
        );
    }

    #[test]
    fn unreachable_managed_remote_fails_in_every_mode() {
        let probe = Probe::Unreachable("timed out after 10s".into());
        for mode in [Mode::Live, Mode::DryRun, Mode::VerifyOnly] {
            let decision = decide(&flavor(), &local(), &probe, mode);
            assert!(
                matches!(decision, Decision::Done(SyncOutcome::Unreachable { .. })),
                "{mode}: {decision:?}"
            );
        }
    }

    #[tokio::test]
    async fn live_push_moves_remote() {
        let vcs = MemoryVcs::new("main", "abc123").with_remote("r2", Some("def456"));
        let lock = Mutex::new(());
        let outcome = execute(
            &vcs,
            &flavor(),
            "main",
            &local(),
            &Probe::Present(Hash::from("def456")),
            ExecOptions::default(),
            &lock,
        )
        .await;
        assert_eq!(
            outcome,
            SyncOutcome::Pushed {
                local: local(),
                prior: Some(Hash::from("def456"))
            }
        );
        assert_eq!(vcs.remote_hash("r2", "main"), Some(local()));
        assert!(!vcs.pushes()[0].forced);
    }

    #[tokio::test]
    async fn rejected_push_is_not_escalated_to_force() {
        let vcs = MemoryVcs::new("main", "abc123")
            .with_remote("r2", Some("def456"))
            .rejecting_fast_forward("r2");
        let lock = Mutex::new(());
        let outcome = execute(
            &vcs,
            &flavor(),
            "main",
            &local(),
            &Probe::Present(Hash::from("def456")),
            ExecOptions::default(),
            &lock,
        )
        .await;
        assert!(matches!(outcome, SyncOutcome::PushRejected { .. }));
        assert!(vcs.pushes().is_empty());
        assert_eq!(vcs.remote_hash("r2", "main"), Some(Hash::from("def456")));
    }

    #[tokio::test]
    async fn force_policy_uses_force_push() {
        let vcs = MemoryVcs::new("main", "abc123")
            .with_remote("r2", Some("def456"))
            .rejecting_fast_forward("r2");
        let lock = Mutex::new(());
        let options = ExecOptions {
            mode: Mode::Live,
            push: PushPolicy::Force,
        };
        let outcome = execute(
            &vcs,
            &flavor(),
            "main",
            &local(),
            &Probe::Present(Hash::from("def456")),
            options,
            &lock,
        )
        .await;
        assert!(matches!(outcome, SyncOutcome::Pushed { .. }));
        assert!(vcs.pushes()[0].forced);
    }

    #[tokio::test]
    async fn force_policy_is_inert_outside_live() {
        let vcs = MemoryVcs::new("main", "abc123").with_remote("r2", Some("def456"));
        let lock = Mutex::new(());
        for mode in [Mode::DryRun, Mode::VerifyOnly] {
            let options = ExecOptions {
                mode,
                push: PushPolicy::Force,
            };
            execute(
                &vcs,
                &flavor(),
                "main",
                &local(),
                &Probe::Present(Hash::from("def456")),
                options,
                &lock,
            )
            .await;
        }
        assert!(vcs.pushes().is_empty());
    }
}
