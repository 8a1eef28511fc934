//! In-memory [`Vcs`] used to exercise the engine without git or a network.
//!
//! Remotes are plain maps of branch → hash. A remote can be marked
//! unreachable, given artificial latency, or set to refuse regular pushes
//! (modelling a non-fast-forward rejection).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use fanout_core::Hash;

use super::{Vcs, VcsError};

/// One push accepted by a [`MemoryVcs`] remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub remote: String,
    pub branch: String,
    pub hash: Hash,
    pub forced: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryRemote {
    branches: HashMap<String, Hash>,
    reachable: bool,
    latency: Duration,
    rejects_fast_forward: bool,
    /// Reachable by url only; not listed by `git remote`.
    unlisted: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    is_repository: bool,
    head: String,
    local: HashMap<String, Hash>,
    subjects: HashMap<Hash, String>,
    remotes: BTreeMap<String, MemoryRemote>,
    pushes: Vec<PushRecord>,
    pulls: usize,
}

/// A fake repository with a single checked-out branch.
#[derive(Debug)]
pub struct MemoryVcs {
    state: Mutex<MemoryState>,
}

impl MemoryVcs {
    /// Repository with `branch` checked out at `hash`.
    pub fn new(branch: &str, hash: impl Into<Hash>) -> Self {
        let mut local = HashMap::new();
        local.insert(branch.to_string(), hash.into());
        Self {
            state: Mutex::new(MemoryState {
                is_repository: true,
                head: branch.to_string(),
                local,
                ..MemoryState::default()
            }),
        }
    }

    /// A directory that is not a repository at all.
    pub fn not_a_repository() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Reachable remote; `hash` of `None` means the branch does not exist there.
    pub fn with_remote(self, name: &str, hash: Option<&str>) -> Self {
        self.insert_remote(name, hash, true, Duration::ZERO)
    }

    /// Remote whose every query fails as if the host were down.
    pub fn with_unreachable_remote(self, name: &str) -> Self {
        self.insert_remote(name, None, false, Duration::ZERO)
    }

    /// Remote that answers only after `latency`.
    pub fn with_slow_remote(self, name: &str, hash: Option<&str>, latency: Duration) -> Self {
        self.insert_remote(name, hash, true, latency)
    }

    /// Repository reachable by `url` without being a configured remote.
    pub fn with_url(self, url: &str, hash: Option<&str>) -> Self {
        self.with_remote(url, hash).unlisted(url)
    }

    pub fn with_unreachable_url(self, url: &str) -> Self {
        self.with_unreachable_remote(url).unlisted(url)
    }

    /// Check out `branch` at `hash`; the previous branch keeps its hash.
    pub fn with_checked_out(self, branch: &str, hash: &str) -> Self {
        {
            let mut state = self.lock();
            state.local.insert(branch.to_string(), Hash::from(hash));
            state.head = branch.to_string();
        }
        self
    }

    /// Make regular pushes to `name` fail; force pushes still succeed.
    pub fn rejecting_fast_forward(self, name: &str) -> Self {
        if let Some(remote) = self.lock().remotes.get_mut(name) {
            remote.rejects_fast_forward = true;
        }
        self
    }

    pub fn with_subject(self, hash: &str, subject: &str) -> Self {
        self.lock()
            .subjects
            .insert(Hash::from(hash), subject.to_string());
        self
    }

    /// Current hash of `branch` on `remote`, as a test would inspect it.
    pub fn remote_hash(&self, remote: &str, branch: &str) -> Option<Hash> {
        self.lock()
            .remotes
            .get(remote)
            .and_then(|r| r.branches.get(branch).cloned())
    }

    pub fn local_hash(&self, branch: &str) -> Option<Hash> {
        self.lock().local.get(branch).cloned()
    }

    /// Move the local branch, as a new commit would.
    pub fn set_local(&self, branch: &str, hash: &str) {
        self.lock()
            .local
            .insert(branch.to_string(), Hash::from(hash));
    }

    pub fn pushes(&self) -> Vec<PushRecord> {
        self.lock().pushes.clone()
    }

    pub fn pull_count(&self) -> usize {
        self.lock().pulls
    }

    fn insert_remote(
        self,
        name: &str,
        hash: Option<&str>,
        reachable: bool,
        latency: Duration,
    ) -> Self {
        {
            let mut state = self.lock();
            let head = state.head.clone();
            let mut branches = HashMap::new();
            if let Some(hash) = hash {
                branches.insert(head, Hash::from(hash));
            }
            state.remotes.insert(
                name.to_string(),
                MemoryRemote {
                    branches,
                    reachable,
                    latency,
                    rejects_fast_forward: false,
                    unlisted: false,
                },
            );
        }
        self
    }

    fn unlisted(self, name: &str) -> Self {
        if let Some(remote) = self.lock().remotes.get_mut(name) {
            remote.unlisted = true;
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reachability check plus simulated latency. The lock is released
    /// before sleeping so concurrent probes do not serialize here.
    async fn contact(&self, remote: &str, args: &str) -> Result<(), VcsError> {
        let latency = {
            let state = self.lock();
            match state.remotes.get(remote) {
                Some(r) if r.reachable => r.latency,
                Some(_) => {
                    return Err(VcsError::Command {
                        args: args.to_string(),
                        stderr: format!("fatal: unable to access '{remote}': Could not resolve host"),
                    })
                }
                None => {
                    return Err(VcsError::Command {
                        args: args.to_string(),
                        stderr: format!("fatal: '{remote}' does not appear to be a git repository"),
                    })
                }
            }
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    async fn apply_push(&self, remote: &str, branch: &str, forced: bool) -> Result<(), VcsError> {
        let args = format!("push {remote} {branch}");
        self.contact(remote, &args).await?;
        let mut state = self.lock();
        let hash = state.local.get(branch).cloned().ok_or_else(|| VcsError::Command {
            args: args.clone(),
            stderr: format!("error: src refspec {branch} does not match any"),
        })?;
        let target = state
            .remotes
            .get_mut(remote)
            .ok_or_else(|| VcsError::Command {
                args: args.clone(),
                stderr: format!("fatal: '{remote}' does not appear to be a git repository"),
            })?;
        let differs = target.branches.get(branch).is_some_and(|h| h != &hash);
        if differs && target.rejects_fast_forward && !forced {
            return Err(VcsError::Command {
                args,
                stderr: format!("! [rejected] {branch} -> {branch} (non-fast-forward)"),
            });
        }
        target.branches.insert(branch.to_string(), hash.clone());
        state.pushes.push(PushRecord {
            remote: remote.to_string(),
            branch: branch.to_string(),
            hash,
            forced,
        });
        Ok(())
    }
}

#[async_trait]
impl Vcs for MemoryVcs {
    async fn is_repository(&self) -> bool {
        self.lock().is_repository
    }

    async fn remotes(&self) -> Result<Vec<String>, VcsError> {
        Ok(self
            .lock()
            .remotes
            .iter()
            .filter(|(_, remote)| !remote.unlisted)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn current_branch(&self) -> Result<String, VcsError> {
        let state = self.lock();
        if state.head.is_empty() {
            return Err(VcsError::Command {
                args: "symbolic-ref HEAD".to_string(),
                stderr: "HEAD is detached".to_string(),
            });
        }
        Ok(state.head.clone())
    }

    async fn local_ref(&self, branch: &str) -> Result<Hash, VcsError> {
        self.lock()
            .local
            .get(branch)
            .cloned()
            .ok_or_else(|| VcsError::Command {
                args: format!("rev-parse {branch}"),
                stderr: format!("unknown branch '{branch}'"),
            })
    }

    async fn commit_subject(&self, commit: &Hash) -> Result<String, VcsError> {
        Ok(self
            .lock()
            .subjects
            .get(commit)
            .cloned()
            .unwrap_or_default())
    }

    async fn remote_ref(&self, remote: &str, branch: &str) -> Result<Option<Hash>, VcsError> {
        self.contact(remote, &format!("ls-remote {remote} {branch}"))
            .await?;
        Ok(self.remote_hash(remote, branch))
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.apply_push(remote, branch, false).await
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.apply_push(remote, branch, true).await
    }

    /// Like `git pull --rebase`, moves whichever branch is checked out.
    async fn pull_rebase(&self, source: &str, branch: &str) -> Result<(), VcsError> {
        let upstream = self.remote_ref(source, branch).await?;
        let mut state = self.lock();
        state.pulls += 1;
        if let Some(hash) = upstream {
            let head = state.head.clone();
            state.local.insert(head, hash);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_moves_remote_and_is_logged() {
        let vcs = MemoryVcs::new("main", "abc123").with_remote("r1", Some("def456"));
        vcs.push("r1", "main").await.expect("push");
        assert_eq!(vcs.remote_hash("r1", "main"), Some(Hash::from("abc123")));
        assert_eq!(vcs.pushes().len(), 1);
        assert!(!vcs.pushes()[0].forced);
    }

    #[tokio::test]
    async fn rejecting_remote_accepts_only_force() {
        let vcs = MemoryVcs::new("main", "abc123")
            .with_remote("r1", Some("def456"))
            .rejecting_fast_forward("r1");
        assert!(vcs.push("r1", "main").await.is_err());
        assert_eq!(vcs.remote_hash("r1", "main"), Some(Hash::from("def456")));
        vcs.force_push("r1", "main").await.expect("force push");
        assert_eq!(vcs.remote_hash("r1", "main"), Some(Hash::from("abc123")));
    }

    #[tokio::test]
    async fn unreachable_remote_errors_on_every_call() {
        let vcs = MemoryVcs::new("main", "abc123").with_unreachable_remote("down");
        assert!(vcs.remote_ref("down", "main").await.is_err());
        assert!(vcs.push("down", "main").await.is_err());
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn url_endpoints_are_reachable_but_not_listed() {
        let vcs = MemoryVcs::new("main", "abc123")
            .with_remote("r1", Some("abc123"))
            .with_url("https://example.com/docs.git", Some("def456"))
            .with_unreachable_url("https://example.com/gone.git");
        assert_eq!(vcs.remotes().await.expect("remotes"), vec!["r1".to_string()]);
        assert_eq!(
            vcs.remote_ref("https://example.com/docs.git", "main")
                .await
                .expect("ls-remote"),
            Some(Hash::from("def456"))
        );
        assert!(vcs
            .remote_ref("https://example.com/gone.git", "main")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn pull_rebase_moves_the_checked_out_branch() {
        let vcs = MemoryVcs::new("main", "abc123")
            .with_url("upstream", Some("def456"))
            .with_checked_out("feature", "fff000");
        vcs.pull_rebase("upstream", "main").await.expect("pull");
        assert_eq!(vcs.local_hash("feature"), Some(Hash::from("def456")));
        assert_eq!(vcs.local_hash("main"), Some(Hash::from("abc123")));
        assert_eq!(vcs.pull_count(), 1);
    }
}
