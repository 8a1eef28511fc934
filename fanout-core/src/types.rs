//! Domain types for fanout.
//!
//! All types are serializable via serde; the persisted status report embeds
//! [`Category`], [`Mode`] and [`SyncOutcome`] directly.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a configured git remote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteName(pub String);

impl fmt::Display for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RemoteName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A commit id as reported by git (full hex form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(pub String);

impl Hash {
    /// Length of the abbreviated form shown on the console and in reports.
    pub const SHORT_LEN: usize = 7;

    /// First [`Hash::SHORT_LEN`] characters, or the whole id if shorter.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(Self::SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Hash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Hash {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Role a remote plays in the fleet.
///
/// Variant order is the reporting order: primary first, external last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Primary,
    Canonical,
    Flavor,
    Excluded,
    External,
}

impl Category {
    /// Managed remotes are the ones fanout may push to.
    pub fn is_managed(self) -> bool {
        matches!(self, Category::Primary | Category::Canonical | Category::Flavor)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Primary => write!(f, "primary"),
            Category::Canonical => write!(f, "canonical"),
            Category::Flavor => write!(f, "flavor"),
            Category::Excluded => write!(f, "excluded"),
            Category::External => write!(f, "external"),
        }
    }
}

/// Execution mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Pushes to remotes that differ from the local branch.
    #[default]
    Live,
    /// Reports what would be pushed; never mutates.
    DryRun,
    /// Read-only check; any divergence is a failure.
    VerifyOnly,
}

impl Mode {
    /// Resolve the CLI flag pair. `--verify` wins over `--dry-run`: both are
    /// read-only, but verify is the stricter of the two.
    pub fn from_flags(dry_run: bool, verify: bool) -> Self {
        match (dry_run, verify) {
            (_, true) => Mode::VerifyOnly,
            (true, false) => Mode::DryRun,
            (false, false) => Mode::Live,
        }
    }

    pub fn is_read_only(self) -> bool {
        !matches!(self, Mode::Live)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::DryRun => write!(f, "dry-run"),
            Mode::VerifyOnly => write!(f, "verify"),
        }
    }
}

/// How a Live-mode push updates the remote branch.
///
/// Force is opt-in per run and only meant for recovery after a history
/// rewrite; nothing in the engine escalates to it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PushPolicy {
    #[default]
    FastForwardOnly,
    Force,
}

impl PushPolicy {
    pub fn from_flag(force: bool) -> Self {
        if force {
            PushPolicy::Force
        } else {
            PushPolicy::FastForwardOnly
        }
    }

    pub fn is_force(self) -> bool {
        matches!(self, PushPolicy::Force)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A classified remote. Identity is the name; immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Remote {
    pub name: RemoteName,
    pub category: Category,
}

impl Remote {
    pub fn new(name: impl Into<RemoteName>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Local vs remote reference for one remote, produced fresh each run.
///
/// `remote_hash` is `None` when the remote is unreachable or the branch does
/// not exist there yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceState {
    pub remote: RemoteName,
    pub local_hash: Hash,
    pub remote_hash: Option<Hash>,
}

impl ReferenceState {
    pub fn in_sync(&self) -> bool {
        self.remote_hash.as_ref() == Some(&self.local_hash)
    }
}

/// The single result recorded for a remote in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    AlreadyInSync,
    /// Dry-run: the remote would be moved from `prior` to `local`.
    WouldPush { local: Hash, prior: Option<Hash> },
    Pushed { local: Hash, prior: Option<Hash> },
    /// The remote points elsewhere and this run did not move it.
    Diverged { remote_hash: Option<Hash> },
    /// A Live push was attempted and refused.
    PushRejected { reason: String },
    Unreachable { reason: String },
    Excluded,
}

impl SyncOutcome {
    /// Outcomes that land in `failedRemotes` and drive exit code 1.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Diverged { .. }
                | SyncOutcome::PushRejected { .. }
                | SyncOutcome::Unreachable { .. }
        )
    }

    /// Outcomes counted as "pushed"; dry-run counts what it would push.
    pub fn is_push(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Pushed { .. } | SyncOutcome::WouldPush { .. }
        )
    }

    /// Stable machine key, as used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            SyncOutcome::AlreadyInSync => "already_in_sync",
            SyncOutcome::WouldPush { .. } => "would_push",
            SyncOutcome::Pushed { .. } => "pushed",
            SyncOutcome::Diverged { .. } => "diverged",
            SyncOutcome::PushRejected { .. } => "push_rejected",
            SyncOutcome::Unreachable { .. } => "unreachable",
            SyncOutcome::Excluded => "excluded",
        }
    }
}

/// Status of an externally-owned repository. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalStatus {
    InSync,
    Diverged,
    NoLocalClone,
    Unreachable,
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalStatus::InSync => write!(f, "in sync"),
            ExternalStatus::Diverged => write!(f, "diverged"),
            ExternalStatus::NoLocalClone => write!(f, "no local clone"),
            ExternalStatus::Unreachable => write!(f, "unreachable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
