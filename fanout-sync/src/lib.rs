//! fanout sync engine — probes every remote of a repository and brings the
//! managed ones up to the local branch.
//!
//! Public API surface:
//! - [`pipeline`] — [`run`] / [`run_blocking`], the whole pass
//! - [`prober`] — one timeout-bounded remote lookup
//! - [`executor`] — decide and push for one remote
//! - [`external`] — read-only checks of externally owned repositories
//! - [`report`] — aggregation, exit status and the persisted JSON report
//! - [`vcs`] — the [`Vcs`] boundary with [`GitCli`] and [`MemoryVcs`]

pub mod error;
pub mod executor;
pub mod external;
pub mod paths;
pub mod pipeline;
pub mod prober;
pub mod report;
pub mod vcs;

pub use error::SyncError;
pub use executor::ExecOptions;
pub use external::{ExternalCheck, ExternalTarget};
pub use pipeline::{classify_remotes, run, run_blocking, RunOptions};
pub use prober::Probe;
pub use report::{exit_status, Aggregator, ExitStatus, SyncCounts, SyncReport};
pub use vcs::{GitCli, MemoryVcs, Vcs, VcsError};
