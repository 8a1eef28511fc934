//! fanout core library — domain types, remote registry, fleet configuration.
//!
//! Public API surface:
//! - [`types`] — newtypes, categories, modes and per-remote outcomes
//! - [`registry`] — remote classification
//! - [`config`] — the optional `.fanout.yaml` fleet configuration
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{ExternalRepo, FleetConfig};
pub use error::ConfigError;
pub use registry::Registry;
pub use types::{
    Category, ExternalStatus, Hash, Mode, PushPolicy, ReferenceState, Remote, RemoteName,
    SyncOutcome,
};
