//! Fleet configuration loaded from `<repo>/.fanout.yaml`.
//!
//! # File shape
//!
//! ```yaml
//! branch: main
//! primary: origin
//! canonical: canonical
//! excluded: [archive]
//! external:
//!   - name: upstream-docs
//!     url: https://example.com/docs.git
//!     clone: ../docs
//! probe_timeout_secs: 10
//! concurrency: 8
//! report_path: ~/.fanout/status.json
//! ```
//!
//! Every key is optional. A missing file yields [`FleetConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name looked up at the repository root.
pub const CONFIG_FILE_NAME: &str = ".fanout.yaml";

pub const DEFAULT_PRIMARY: &str = "origin";
pub const DEFAULT_CANONICAL: &str = "canonical";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// A repository tracked for coordination but owned outside the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalRepo {
    /// Also the remote name it is classified under, if configured as a remote.
    pub name: String,
    pub url: String,
    /// Local clone to pull-rebase on divergence; relative paths resolve
    /// against the repository root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone: Option<PathBuf>,
    /// Branch to compare; defaults to the run's branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Root of `.fanout.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Branch to distribute; `None` means the checked-out branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub primary: String,
    pub canonical: String,
    pub excluded: Vec<String>,
    pub external: Vec<ExternalRepo>,
    pub probe_timeout_secs: u64,
    pub concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            branch: None,
            primary: DEFAULT_PRIMARY.to_string(),
            canonical: DEFAULT_CANONICAL.to_string(),
            excluded: Vec::new(),
            external: Vec::new(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            report_path: None,
        }
    }
}

impl FleetConfig {
    /// `<repo_root>/.fanout.yaml`. Pure, no I/O.
    pub fn path_in(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_FILE_NAME)
    }

    /// Load and validate the config at `path`.
    ///
    /// Returns the defaults if the file does not exist,
    /// `ConfigError::Parse` (with path + line context) if malformed YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // An empty file deserializes to `null`, which serde_yaml rejects for a struct.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.primary == self.canonical {
            return Err(ConfigError::Invalid(format!(
                "primary and canonical remotes must differ (both are '{}')",
                self.primary
            )));
        }
        if let Some(repo) = self.external.iter().find(|r| r.url.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "external repository '{}' has an empty url",
                repo.name
            )));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = FleetConfig::load(&FleetConfig::path_in(dir.path())).expect("load");
        assert_eq!(config, FleetConfig::default());
        assert_eq!(config.probe_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = FleetConfig::path_in(dir.path());
        std::fs::write(&path, "\n").expect("write");
        assert_eq!(FleetConfig::load(&path).expect("load"), FleetConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = FleetConfig::path_in(dir.path());
        std::fs::write(&path, "excluded: [archive]\nprobe_timeout_secs: 3\n").expect("write");
        let config = FleetConfig::load(&path).expect("load");
        assert_eq!(config.excluded, vec!["archive".to_string()]);
        assert_eq!(config.probe_timeout_secs, 3);
        assert_eq!(config.primary, DEFAULT_PRIMARY);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = FleetConfig {
            probe_timeout_secs: 0,
            ..FleetConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn primary_equal_to_canonical_is_rejected() {
        let config = FleetConfig {
            canonical: DEFAULT_PRIMARY.to_string(),
            ..FleetConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn unknown_key_is_a_parse_error_with_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = FleetConfig::path_in(dir.path());
        std::fs::write(&path, "primry: origin\n").expect("write");
        let err = FleetConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains(".fanout.yaml"));
    }
}
