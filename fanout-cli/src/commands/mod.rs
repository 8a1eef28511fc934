pub mod remotes;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use fanout_core::FleetConfig;

/// Repository root from `--repo`, or the current directory.
pub fn repo_root(repo: Option<&Path>) -> Result<PathBuf> {
    match repo {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().context("could not determine current directory"),
    }
}

/// Load `--config`, or `<repo>/.fanout.yaml` when it exists.
///
/// A missing default file means defaults; a missing `--config` is an error.
pub fn load_config(repo: &Path, config: Option<&Path>) -> Result<FleetConfig> {
    if let Some(path) = config {
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
    }
    let path = config.map_or_else(|| FleetConfig::path_in(repo), Path::to_path_buf);
    FleetConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
