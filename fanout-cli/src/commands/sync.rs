//! `fanout sync` — probe every remote and bring the managed ones up to date.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use fanout_core::{Mode, PushPolicy, Registry};
use fanout_sync::{
    exit_status, paths,
    pipeline::{self, RunOptions},
    report, ExecOptions, ExternalTarget, GitCli, Vcs,
};

use crate::render;

/// Arguments for `fanout sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Report what would be pushed without pushing.
    #[arg(long)]
    pub dry_run: bool,

    /// Read-only check: any remote off the local commit is a failure.
    #[arg(long)]
    pub verify: bool,

    /// Force-push instead of refusing non-fast-forward updates.
    #[arg(long)]
    pub force: bool,

    /// Branch to distribute (default: config, then the checked-out branch).
    #[arg(long)]
    pub branch: Option<String>,

    /// Repository to run in (default: current directory).
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Fleet config file (default: <repo>/.fanout.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where to write the JSON report (default: ~/.fanout/status.json).
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Per-remote probe timeout in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Maximum number of remotes probed at once.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Print the report as JSON instead of the console summary.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<ExitCode> {
        let home = super::home_dir()?;
        let repo = super::repo_root(self.repo.as_deref())?;
        let config = super::load_config(&repo, self.config.as_deref())?;

        let mode = Mode::from_flags(self.dry_run, self.verify);
        let mut options = RunOptions::new(&repo);
        options.exec = ExecOptions {
            mode,
            push: PushPolicy::from_flag(self.force),
        };
        options.branch = self.branch.clone().or_else(|| config.branch.clone());
        options.probe_timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.probe_timeout());
        options.concurrency = self
            .concurrency
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(config.concurrency);
        options.externals = config
            .external
            .iter()
            .map(|repo_cfg| ExternalTarget::resolve(&repo, repo_cfg))
            .collect();

        let registry = Registry::from_config(&config);
        let vcs: Arc<dyn Vcs> = Arc::new(GitCli::new(&repo));
        let report = pipeline::run_blocking(vcs, &registry, options)
            .with_context(|| format!("sync failed in {}", repo.display()))?;

        let report_path = self
            .report
            .clone()
            .or_else(|| config.report_path.clone())
            .map(|p| paths::expand_home(&p, &home))
            .unwrap_or_else(|| paths::default_report_path(&home));
        report::persist(&report, &report_path)
            .with_context(|| format!("failed to write report to {}", report_path.display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            render::print_report(&report);
        }
        Ok(ExitCode::from(exit_status(&report).code()))
    }
}
