//! `fanout status` — show the last persisted report without touching any remote.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use fanout_sync::{exit_status, paths, report};

use crate::render;

/// Arguments for `fanout status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Report file to read (default: ~/.fanout/status.json).
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Emit the stored report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<ExitCode> {
        let home = super::home_dir()?;
        let path = self
            .report
            .as_deref()
            .map(|p| paths::expand_home(p, &home))
            .unwrap_or_else(|| paths::default_report_path(&home));

        let stored = report::load(&path).with_context(|| {
            format!(
                "no readable report at {}; run `fanout sync` first",
                path.display()
            )
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stored).context("failed to serialize report")?
            );
        } else {
            render::print_age(&stored);
            render::print_report(&stored);
        }
        Ok(ExitCode::from(exit_status(&stored).code()))
    }
}
