//! `fanout remotes` — list remotes and their categories.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use fanout_core::{Category, Registry};
use fanout_sync::{pipeline, GitCli};

/// Arguments for `fanout remotes`.
#[derive(Args, Debug)]
pub struct RemotesArgs {
    /// Repository to inspect (default: current directory).
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Fleet config file (default: <repo>/.fanout.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct RemoteRow {
    #[tabled(rename = "remote")]
    name: String,
    #[tabled(rename = "category")]
    category: Category,
    #[tabled(rename = "pushed")]
    #[serde(skip)]
    managed: &'static str,
}

impl RemotesArgs {
    pub fn run(self) -> Result<ExitCode> {
        let repo = super::repo_root(self.repo.as_deref())?;
        let config = super::load_config(&repo, self.config.as_deref())?;
        let registry = Registry::from_config(&config);
        let vcs = GitCli::new(&repo);

        let remotes = pipeline::block_on(pipeline::classify_remotes(&vcs, &registry, &repo))
            .and_then(|r| r)
            .with_context(|| format!("failed to list remotes in {}", repo.display()))?;

        let rows: Vec<RemoteRow> = remotes
            .into_iter()
            .map(|r| RemoteRow {
                name: r.name.0,
                managed: if r.category.is_managed() { "yes" } else { "no" },
                category: r.category,
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize remotes")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(ExitCode::SUCCESS)
    }
}
