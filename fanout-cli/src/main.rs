//! fanout — keep every remote of a repository on the same commit.
//!
//! # Usage
//!
//! ```text
//! fanout [sync] [--dry-run] [--verify] [--force] [--branch <b>] [--repo <dir>]
//!               [--config <file>] [--report <file>] [--timeout <secs>]
//!               [--concurrency <n>] [--json]
//! fanout status [--report <file>] [--json]
//! fanout remotes [--repo <dir>] [--config <file>] [--json]
//! ```
//!
//! Exit codes: 0 everything in sync, 1 at least one remote failed,
//! 2 the run could not start (or the report could not be read / written).

mod commands;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;

use commands::{remotes::RemotesArgs, status::StatusArgs, sync::SyncArgs};

/// Exit code for anything that stops a run from producing a report.
const EXIT_PRECONDITION: u8 = 2;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    version,
    about = "Push one branch to every remote of a repository and report what moved",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Flags for the implicit `sync` when no subcommand is given. Rejected
    /// in front of an explicit subcommand.
    #[command(flatten)]
    sync: SyncArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe every remote and push the branch where it differs (default).
    Sync(SyncArgs),

    /// Show the last persisted run report.
    Status(StatusArgs),

    /// List the repository's remotes and how each is classified.
    Remotes(RemotesArgs),
}

impl Cli {
    fn run(self) -> Result<ExitCode> {
        match self.command {
            Some(Commands::Sync(args)) => args.run(),
            Some(Commands::Status(args)) => args.run(),
            Some(Commands::Remotes(args)) => args.run(),
            None => self.sync.run(),
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(EXIT_PRECONDITION)
        }
    }
}
