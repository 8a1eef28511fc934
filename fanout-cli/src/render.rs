//! Console rendering shared by `sync` and `status`.

use chrono::{Local, Utc};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use fanout_core::{ExternalStatus, Hash, Mode, SyncOutcome};
use fanout_sync::{report::RemoteRecord, ExternalCheck, SyncReport};

#[derive(Tabled)]
struct CountsRow {
    #[tabled(rename = "total")]
    total: usize,
    #[tabled(rename = "pushed")]
    pushed: usize,
    #[tabled(rename = "in sync")]
    in_sync: usize,
    #[tabled(rename = "failed")]
    failed: usize,
    #[tabled(rename = "excluded")]
    excluded: usize,
}

pub fn print_report(report: &SyncReport) {
    let prefix = match report.mode {
        Mode::Live => "",
        Mode::DryRun => "[dry-run] ",
        Mode::VerifyOnly => "[verify] ",
    };
    let forced = if report.forced { " (forced)" } else { "" };
    println!(
        "{prefix}{} @ {} {}{forced}",
        report.branch.bold(),
        report.commit_short.yellow(),
        report.commit_message,
    );

    let separator = "■".repeat(60).bright_black().to_string();
    println!("{separator}");
    let width = report
        .remotes
        .iter()
        .map(|r| r.name.0.len())
        .max()
        .unwrap_or(0);
    for record in &report.remotes {
        print_remote(record, width);
    }
    if !report.external.is_empty() {
        println!("{separator}");
        for check in &report.external {
            print_external(check);
        }
    }
    println!("{separator}");

    let counts = &report.counts;
    let mut table = Table::new([CountsRow {
        total: counts.total,
        pushed: counts.pushed,
        in_sync: counts.in_sync,
        failed: counts.failed,
        excluded: counts.excluded,
    }]);
    table.with(Style::rounded());
    println!("{table}");

    if report.failed_remotes.is_empty() {
        let summary = match report.mode {
            Mode::DryRun => "✓ no failures predicted",
            Mode::Live | Mode::VerifyOnly => "✓ all remotes in sync",
        };
        println!("{}", summary.green());
    } else {
        println!(
            "{} {}",
            "✗ failed:".red().bold(),
            report.failed_remotes.join(", ")
        );
    }
}

/// Header line for a stored report: when it was produced.
pub fn print_age(report: &SyncReport) {
    let age = Utc::now().signed_duration_since(report.timestamp);
    println!(
        "last run {} ({})",
        report
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S"),
        format_age(age)
    );
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

fn print_remote(record: &RemoteRecord, width: usize) {
    println!(
        "  {}  {:<width$}  {:<9}  {}",
        outcome_glyph(&record.outcome),
        record.name.0,
        record.category.to_string(),
        outcome_detail(&record.outcome),
    );
}

fn print_external(check: &ExternalCheck) {
    let glyph = match check.status {
        ExternalStatus::InSync => "·".bright_black().to_string(),
        ExternalStatus::Diverged => "~".yellow().to_string(),
        ExternalStatus::NoLocalClone | ExternalStatus::Unreachable => "?".yellow().to_string(),
    };
    let mut detail = check.status.to_string();
    if check.pulled {
        detail.push_str(", local clone rebased");
    }
    if let Some(extra) = &check.detail {
        detail.push_str(&format!(" ({})", first_line(extra)));
    }
    println!("  {glyph}  {}  external  {detail}", check.name);
}

fn outcome_glyph(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadyInSync => "·".bright_black().to_string(),
        SyncOutcome::Pushed { .. } => "✎".green().bold().to_string(),
        SyncOutcome::WouldPush { .. } => "~".cyan().to_string(),
        SyncOutcome::Excluded => "-".bright_black().to_string(),
        SyncOutcome::Diverged { .. }
        | SyncOutcome::PushRejected { .. }
        | SyncOutcome::Unreachable { .. } => "✗".red().bold().to_string(),
    }
}

fn outcome_detail(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadyInSync => "in sync".to_string(),
        SyncOutcome::Pushed { local, prior } => {
            format!("pushed {} → {}", short_or_new(prior.as_ref()), local.short())
        }
        SyncOutcome::WouldPush { local, prior } => {
            format!("would push {} → {}", short_or_new(prior.as_ref()), local.short())
        }
        SyncOutcome::Diverged { remote_hash } => match remote_hash {
            Some(hash) => format!("diverged (remote at {})", hash.short()),
            None => "diverged (branch missing on remote)".to_string(),
        },
        SyncOutcome::PushRejected { reason } => format!("push rejected: {}", first_line(reason)),
        SyncOutcome::Unreachable { reason } => format!("unreachable: {}", first_line(reason)),
        SyncOutcome::Excluded => "excluded".to_string(),
    }
}

fn short_or_new(hash: Option<&Hash>) -> &str {
    hash.map_or("(new)", Hash::short)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
