use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveTime};
use clap::Parser;

use commit_canvas::{
    commit_message, graph_anchor, map_grid, ArtParams, CommitHistory, CommitScheduler,
    DateOutcome, GitRepository, Mode, PixelGrid, PlannedCommit, RunOutcome, RunReport,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Draw pixel art on your contribution graph with backdated empty commits"
)]
struct Args {
    /// Black-and-white image, at most 51 pixels wide and 7 tall
    image_path: PathBuf,

    /// Year whose graph to draw on (e.g. 2024)
    year: i32,

    /// Prefix for commit messages
    #[arg(long, default_value = commit_canvas::config::DEFAULT_PREFIX)]
    prefix: String,

    /// Show what would be committed without touching the repository (default)
    #[arg(long, conflicts_with = "execute")]
    dry_run: bool,

    /// Create the commits (asks for confirmation first)
    #[arg(long)]
    execute: bool,

    /// Commit even on dates that already have commits
    #[arg(long)]
    force: bool,

    /// Answer the confirmation prompt with "yes"
    #[arg(long, requires = "execute")]
    yes: bool,

    /// Time of day stamped on every commit (local time)
    #[arg(long, default_value = "12:00:00", value_parser = parse_time)]
    commit_time: NaiveTime,

    /// Repository to commit into
    #[arg(long, default_value = ".")]
    repo: PathBuf,
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|e| format!("expected HH:MM:SS: {e}"))
}

// --- confirmation gate ---

fn confirm(plan: &[PlannedCommit], assume_yes: bool) -> bool {
    let count = plan.iter().filter(|p| p.creates()).count();
    if assume_yes {
        println!("Proceeding with {count} commits (--yes).");
        return true;
    }

    print!("Proceed with making {count} commits? (yes/no): ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("yes"),
        Err(_) => false,
    }
}

// --- reporting ---

fn print_report(report: &RunReport, prefix: &str, mode: Mode) {
    for (target, outcome) in &report.outcomes {
        let message = commit_message(prefix, target);
        match outcome {
            DateOutcome::WouldCreate => println!("  [DRY RUN] Would commit: {message}"),
            DateOutcome::Created => println!("  Committed: {message}"),
            DateOutcome::SkippedDuplicate => {
                println!("  Skipped {}: date already has a commit", target.date)
            }
            DateOutcome::Failed { reason } => eprintln!("  Failed {}: {reason}", target.date),
        }
    }

    println!();
    println!("--- Summary ---");
    match mode {
        Mode::DryRun => println!(
            "Would create {} commits, skip {} duplicates.",
            report.planned, report.skipped
        ),
        Mode::Execute => println!(
            "Created {}, skipped {}, failed {}.",
            report.created, report.skipped, report.failed
        ),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mode = if args.execute { Mode::Execute } else { Mode::DryRun };
    if !args.execute && !args.dry_run {
        eprintln!("Warning: neither --dry-run nor --execute given; defaulting to --dry-run.");
    }

    let current_year = Local::now().year();
    if !(current_year - 10..=current_year + 1).contains(&args.year) {
        eprintln!(
            "Warning: year {} is far from {current_year}; the profile graph may not show it.",
            args.year
        );
    }

    let params = ArtParams {
        prefix: args.prefix.clone(),
        commit_time: args.commit_time,
        ..ArtParams::default()
    };

    let grid = PixelGrid::from_path(&args.image_path, &params)
        .with_context(|| format!("Cannot use {} as pixel art", args.image_path.display()))?;
    println!(
        "Loaded: {} ({}x{}) for year {}",
        args.image_path.display(),
        grid.width(),
        grid.height(),
        args.year
    );

    let anchor = graph_anchor(args.year)?;
    println!("Graph for {} starts on Sunday {anchor}.", args.year);

    let dates = map_grid(&grid, args.year)?;

    // Image problems abort first; repository problems abort even when there is nothing to paint.
    let mut repo = GitRepository::open(args.repo.clone());
    repo.ensure_ready()
        .with_context(|| format!("Cannot commit into {}", args.repo.display()))?;

    if dates.is_empty() {
        println!("No black pixels found; nothing to commit.");
        return Ok(());
    }
    let outside = dates.iter().filter(|d| !d.in_target_year).count();
    if outside > 0 {
        eprintln!("Warning: {outside} pixels land outside {}; they are kept.", args.year);
    }

    let outcome = CommitScheduler::new(&mut repo, &params)
        .run(&dates, args.force, mode, |plan| confirm(plan, args.yes))
        .with_context(|| format!("Cannot commit into {}", args.repo.display()))?;

    let report = match outcome {
        RunOutcome::Aborted { .. } => {
            println!("Aborted by user.");
            return Ok(());
        }
        RunOutcome::Completed(report) => report,
    };

    print_report(&report, &params.prefix, mode);

    if mode == Mode::DryRun {
        if report.planned > 0 {
            println!("To apply these changes, re-run with --execute.");
        }
        return Ok(());
    }

    if !report.is_success() {
        bail!(
            "{} of {} commits failed; check `git status`, then re-run (existing dates are skipped)",
            report.failed,
            report.created + report.failed
        );
    }
    if report.created > 0 {
        println!("Done. Run `git push` to see the art on your remote.");
    }
    Ok(())
}
