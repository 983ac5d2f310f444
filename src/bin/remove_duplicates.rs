mod common;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::*;
use common::CliReporter;
use dotenv::dotenv;
use indicatif::HumanDuration;
use std::path::PathBuf;
use tracing::info;
use vidtidy::dedupe::FileAction;
use vidtidy::{config, logging, DedupeOptions, DedupeSummary, Deduplicator};

#[derive(Debug, Parser)]
#[command(name = "remove_duplicates")]
#[command(about = "Remove duplicate video URLs from every videos.json under a directory", long_about = None)]
struct Cli {
    /// Directory to scan
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,
    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Copy each file to <name>.backup before rewriting it
    #[arg(long)]
    backup: bool,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger("logs/remove_duplicates.log");

    let args = Cli::parse();
    info!("Run started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let config = config::load_configuration().context("Error loading configuration")?;

    let options = DedupeOptions {
        root: args.root_dir,
        dry_run: args.dry_run,
        backup: args.backup,
    };
    let engine = Deduplicator::new(config);
    let reporter = CliReporter::new();
    let summary = engine.run(&options, &reporter)?;

    print_summary(&summary, options.dry_run);
    Ok(())
}

fn print_summary(summary: &DedupeSummary, dry_run: bool) {
    println!();
    println!("{}", "=".repeat(60));
    if dry_run {
        println!("{}", "DRY RUN - no files were written".yellow());
    }

    for file in summary.files.iter().filter(|f| f.duplicates_removed > 0) {
        let backup = match &file.action {
            FileAction::Rewritten { backup: Some(path) } => format!(" (backup: {})", path.display()),
            _ => String::new(),
        };
        println!(
            "  {}: {} duplicates, {} -> {} records{}",
            file.path.display(),
            format!("{}", file.duplicates_removed).red(),
            file.records_before,
            file.records_after,
            backup
        );
    }

    let modified_label = if dry_run { "Files that would change" } else { "Files modified" };
    println!("Files scanned:      {}", summary.files_scanned);
    println!("{:<20}{}", format!("{}:", modified_label), format!("{}", summary.files_modified).cyan());
    println!(
        "Duplicates removed: {}",
        format!("{}", summary.duplicates_removed).red()
    );

    if summary.errors.is_empty() {
        println!("Errors:             {}", "0".green());
    } else {
        println!("Errors:             {}", format!("{}", summary.errors.len()).red());
        for failure in &summary.errors {
            println!("  {} {}: {}", "✗".red(), failure.path.display(), failure.error);
        }
    }
    println!("Elapsed:            {}", HumanDuration(summary.duration));

    info!(
        "Done: {} scanned, {} modified, {} duplicates removed, {} errors",
        summary.files_scanned,
        summary.files_modified,
        summary.duplicates_removed,
        summary.errors.len()
    );
}
