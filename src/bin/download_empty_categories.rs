mod common;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::*;
use common::CliReporter;
use dotenv::dotenv;
use indicatif::HumanDuration;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use vidtidy::gaps::{report, GapReport, PromptSelector};
use vidtidy::{config, logging, CommandScraper, GapFinder, GapOptions, GapRunReport, SubcategoryStatus};

#[derive(Debug, Parser)]
#[command(name = "download_empty_categories")]
#[command(about = "Find missing or empty subcategories and scrape them", long_about = None)]
struct Cli {
    /// Directory holding the category tree
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,
    /// Scrape every gap without asking
    #[arg(long)]
    auto: bool,
    /// List the gaps and exit
    #[arg(long)]
    dry_run: bool,
    /// Scrape at most this many subcategories
    #[arg(long)]
    limit: Option<usize>,
    /// Write the gap list and scrape outcomes to this CSV file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger("logs/download_empty_categories.log");

    let args = Cli::parse();
    info!("Run started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let config = config::load_configuration().context("Error loading configuration")?;

    let options = GapOptions {
        root: args.root_dir,
        auto: args.auto,
        dry_run: args.dry_run,
        limit: args.limit,
    };
    let scraper = CommandScraper::from_config(&config.scraper);
    let mut selector = PromptSelector::new(io::stdin().lock(), io::stdout());
    let reporter = CliReporter::new();

    let run = GapFinder::new(config).run(&options, &scraper, &mut selector, &reporter)?;

    print_summary(&run);

    if let Some(path) = &args.report {
        match report::write_csv_report(path, &run) {
            Ok(()) => info!("Report written to {}", path.display()),
            Err(err) => error!("Failed to write report {}: {}", path.display(), err),
        }
    }
    Ok(())
}

fn print_status_counts(report: &GapReport) {
    println!("Subcategory status:");
    for (status, count) in report.status_counts() {
        let count = format!("{}", count);
        let count = match status {
            SubcategoryStatus::Ok => count.green(),
            _ if count == "0" => count.normal(),
            _ => count.red(),
        };
        println!("  {:<24}{}", status.as_str(), count);
    }
    if report.metadata_errors > 0 {
        println!(
            "  {:<24}{}",
            "unreadable metadata",
            format!("{}", report.metadata_errors).red()
        );
    }
}

fn print_summary(run: &GapRunReport) {
    println!();
    println!("{}", "=".repeat(60));
    print_status_counts(&run.report);

    if run.dry_run {
        println!();
        println!("{}", "DRY RUN - would scrape:".yellow());
        for (i, gap) in run.report.gaps().enumerate() {
            println!(
                "{:>4}. {}/{} [{}]",
                i + 1,
                gap.category,
                gap.subcategory,
                gap.status
            );
        }
        return;
    }

    if run.aborted {
        println!("{}", "Aborted, nothing scraped".yellow());
        return;
    }

    if run.outcomes.is_empty() {
        println!("{}", "Nothing to scrape".green());
        return;
    }

    println!();
    for outcome in &run.outcomes {
        let label = match outcome.outcome.label() {
            "success" => "success".green(),
            other => other.red(),
        };
        println!(
            "  {}/{}: {} ({} attempt(s), {})",
            outcome.entry.category,
            outcome.entry.subcategory,
            label,
            outcome.attempts,
            HumanDuration(outcome.duration)
        );
    }

    println!();
    println!("Attempted:  {}", run.attempted());
    println!("Succeeded:  {}", format!("{}", run.succeeded()).green());
    println!("Failed:     {}", format!("{}", run.failed()).red());
    println!("  timeout:  {}", run.timed_out());
    println!("  error:    {}", run.errored());
    if let Some(rate) = run.success_rate() {
        println!("Success rate: {:.1}%", rate);
    }
    println!("Elapsed:    {}", HumanDuration(run.duration));
}
