use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::selection::{prompt_selection, Selection};
use super::{find_gaps, GapEntry, GapReport};
use crate::config::AppConfig;
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::scrape::{ScrapeOutcome, Scraper};

#[derive(Debug, Clone)]
pub struct GapOptions {
    pub root: PathBuf,
    pub auto: bool,
    pub dry_run: bool,
    /// Scrape at most this many of the selected entries.
    pub limit: Option<usize>,
}

/// Chooses which gaps to scrape when not running with `--auto`.
pub trait Selector {
    fn select(&mut self, gaps: &[GapEntry]) -> Result<Selection>;
}

/// Lists the gaps with 1-based indices and reads a selection expression.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Selector for PromptSelector<R, W> {
    fn select(&mut self, gaps: &[GapEntry]) -> Result<Selection> {
        writeln!(self.output)?;
        for (i, gap) in gaps.iter().enumerate() {
            writeln!(
                self.output,
                "{:>4}. {}/{} [{}]",
                i + 1,
                gap.category,
                gap.subcategory,
                gap.status
            )?;
        }
        Ok(prompt_selection(&mut self.input, &mut self.output, gaps.len())?)
    }
}

#[derive(Debug, Clone)]
pub struct EntryOutcome {
    pub entry: GapEntry,
    pub outcome: ScrapeOutcome,
    pub attempts: u32,
    pub duration: Duration,
}

/// Run context for one gap-filling pass.
#[derive(Debug, Default)]
pub struct GapRunReport {
    pub report: GapReport,
    pub selected: usize,
    pub outcomes: Vec<EntryOutcome>,
    pub dry_run: bool,
    pub aborted: bool,
    pub duration: Duration,
}

impl GapRunReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn timed_out(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == ScrapeOutcome::Timeout)
            .count()
    }

    pub fn errored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, ScrapeOutcome::Error(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Percentage of attempted scrapes that succeeded, if any were attempted.
    pub fn success_rate(&self) -> Option<f64> {
        match self.attempted() {
            0 => None,
            n => Some(self.succeeded() as f64 * 100.0 / n as f64),
        }
    }
}

pub struct GapFinder {
    config: AppConfig,
}

impl GapFinder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Classify, select and scrape.
    ///
    /// `selector` is only consulted in interactive mode. A scrape failure never
    /// stops the batch; only a missing root or a broken prompt is an error.
    pub fn run(
        &self,
        options: &GapOptions,
        scraper: &dyn Scraper,
        selector: &mut dyn Selector,
        reporter: &dyn ProgressReporter,
    ) -> Result<GapRunReport> {
        let start = Instant::now();
        let mut run = GapRunReport {
            report: find_gaps(&options.root, &self.config)?,
            dry_run: options.dry_run,
            ..Default::default()
        };
        let gaps: Vec<GapEntry> = run.report.gaps().cloned().collect();

        if gaps.is_empty() {
            info!("No missing or empty subcategories found");
            run.duration = start.elapsed();
            return Ok(run);
        }

        if options.dry_run {
            info!("[dry run] {} subcategories need scraping:", gaps.len());
            for (i, gap) in gaps.iter().enumerate() {
                debug!("  {}. {}", i + 1, gap);
            }
            run.duration = start.elapsed();
            return Ok(run);
        }

        let mut selected: Vec<GapEntry> = if options.auto {
            gaps
        } else {
            match selector.select(&gaps)? {
                Selection::Abort => {
                    info!("Aborted by operator, nothing scraped");
                    run.aborted = true;
                    run.duration = start.elapsed();
                    return Ok(run);
                }
                Selection::Indices(indices) => indices
                    .into_iter()
                    .filter_map(|i| i.checked_sub(1).and_then(|i| gaps.get(i)).cloned())
                    .collect(),
            }
        };

        if let Some(limit) = options.limit {
            if selected.len() > limit {
                info!("Limiting run to {} of {} selected subcategories", limit, selected.len());
                selected.truncate(limit);
            }
        }
        run.selected = selected.len();

        let timeout = Duration::from_secs(self.config.scraper.timeout_secs);
        let delay = Duration::from_secs(self.config.scraper.delay_secs);
        let total = selected.len();

        for (i, entry) in selected.into_iter().enumerate() {
            info!("[{}/{}] Scraping {}", i + 1, total, entry);
            reporter.on_scrape_start(i + 1, total, &entry);
            let outcome = self.scrape_entry(scraper, entry, timeout);
            reporter.on_scrape_complete(&outcome.entry, &outcome.outcome);
            run.outcomes.push(outcome);

            if i + 1 < total && !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        run.duration = start.elapsed();
        info!(
            "Scraped {}: {} succeeded, {} timed out, {} errored",
            run.attempted(),
            run.succeeded(),
            run.timed_out(),
            run.errored()
        );
        Ok(run)
    }

    fn scrape_entry(&self, scraper: &dyn Scraper, entry: GapEntry, timeout: Duration) -> EntryOutcome {
        let target = entry.target();
        let max_attempts = self.config.scraper.retries + 1;
        let start = Instant::now();
        let mut attempts = 0;

        let outcome = loop {
            attempts += 1;
            match scraper.scrape(&target, timeout) {
                ScrapeOutcome::Error(detail) if attempts < max_attempts => warn!(
                    "{} failed (attempt {}/{}): {}, retrying",
                    target, attempts, max_attempts, detail
                ),
                outcome => break outcome,
            }
        };
        match outcome.clone().into_result(&target, timeout) {
            Ok(()) => info!("{} scraped", target),
            Err(err) => error!("{}", err),
        }

        EntryOutcome {
            entry,
            outcome,
            attempts,
            duration: start.elapsed(),
        }
    }
}
