use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use vidtidy::gaps::GapEntry;
use vidtidy::{ProgressReporter, ScrapeOutcome};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (number of files unknown upfront)
/// - File phase: progress bar over the files found
/// - Scrape phase: one spinner per subcategory
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        self.set_bar(Self::spinner("Looking for files...".to_string()));
    }

    fn on_scan_complete(&self, files_found: usize) {
        self.finish_bar();
        let pb = ProgressBar::new(files_found as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Deduplicating [{bar:30.cyan/dim}] {pos}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        self.set_bar(pb);
    }

    fn on_file_start(&self, index: usize, _total: usize, _path: &Path) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(index as u64);
            }
        }
    }

    fn on_files_complete(&self, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Files processed in {:.2}s",
            duration_secs
        );
    }

    fn on_scrape_start(&self, index: usize, total: usize, entry: &GapEntry) {
        self.set_bar(Self::spinner(format!(
            "Scraping {}/{} ({}/{})",
            entry.category, entry.subcategory, index, total
        )));
    }

    fn on_scrape_complete(&self, entry: &GapEntry, outcome: &ScrapeOutcome) {
        self.finish_bar();
        let mark = if outcome.is_success() {
            "\x1b[32m✓\x1b[0m"
        } else {
            "\x1b[31m✗\x1b[0m"
        };
        eprintln!("  {} {}/{}: {}", mark, entry.category, entry.subcategory, outcome);
    }
}
