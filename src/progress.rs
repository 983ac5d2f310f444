use std::path::Path;

use crate::gaps::GapEntry;
use crate::scrape::ScrapeOutcome;

/// Trait for reporting run progress.
///
/// The binaries implement it with indicatif bars; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _files_found: usize) {}
    fn on_file_start(&self, _index: usize, _total: usize, _path: &Path) {}
    fn on_files_complete(&self, _duration_secs: f64) {}
    fn on_scrape_start(&self, _index: usize, _total: usize, _entry: &GapEntry) {}
    fn on_scrape_complete(&self, _entry: &GapEntry, _outcome: &ScrapeOutcome) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
