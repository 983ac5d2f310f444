use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::scanner;
use crate::videos::{self, VideoRecord};

/// Which record field holds the URL and which URL values are placeholders.
/// The empty string is always a placeholder.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    pub url_field: String,
    pub placeholders: HashSet<String>,
}

impl UrlPolicy {
    pub fn new(url_field: impl Into<String>, placeholders: HashSet<String>) -> Self {
        Self {
            url_field: url_field.into(),
            placeholders,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.url_field.clone(), config.placeholder_set())
    }

    pub fn is_placeholder(&self, url: &str) -> bool {
        url.is_empty() || self.placeholders.contains(url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome {
    pub records: Vec<VideoRecord>,
    pub removed: usize,
    /// URLs that occurred more than once with their total occurrence count, in
    /// order of first appearance.
    pub duplicate_urls: Vec<(String, usize)>,
}

/// Keep the first record for every real URL and every placeholder record.
pub fn dedupe_records(records: Vec<VideoRecord>, policy: &UrlPolicy) -> DedupeOutcome {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut occurrences: Vec<(String, usize)> = Vec::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut removed = 0;

    for record in records {
        let url = record.url(&policy.url_field);
        if policy.is_placeholder(url) {
            kept.push(record);
            continue;
        }
        match seen.get(url) {
            Some(&slot) => {
                occurrences[slot].1 += 1;
                removed += 1;
            }
            None => {
                seen.insert(url.to_string(), occurrences.len());
                occurrences.push((url.to_string(), 1));
                kept.push(record);
            }
        }
    }

    occurrences.retain(|(_, count)| *count > 1);

    DedupeOutcome {
        records: kept,
        removed,
        duplicate_urls: occurrences,
    }
}

#[derive(Debug, Clone)]
pub struct DedupeOptions {
    pub root: PathBuf,
    pub dry_run: bool,
    pub backup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// No duplicates; the file was not touched.
    Unchanged,
    /// Duplicates found in dry-run mode; nothing written.
    WouldRewrite,
    Rewritten { backup: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub records_before: usize,
    pub records_after: usize,
    pub duplicates_removed: usize,
    pub duplicate_urls: Vec<(String, usize)>,
    pub action: FileAction,
}

#[derive(Debug)]
pub struct FileError {
    pub path: PathBuf,
    pub error: Error,
}

/// Run context for one deduplication pass.
#[derive(Debug, Default)]
pub struct DedupeSummary {
    pub files_scanned: usize,
    /// Files rewritten, or that would be rewritten in dry-run mode.
    pub files_modified: usize,
    pub duplicates_removed: usize,
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
    pub duration: Duration,
}

impl DedupeSummary {
    fn record(&mut self, report: FileReport) {
        if report.duplicates_removed > 0 {
            self.files_modified += 1;
            self.duplicates_removed += report.duplicates_removed;
        }
        self.files.push(report);
    }
}

pub struct Deduplicator {
    config: AppConfig,
    policy: UrlPolicy,
}

impl Deduplicator {
    pub fn new(config: AppConfig) -> Self {
        let policy = UrlPolicy::from_config(&config);
        Self { config, policy }
    }

    /// Deduplicate every video file under `options.root`.
    ///
    /// Only a missing root is an error; problems with individual files end up
    /// in `DedupeSummary::errors` and the run carries on.
    pub fn run(
        &self,
        options: &DedupeOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<DedupeSummary> {
        if !options.root.is_dir() {
            return Err(Error::RootNotFound(options.root.clone()));
        }
        let start = Instant::now();

        info!(
            "Scanning {} for {} files (dry run: {}, backup: {})",
            options.root.display(),
            self.config.videos_file_name,
            options.dry_run,
            options.backup
        );
        reporter.on_scan_start();
        let ignore = scanner::compile_ignore_patterns(&self.config.ignore_patterns);
        let files = scanner::find_files_named(&options.root, &self.config.videos_file_name, &ignore);
        reporter.on_scan_complete(files.len());
        info!("Found {} files", files.len());

        let mut summary = DedupeSummary::default();
        for (index, path) in files.iter().enumerate() {
            reporter.on_file_start(index + 1, files.len(), path);
            summary.files_scanned += 1;
            match self.process_file(path, options) {
                Ok(report) => summary.record(report),
                Err(err) => {
                    error!("Skipping {}: {}", path.display(), err);
                    summary.errors.push(FileError {
                        path: path.clone(),
                        error: err,
                    });
                }
            }
        }

        summary.duration = start.elapsed();
        reporter.on_files_complete(summary.duration.as_secs_f64());
        Ok(summary)
    }

    fn process_file(&self, path: &Path, options: &DedupeOptions) -> Result<FileReport> {
        let file = videos::load_video_file(path, self.config.json_indent)?;
        let records_before = file.records.len();
        let outcome = dedupe_records(file.records, &self.policy);

        let mut report = FileReport {
            path: path.to_path_buf(),
            records_before,
            records_after: outcome.records.len(),
            duplicates_removed: outcome.removed,
            duplicate_urls: outcome.duplicate_urls,
            action: FileAction::Unchanged,
        };

        if report.duplicates_removed == 0 {
            debug!("{}: {} records, no duplicates", path.display(), records_before);
            return Ok(report);
        }

        for (url, count) in &report.duplicate_urls {
            debug!("{}: {} appears {} times", path.display(), url, count);
        }

        if options.dry_run {
            info!(
                "[dry run] {}: would remove {} duplicates ({} -> {} records)",
                path.display(),
                report.duplicates_removed,
                records_before,
                report.records_after
            );
            report.action = FileAction::WouldRewrite;
            return Ok(report);
        }

        let backup = if options.backup {
            let backup = videos::write_backup(path, &self.config.backup_suffix)?;
            info!("Backed up {} to {}", path.display(), backup.display());
            Some(backup)
        } else {
            None
        };

        videos::write_video_file(path, &outcome.records, &file.layout)?;
        info!(
            "{}: removed {} duplicates ({} -> {} records)",
            path.display(),
            report.duplicates_removed,
            records_before,
            report.records_after
        );
        report.action = FileAction::Rewritten { backup };
        Ok(report)
    }
}
