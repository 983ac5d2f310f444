//! Diffing the expected category structure against what is on disk.

pub mod report;
pub mod runner;
pub mod selection;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::{self, ExpectedSubcategory};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::scrape::ScrapeTarget;
use crate::videos;

pub use runner::{EntryOutcome, GapFinder, GapOptions, GapRunReport, PromptSelector, Selector};
pub use selection::{parse_selection, prompt_selection, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubcategoryStatus {
    Ok,
    FolderMissing,
    NoVideosJson,
    EmptyVideosJson,
    CorruptedVideosJson,
}

impl SubcategoryStatus {
    pub const ALL: [SubcategoryStatus; 5] = [
        SubcategoryStatus::Ok,
        SubcategoryStatus::FolderMissing,
        SubcategoryStatus::NoVideosJson,
        SubcategoryStatus::EmptyVideosJson,
        SubcategoryStatus::CorruptedVideosJson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubcategoryStatus::Ok => "ok",
            SubcategoryStatus::FolderMissing => "folder_missing",
            SubcategoryStatus::NoVideosJson => "no_videos_json",
            SubcategoryStatus::EmptyVideosJson => "empty_videos_json",
            SubcategoryStatus::CorruptedVideosJson => "corrupted_videos_json",
        }
    }

    pub fn is_gap(&self) -> bool {
        *self != SubcategoryStatus::Ok
    }
}

impl fmt::Display for SubcategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the subcategory directory `dir` plus the number of records its
/// video file holds (zero unless the file parsed).
pub fn classify_subcategory(dir: &Path, videos_file_name: &str) -> (SubcategoryStatus, usize) {
    if !dir.is_dir() {
        return (SubcategoryStatus::FolderMissing, 0);
    }
    let file = dir.join(videos_file_name);
    if !file.is_file() {
        return (SubcategoryStatus::NoVideosJson, 0);
    }
    let parsed = fs::read_to_string(&file)
        .map_err(Error::from)
        .and_then(|content| videos::parse_video_array(&file, &content));
    match parsed {
        Ok(records) if records.is_empty() => (SubcategoryStatus::EmptyVideosJson, 0),
        Ok(records) => (SubcategoryStatus::Ok, records.len()),
        Err(err) => {
            debug!("{}: {}", file.display(), err);
            (SubcategoryStatus::CorruptedVideosJson, 0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapEntry {
    pub category: String,
    pub subcategory: String,
    pub link: Option<String>,
    pub path: PathBuf,
    pub status: SubcategoryStatus,
    pub video_count: usize,
}

impl GapEntry {
    pub fn target(&self) -> ScrapeTarget {
        ScrapeTarget {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            link: self.link.clone(),
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for GapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.category, self.subcategory, self.status)
    }
}

/// Every expected subcategory with its status, in discovery order.
#[derive(Debug, Default)]
pub struct GapReport {
    pub entries: Vec<GapEntry>,
    pub metadata_errors: usize,
}

impl GapReport {
    pub fn gaps(&self) -> impl Iterator<Item = &GapEntry> {
        self.entries.iter().filter(|e| e.status.is_gap())
    }

    pub fn count(&self, status: SubcategoryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Count for every status, `ok` first.
    pub fn status_counts(&self) -> Vec<(SubcategoryStatus, usize)> {
        SubcategoryStatus::ALL
            .iter()
            .map(|status| (*status, self.count(*status)))
            .collect()
    }
}

pub fn classify_expected(expected: &[ExpectedSubcategory], videos_file_name: &str) -> Vec<GapEntry> {
    expected
        .iter()
        .map(|sub| {
            let (status, video_count) = classify_subcategory(&sub.path, videos_file_name);
            debug!("{}/{}: {} ({} videos)", sub.category, sub.subcategory, status, video_count);
            GapEntry {
                category: sub.category.clone(),
                subcategory: sub.subcategory.clone(),
                link: sub.link.clone(),
                path: sub.path.clone(),
                status,
                video_count,
            }
        })
        .collect()
}

pub fn find_gaps(root: &Path, config: &AppConfig) -> Result<GapReport> {
    if !root.is_dir() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }

    let tree = catalog::load_category_tree(root, config);
    info!(
        "{} subcategories declared under {}",
        tree.subcategories.len(),
        root.display()
    );

    let report = GapReport {
        entries: classify_expected(&tree.subcategories, &config.videos_file_name),
        metadata_errors: tree.errors.len(),
    };
    for (status, count) in report.status_counts() {
        info!("{}: {}", status, count);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify_each_status() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        for name in ["empty", "corrupt", "object", "nojson", "ok"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        fs::write(root.join("empty/videos.json"), "[]").unwrap();
        fs::write(root.join("corrupt/videos.json"), "[{\"url\":").unwrap();
        fs::write(root.join("object/videos.json"), r#"{"not":"an array"}"#).unwrap();
        fs::write(root.join("ok/videos.json"), r#"[{"url":"a"},{"url":"b"}]"#).unwrap();

        let classify = |name: &str| classify_subcategory(&root.join(name), "videos.json");
        assert_eq!(classify("missing"), (SubcategoryStatus::FolderMissing, 0));
        assert_eq!(classify("nojson"), (SubcategoryStatus::NoVideosJson, 0));
        assert_eq!(classify("empty"), (SubcategoryStatus::EmptyVideosJson, 0));
        assert_eq!(classify("corrupt"), (SubcategoryStatus::CorruptedVideosJson, 0));
        assert_eq!(classify("object"), (SubcategoryStatus::CorruptedVideosJson, 0));
        assert_eq!(classify("ok"), (SubcategoryStatus::Ok, 2));
    }

    #[test]
    fn test_file_in_place_of_folder_is_missing() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("sub"), "").unwrap();
        assert_eq!(
            classify_subcategory(&tmp.path().join("sub"), "videos.json").0,
            SubcategoryStatus::FolderMissing
        );
    }

    #[test]
    fn test_status_labels() {
        let labels: Vec<_> = SubcategoryStatus::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "ok",
                "folder_missing",
                "no_videos_json",
                "empty_videos_json",
                "corrupted_videos_json"
            ]
        );
        assert!(!SubcategoryStatus::Ok.is_gap());
        assert!(SubcategoryStatus::EmptyVideosJson.is_gap());
    }
}
