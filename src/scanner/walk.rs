use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

pub fn compile_ignore_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Recursive walk from `root` collecting every regular file called `file_name`.
///
/// Entries are visited in file-name order so results are stable between runs.
/// Directories matching an ignore pattern are not descended into. Unreadable
/// entries are logged and skipped.
pub fn find_files_named(root: &Path, file_name: &str, ignore_patterns: &[Pattern]) -> Vec<PathBuf> {
    let is_ignored = |path: &Path| ignore_patterns.iter().any(|p| p.matches_path(path));

    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_files_named_sorted_and_filtered() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/nested/videos.json"), "[]").unwrap();
        fs::write(root.join("a/videos.json"), "[]").unwrap();
        fs::write(root.join("a/videos.csv"), "").unwrap();

        let found = find_files_named(root, "videos.json", &[]);
        assert_eq!(
            found,
            vec![root.join("a/videos.json"), root.join("b/nested/videos.json")]
        );
    }

    #[test]
    fn test_ignore_patterns_prune_directories() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::create_dir_all(root.join("archive/old")).unwrap();
        fs::write(root.join("keep/videos.json"), "[]").unwrap();
        fs::write(root.join("archive/old/videos.json"), "[]").unwrap();

        let patterns = compile_ignore_patterns(&["**/archive".to_string(), "[".to_string()]);
        assert_eq!(patterns.len(), 1);

        let found = find_files_named(root, "videos.json", &patterns);
        assert_eq!(found, vec![root.join("keep/videos.json")]);
    }
}
