use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use vidtidy::dedupe::FileAction;
use vidtidy::{AppConfig, DedupeOptions, Deduplicator, Error, SilentReporter};

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn options(root: &Path, dry_run: bool, backup: bool) -> DedupeOptions {
    DedupeOptions {
        root: root.to_path_buf(),
        dry_run,
        backup,
    }
}

fn count_files_named(dir: &Path, suffix: &str) -> usize {
    let mut count = 0;
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += count_files_named(&path, suffix);
            } else if path.to_string_lossy().ends_with(suffix) {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_scenario_from_single_file() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("Nature/Oceans/videos.json");
    write_json(
        &file,
        &json!([{"url": "a"}, {"url": "b"}, {"url": "a"}, {"url": ""}]),
    );

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(tmp.path(), false, false), &SilentReporter)
        .unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.files_modified, 1);
    assert_eq!(summary.duplicates_removed, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(
        read_json(&file),
        json!([{"url": "a"}, {"url": "b"}, {"url": ""}])
    );
    assert_eq!(summary.files[0].action, FileAction::Rewritten { backup: None });
}

#[test]
fn test_backup_holds_original_bytes() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("Cat/Sub/videos.json");
    let original = "[{\"url\": \"x\", \"title\": \"one\"}, {\"url\": \"x\", \"title\": \"two\"}]";
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, original).unwrap();

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(tmp.path(), false, true), &SilentReporter)
        .unwrap();

    let backup = tmp.path().join("Cat/Sub/videos.json.backup");
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    assert_eq!(
        summary.files[0].action,
        FileAction::Rewritten {
            backup: Some(backup.clone())
        }
    );
    assert_eq!(read_json(&file), json!([{"url": "x", "title": "one"}]));
}

#[test]
fn test_unchanged_files_are_not_touched() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("Cat/Sub/videos.json");
    let original = "[{\"url\":\"a\"},{\"url\":\"b\"},{\"url\":\"\"},{\"url\":\"\"}]";
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, original).unwrap();
    let modified_before = fs::metadata(&file).unwrap().modified().unwrap();

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(tmp.path(), false, true), &SilentReporter)
        .unwrap();

    assert_eq!(summary.files_modified, 0);
    assert_eq!(summary.files[0].action, FileAction::Unchanged);
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
    assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), modified_before);
    assert_eq!(count_files_named(tmp.path(), ".backup"), 0);
}

#[test]
fn test_parse_errors_are_counted_and_skipped() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("a/videos.json"), r#"{"not":"an array"}"#).unwrap();
    fs::write(root.join("b/videos.json"), "[{\"url\": \"z\"}, {\"url\": \"z\"}]").unwrap();

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(root, false, false), &SilentReporter)
        .unwrap();

    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].path, root.join("a/videos.json"));
    assert!(matches!(summary.errors[0].error, Error::Parse { .. }));
    assert_eq!(summary.files_modified, 1);
    assert_eq!(read_json(&root.join("b/videos.json")), json!([{"url": "z"}]));
    assert_eq!(
        fs::read_to_string(root.join("a/videos.json")).unwrap(),
        r#"{"not":"an array"}"#
    );
}

#[test]
fn test_configured_placeholders_and_field() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("Cat/Sub/videos.json");
    write_json(
        &file,
        &json!([
            {"video_url": "PENDING", "title": "1"},
            {"video_url": "https://v/1", "title": "2"},
            {"video_url": "PENDING", "title": "3"},
            {"video_url": "https://v/1", "title": "4"},
            {"title": "5"},
            {"title": "6"}
        ]),
    );

    let config = AppConfig {
        url_field: "video_url".to_string(),
        placeholder_urls: vec!["PENDING".to_string()],
        ..AppConfig::default()
    };
    let summary = Deduplicator::new(config)
        .run(&options(tmp.path(), false, false), &SilentReporter)
        .unwrap();

    assert_eq!(summary.duplicates_removed, 1);
    let titles: Vec<String> = read_json(&file)
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["1", "2", "3", "5", "6"]);
}

#[test]
fn test_missing_root_is_fatal() {
    let tmp = tempdir().unwrap();
    let missing: PathBuf = tmp.path().join("nope");

    let err = Deduplicator::new(AppConfig::default())
        .run(&options(&missing, false, false), &SilentReporter)
        .unwrap_err();
    assert!(matches!(err, Error::RootNotFound(_)));
}

#[cfg(unix)]
#[test]
fn test_backup_failure_leaves_original() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("Cat/Sub/videos.json");
    let original = "[{\"url\": \"x\"}, {\"url\": \"x\"}]";
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, original).unwrap();
    // A directory where the backup file should go makes the copy fail.
    fs::create_dir_all(tmp.path().join("Cat/Sub/videos.json.backup")).unwrap();

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(tmp.path(), false, true), &SilentReporter)
        .unwrap();

    assert_eq!(summary.errors.len(), 1);
    assert!(matches!(summary.errors[0].error, Error::Backup { .. }));
    assert_eq!(summary.files_modified, 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[cfg(unix)]
#[test]
fn test_write_failure_leaves_original() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("Cat/Sub");
    let file = dir.join("videos.json");
    let original = "[{\"url\": \"x\"}, {\"url\": \"x\"}]";
    fs::create_dir_all(&dir).unwrap();
    fs::write(&file, original).unwrap();
    // No temporary file can be created next to the original.
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();
    if tempfile::NamedTempFile::new_in(&dir).is_ok() {
        // Running as root ignores directory permissions.
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let summary = Deduplicator::new(AppConfig::default())
        .run(&options(tmp.path(), false, false), &SilentReporter);
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
    let summary = summary.unwrap();

    assert_eq!(summary.errors.len(), 1);
    assert!(matches!(summary.errors[0].error, Error::Write { .. }));
    assert_eq!(summary.files_modified, 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}
