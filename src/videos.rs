//! Reading and writing `videos.json` files.
//!
//! A video file is a JSON array. Elements are normally objects carrying a URL
//! field plus whatever metadata the scraper recorded; anything else is kept
//! as-is. Field order inside each object survives a load/write cycle.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoRecord(pub Value);

impl VideoRecord {
    /// The URL stored under `field`. Missing, null or non-string values read as
    /// an empty URL.
    pub fn url<'a>(&'a self, field: &str) -> &'a str {
        self.0.get(field).and_then(Value::as_str).unwrap_or("")
    }
}

/// Layout details of a file on disk, reused when it is written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLayout {
    pub indent: String,
    pub trailing_newline: bool,
}

#[derive(Debug, Clone)]
pub struct VideoFile {
    pub path: PathBuf,
    pub records: Vec<VideoRecord>,
    pub layout: JsonLayout,
}

/// Parse `content` as a video array. Anything that is not a JSON array is a
/// parse error.
pub fn parse_video_array(path: &Path, content: &str) -> Result<Vec<VideoRecord>> {
    let value: Value = serde_json::from_str(content).map_err(|e| Error::parse(path, e))?;
    match value {
        Value::Array(items) => Ok(items.into_iter().map(VideoRecord).collect()),
        other => Err(Error::parse(
            path,
            format!("expected a JSON array, found {}", json_kind(&other)),
        )),
    }
}

pub fn load_video_file(path: &Path, fallback_indent: usize) -> Result<VideoFile> {
    let content = fs::read_to_string(path)?;
    let records = parse_video_array(path, &content)?;
    let layout = JsonLayout {
        indent: detect_indent(&content).unwrap_or_else(|| " ".repeat(fallback_indent)),
        trailing_newline: content.ends_with('\n'),
    };
    Ok(VideoFile {
        path: path.to_path_buf(),
        records,
        layout,
    })
}

/// Indentation of the first indented line, if the file has one.
pub fn detect_indent(content: &str) -> Option<String> {
    content.lines().skip(1).find_map(|line| {
        let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if indent.is_empty() || indent.len() == line.len() {
            None
        } else {
            Some(indent)
        }
    })
}

pub fn render_records(records: &[VideoRecord], layout: &JsonLayout) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(layout.indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| Error::Io(e.into()))?;
    if layout.trailing_newline {
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Replace `path` with `records` via a temporary file in the same directory
/// renamed over the original. Readers see either the old or the new content.
pub fn write_video_file(path: &Path, records: &[VideoRecord], layout: &JsonLayout) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let bytes = render_records(records, layout)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions()).map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// `videos.json` + `.backup` → `videos.json.backup`, next to the original.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Byte-for-byte copy of `path` to its backup location.
pub fn write_backup(path: &Path, suffix: &str) -> Result<PathBuf> {
    let backup = backup_path(path, suffix);
    fs::copy(path, &backup).map_err(|source| Error::Backup {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;
    Ok(backup)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
