use serde::Serialize;
use std::path::Path;

use super::runner::GapRunReport;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    index: usize,
    category: &'a str,
    subcategory: &'a str,
    status: &'a str,
    video_count: usize,
    path: String,
    link: &'a str,
    outcome: String,
    attempts: u32,
}

/// One row per gap. Outcome columns are blank for gaps that were not scraped.
pub fn write_csv_report(path: &Path, run: &GapRunReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for (i, gap) in run.report.gaps().enumerate() {
        let scraped = run.outcomes.iter().find(|o| o.entry.path == gap.path);
        writer.serialize(ReportRow {
            index: i + 1,
            category: &gap.category,
            subcategory: &gap.subcategory,
            status: gap.status.as_str(),
            video_count: gap.video_count,
            path: gap.path.to_string_lossy().into_owned(),
            link: gap.link.as_deref().unwrap_or(""),
            outcome: scraped.map(|o| o.outcome.to_string()).unwrap_or_default(),
            attempts: scraped.map(|o| o.attempts).unwrap_or(0),
        })?;
    }

    writer.flush()?;
    Ok(())
}
