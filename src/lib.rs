//! Maintenance tools for a scraped video-metadata tree: URL deduplication of
//! `videos.json` files and detection/refill of missing subcategories.

pub mod catalog;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod gaps;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod scrape;
pub mod videos;

pub use config::AppConfig;
pub use dedupe::{DedupeOptions, DedupeSummary, Deduplicator};
pub use error::{Error, Result};
pub use gaps::{GapFinder, GapOptions, GapRunReport, SubcategoryStatus};
pub use progress::{ProgressReporter, SilentReporter};
pub use scrape::{CommandScraper, ScrapeOutcome, ScrapeTarget, Scraper};
