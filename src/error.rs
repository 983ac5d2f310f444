use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Parse error in {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("Backup of {} to {} failed: {source}", path.display(), backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write of {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scrape of {target} timed out after {timeout_secs}s")]
    ScrapeTimeout { target: String, timeout_secs: u64 },

    #[error("Scrape of {target} failed: {detail}")]
    ScrapeFailure { target: String, detail: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Report error: {0}")]
    Report(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}
