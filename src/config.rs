use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashSet;

/// Settings shared by both binaries.
///
/// Every field has a default, so an absent `Config.toml` is fine. Values can be
/// overridden with `VIDTIDY_*` environment variables, nested keys joined by `__`
/// (e.g. `VIDTIDY_SCRAPER__TIMEOUT_SECS=600`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub url_field: String,
    pub placeholder_urls: Vec<String>,
    pub videos_file_name: String,
    pub metadata_file_name: String,
    pub backup_suffix: String,
    pub json_indent: usize,
    pub ignore_patterns: Vec<String>,
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub program: String,
    /// Argument template. `{category}`, `{subcategory}`, `{link}`, `{path}` and
    /// `{timeout}` are substituted per invocation.
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub delay_secs: u64,
    /// Extra attempts after a failed (not timed out) scrape.
    pub retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url_field: "url".to_string(),
            placeholder_urls: Vec::new(),
            videos_file_name: "videos.json".to_string(),
            metadata_file_name: "metadata.json".to_string(),
            backup_suffix: ".backup".to_string(),
            json_indent: 2,
            ignore_patterns: Vec::new(),
            scraper: ScraperConfig::default(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: [
                "auto_scraper.py",
                "--category",
                "{category}",
                "--subcategory",
                "{subcategory}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout_secs: 1800,
            delay_secs: 3,
            retries: 0,
        }
    }
}

impl AppConfig {
    pub fn placeholder_set(&self) -> HashSet<String> {
        self.placeholder_urls.iter().cloned().collect()
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("VIDTIDY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("placeholder_urls")
                .with_list_parse_key("ignore_patterns")
                .with_list_parse_key("scraper.args")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
