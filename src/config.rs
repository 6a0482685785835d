//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.crimedash.toml` files.

use crate::cli::{OutputFormat, ViewMode};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".crimedash.toml";

/// Widest chart bar accepted from settings.
pub const MAX_BAR_WIDTH: usize = 200;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Open-data source settings.
    #[serde(default)]
    pub source: SourceSettings,

    /// Rendering settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Where the incident sample comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Socrata dataset resource URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Number of records to request.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Only records reported on or after this timestamp.
    #[serde(default = "default_since")]
    pub since: String,

    /// Column used to filter and order by report date.
    #[serde(default = "default_date_field")]
    pub date_field: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Socrata app token (raises the anonymous rate limit).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_token: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            sample_size: default_sample_size(),
            since: default_since(),
            date_field: default_date_field(),
            timeout_seconds: default_timeout(),
            app_token: None,
        }
    }
}

fn default_endpoint() -> String {
    "https://data.lacity.org/resource/2nrs-mtv8.json".to_string()
}

fn default_sample_size() -> usize {
    5000
}

fn default_since() -> String {
    "2020-01-01T00:00:00".to_string()
}

fn default_date_field() -> String {
    crate::models::REPORTED_DATE_FIELD.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Dashboard rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Charts or table.
    #[serde(default)]
    pub view: ViewMode,

    /// Maximum number of records shown in the table view.
    #[serde(default = "default_table_limit")]
    pub table_limit: usize,

    /// Rows per table page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Width of the longest chart bar, in cells.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            view: ViewMode::default(),
            table_limit: default_table_limit(),
            page_size: default_page_size(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_table_limit() -> usize {
    100
}

fn default_page_size() -> usize {
    25
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.crimedash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref endpoint) = args.endpoint {
            self.source.endpoint = endpoint.clone();
        }
        if let Some(limit) = args.limit {
            self.source.sample_size = limit;
        }
        if let Some(ref since) = args.since {
            self.source.since = since.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(ref token) = args.app_token {
            self.source.app_token = Some(token.clone());
        }

        if let Some(view) = args.view {
            self.display.view = view;
        }
        if let Some(table_limit) = args.table_limit {
            self.display.table_limit = table_limit;
        }
        if let Some(page_size) = args.page_size {
            self.display.page_size = page_size;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the merged settings. File values get the same rules as CLI flags.
    pub fn validate(&self) -> Result<()> {
        let source = &self.source;
        if !source.endpoint.starts_with("http://") && !source.endpoint.starts_with("https://") {
            bail!(
                "source.endpoint must start with 'http://' or 'https://': {}",
                source.endpoint
            );
        }
        if source.sample_size == 0 {
            bail!("source.sample_size must be at least 1");
        }
        if source.timeout_seconds == 0 {
            bail!("source.timeout_seconds must be at least 1");
        }
        if !crate::cli::is_valid_since(&source.since) {
            bail!(
                "source.since '{}' is not YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
                source.since
            );
        }

        let display = &self.display;
        if display.table_limit == 0 {
            bail!("display.table_limit must be at least 1");
        }
        if display.page_size == 0 {
            bail!("display.page_size must be at least 1");
        }
        if display.bar_width == 0 || display.bar_width > MAX_BAR_WIDTH {
            bail!(
                "display.bar_width must be between 1 and {} (got {})",
                MAX_BAR_WIDTH,
                display.bar_width
            );
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
