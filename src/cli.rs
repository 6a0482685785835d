//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// crimedash - crime incident dashboard for municipal open data
///
/// Fetches a sample of reported crime incidents from a Socrata open-data
/// endpoint and summarizes them by crime type, area and month.
///
/// Examples:
///   crimedash
///   crimedash --view table --page 2
///   crimedash --limit 20000 --since 2023-01-01 --format markdown -o report.md
///   crimedash --input saved.json --format json
///   crimedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// How to present the dashboard (charts, table)
    #[arg(long, value_name = "VIEW")]
    pub view: Option<ViewMode>,

    /// Output format (text, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Read records from a JSON file instead of the API
    ///
    /// The file must hold a JSON array of objects, as returned by the
    /// endpoint or written by --save-raw.
    #[arg(long, value_name = "FILE", conflicts_with = "save_raw")]
    pub input: Option<PathBuf>,

    /// Save the fetched records to a JSON file
    #[arg(long, value_name = "FILE")]
    pub save_raw: Option<PathBuf>,

    /// Number of records to request from the API
    #[arg(long, value_name = "COUNT", env = "CRIMEDASH_LIMIT")]
    pub limit: Option<usize>,

    /// Only fetch records reported on or after this date
    ///
    /// Accepts YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS.
    #[arg(long, value_name = "DATE")]
    pub since: Option<String>,

    /// Socrata dataset endpoint URL
    #[arg(long, value_name = "URL", env = "CRIMEDASH_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Socrata app token
    #[arg(long, value_name = "TOKEN", env = "CRIMEDASH_APP_TOKEN", hide_env_values = true)]
    pub app_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of records shown in the table view
    #[arg(long, value_name = "ROWS")]
    pub table_limit: Option<usize>,

    /// Table page to show (1-indexed)
    #[arg(long, default_value = "1", value_name = "PAGE")]
    pub page: usize,

    /// Rows per table page
    #[arg(long, value_name = "ROWS")]
    pub page_size: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .crimedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .crimedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Which dashboard view to render.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Bar charts of the summary views (default)
    #[default]
    Charts,
    /// Paginated table of raw records
    Table,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Terminal text (default)
    #[default]
    Text,
    /// Markdown report
    Markdown,
    /// JSON summary
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1".to_string());
        }

        if let Some(ref since) = self.since {
            if !is_valid_since(since) {
                return Err(format!(
                    "Invalid --since value '{}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
                    since
                ));
            }
        }

        if self.page == 0 {
            return Err("Page must be at least 1".to_string());
        }

        if self.table_limit == Some(0) {
            return Err("Table limit must be at least 1".to_string());
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Accepts `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn is_valid_since(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
