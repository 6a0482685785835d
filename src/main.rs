//! crimedash - crime incident dashboard for municipal open data
//!
//! A CLI tool that fetches a sample of reported crime incidents from a
//! Socrata open-data endpoint, aggregates them by crime type, area and
//! month, and renders charts, a table, or a Markdown/JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, data retrieval, output, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{DashboardReport, RawRecord, ReportMetadata};
use report::DashboardState;
use source::{OpenDataClient, SourceConfig};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shown to the user when records cannot be retrieved.
const RETRIEVAL_FAILED_MESSAGE: &str = "Failed to load crime data. Please try again later.";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {:#}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(&args, &config);

    info!("crimedash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_dashboard(&args, &config).await {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .crimedash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the endpoint, sample size and display options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so rendered output on stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate and render. Retrieval errors stop the pipeline before aggregation.
async fn run_dashboard(args: &Args, config: &Config) -> Result<()> {
    let (records, metadata) = match load_records(args, config).await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Data retrieval failed: {:#}", anyhow::Error::from(e));
            eprintln!("{}", RETRIEVAL_FAILED_MESSAGE);
            std::process::exit(1);
        }
    };

    let summary = analysis::aggregate(&records);
    info!(
        "Aggregated {} records ({} undated)",
        summary.total_processed,
        summary.undated()
    );

    let report = DashboardReport { metadata, summary };

    let output = match config.general.format {
        OutputFormat::Text => {
            let state = DashboardState::new(&config.display, args.page);
            report::render_dashboard(&state, &records, &report.summary)
        }
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &records, config.display.table_limit)
        }
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Get the record batch from --input or the open-data API.
async fn load_records(
    args: &Args,
    config: &Config,
) -> Result<(Vec<RawRecord>, ReportMetadata), source::SourceError> {
    if let Some(ref input) = args.input {
        let records = source::load_records_from_file(input)?;
        let metadata = ReportMetadata {
            source: input.display().to_string(),
            generated_at: Utc::now(),
            records_loaded: records.len(),
            requested_limit: None,
        };
        return Ok((records, metadata));
    }

    let source_config = SourceConfig {
        show_progress: !args.quiet,
        ..SourceConfig::from(&config.source)
    };
    let client = OpenDataClient::new(source_config)?;
    let records = client.fetch_records().await?;

    if let Some(ref path) = args.save_raw {
        if let Err(e) = source::save_records(path, &records) {
            warn!("Could not save raw records to {}: {}", path.display(), e);
        }
    }

    let metadata = ReportMetadata {
        source: config.source.endpoint.clone(),
        generated_at: Utc::now(),
        records_loaded: records.len(),
        requested_limit: Some(config.source.sample_size),
    };

    Ok((records, metadata))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
