//! Open-data API client.
//!
//! Fetches one sample of incident records from a Socrata (SODA) dataset
//! with a single GET request, and reads or writes the same JSON shape
//! from disk.

use crate::models::RawRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from loading a batch of records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request did not finish within the configured timeout.
    #[error("request timed out after {seconds}s")]
    Timeout {
        seconds: u64,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint could not be reached at all.
    #[error("cannot connect to {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any other transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("open-data API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an array of objects.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Reading or writing a record file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings for one fetch.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Dataset resource URL, e.g. `https://data.lacity.org/resource/2nrs-mtv8.json`.
    pub endpoint: String,
    /// Number of rows requested (`$limit`).
    pub sample_size: usize,
    /// Only rows reported on or after this floating timestamp.
    pub since: String,
    /// Column used for filtering and ordering.
    pub date_field: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Optional Socrata app token, sent as `X-App-Token`.
    pub app_token: Option<String>,
    /// Show a spinner while waiting.
    pub show_progress: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::from(&crate::config::SourceSettings::default())
    }
}

impl From<&crate::config::SourceSettings> for SourceConfig {
    fn from(settings: &crate::config::SourceSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            sample_size: settings.sample_size,
            since: settings.since.clone(),
            date_field: settings.date_field.clone(),
            timeout_seconds: settings.timeout_seconds,
            app_token: settings.app_token.clone(),
            show_progress: false,
        }
    }
}

/// Client for a single open-data dataset.
pub struct OpenDataClient {
    config: SourceConfig,
    http_client: reqwest::Client,
}

impl OpenDataClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("crimedash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// SODA query parameters for the sample request.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("$limit", self.config.sample_size.to_string()),
            (
                "$where",
                format!("{} >= '{}'", self.config.date_field, self.config.since),
            ),
            ("$order", format!("{} DESC", self.config.date_field)),
        ]
    }

    /// Fetch the record sample. One request, no retry.
    pub async fn fetch_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        info!(
            "Fetching up to {} records from {}",
            self.config.sample_size, self.config.endpoint
        );

        let spinner = self.config.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Fetching crime data...");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let result = self.request().await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let records = result?;
        info!("Fetched {} records", records.len());
        Ok(records)
    }

    async fn request(&self) -> Result<Vec<RawRecord>, SourceError> {
        let mut request = self
            .http_client
            .get(&self.config.endpoint)
            .query(&self.query_params());

        if let Some(ref token) = self.config.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout {
                    seconds: self.config.timeout_seconds,
                    source: e,
                }
            } else if e.is_connect() {
                SourceError::Connect {
                    endpoint: self.config.endpoint.clone(),
                    source: e,
                }
            } else {
                SourceError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let body = response.text().await?;
        debug!("Received {} bytes", body.len());
        decode_records(&body)
    }
}

/// Decode a JSON array of objects into records.
pub fn decode_records(body: &str) -> Result<Vec<RawRecord>, SourceError> {
    let value: Value = serde_json::from_str(body)?;

    let Value::Array(items) = value else {
        return Err(SourceError::UnexpectedShape(
            "expected a JSON array of records".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(RawRecord::new(fields)),
            other => Err(SourceError::UnexpectedShape(format!(
                "record {} is not an object: {}",
                i, other
            ))),
        })
        .collect()
}

/// Load records previously saved as a JSON array.
pub fn load_records_from_file(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    info!("Loading records from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    decode_records(&content)
}

/// Save records as a pretty-printed JSON array.
pub fn save_records(path: &Path, records: &[RawRecord]) -> Result<(), SourceError> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Answer exactly one HTTP request, reporting its request line.
    fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&buf).to_string();
            let _ = tx.send(request);
            stream.write_all(response.as_bytes()).unwrap();
        });

        (format!("http://{}/resource/test.json", addr), rx)
    }

    fn config_for(endpoint: String) -> SourceConfig {
        SourceConfig {
            endpoint,
            sample_size: 5,
            timeout_seconds: 5,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_fetch_records_success() {
        let body = r#"[{"dr_no":"1","crm_cd_desc":"THEFT","area_name":"Central","date_rptd":"2021-03-15T00:00:00.000"},{"dr_no":"2"}]"#;
        let (endpoint, requests) = serve_once("200 OK", body);
        let client = OpenDataClient::new(config_for(endpoint)).unwrap();

        let records = tokio_test::block_on(client.fetch_records()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category(), "THEFT");
        assert_eq!(records[1].category(), "Unknown");

        let request = requests.recv().unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /resource/test.json?"));
        assert!(request_line.contains("limit=5"));
        assert!(request_line.contains("date_rptd+DESC"));
    }

    #[test]
    fn test_fetch_records_sends_app_token() {
        let (endpoint, requests) = serve_once("200 OK", "[]");
        let mut config = config_for(endpoint);
        config.app_token = Some("secret-token".to_string());
        let client = OpenDataClient::new(config).unwrap();

        let records = tokio_test::block_on(client.fetch_records()).unwrap();
        assert!(records.is_empty());

        let request = requests.recv().unwrap().to_lowercase();
        assert!(request.contains("x-app-token: secret-token"));
    }

    #[test]
    fn test_fetch_records_error_status() {
        let (endpoint, _requests) = serve_once("503 Service Unavailable", r#"{"error":"down"}"#);
        let client = OpenDataClient::new(config_for(endpoint)).unwrap();

        let err = tokio_test::block_on(client.fetch_records()).unwrap_err();

        match err {
            SourceError::Status { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert!(body.contains("down"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_records_timeout_keeps_cause() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // Accept and never answer.
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(5));
        });

        let mut config = config_for(format!("http://{}/resource/test.json", addr));
        config.timeout_seconds = 1;
        let client = OpenDataClient::new(config).unwrap();

        let err = tokio_test::block_on(client.fetch_records()).unwrap_err();
        match &err {
            SourceError::Timeout { seconds, source } => {
                assert_eq!(*seconds, 1);
                assert!(source.is_timeout());
            }
            other => panic!("expected timeout error, got {:?}", other),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fetch_records_connect_keeps_cause() {
        // Grab a free port, then close it so the connection is refused.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let endpoint = format!("http://{}/resource/test.json", addr);
        let client = OpenDataClient::new(config_for(endpoint.clone())).unwrap();

        let err = tokio_test::block_on(client.fetch_records()).unwrap_err();
        match &err {
            SourceError::Connect {
                endpoint: failed,
                source,
            } => {
                assert_eq!(failed, &endpoint);
                assert!(source.is_connect());
            }
            other => panic!("expected connect error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("cannot connect to"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_query_params() {
        let client = OpenDataClient::new(SourceConfig::default()).unwrap();
        let params = client.query_params();

        assert_eq!(params[0], ("$limit", "5000".to_string()));
        assert_eq!(
            params[1],
            ("$where", "date_rptd >= '2020-01-01T00:00:00'".to_string())
        );
        assert_eq!(params[2], ("$order", "date_rptd DESC".to_string()));
    }

    #[test]
    fn test_decode_records_rejects_non_array() {
        assert!(matches!(
            decode_records(r#"{"error": true}"#),
            Err(SourceError::UnexpectedShape(_))
        ));
        assert!(matches!(
            decode_records("[1, 2]"),
            Err(SourceError::UnexpectedShape(_))
        ));
        assert!(matches!(decode_records("not json"), Err(SourceError::Json(_))));
    }

    #[test]
    fn test_save_and_load_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let records = decode_records(
            r#"[{"crm_cd_desc":"ARSON","area_name":"Newton","date_rptd":"2022-06-01"}]"#,
        )
        .unwrap();

        save_records(&path, &records).unwrap();
        let loaded = load_records_from_file(&path).unwrap();

        assert_eq!(loaded, records);
        assert_eq!(loaded[0].keys().collect::<Vec<_>>(), vec!["crm_cd_desc", "area_name", "date_rptd"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_records_from_file(Path::new("/nonexistent/crimedash.json")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
