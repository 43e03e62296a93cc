//! Dataset sources: local files and `http(s)` URLs.

use std::fs::File;
use std::io::{Cursor, Read};

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::DataSource;
use crate::error::AppError;

/// Open a reader over the raw CSV bytes.
///
/// URLs are fetched once, in full, before parsing starts.
pub fn open_source(source: &DataSource) -> Result<Box<dyn Read>, AppError> {
    match source {
        DataSource::Path(path) => {
            let file = File::open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
            Ok(Box::new(file))
        }
        DataSource::Url(url) => {
            let body = fetch_text(&dataset_client()?, url)?;
            Ok(Box::new(Cursor::new(body)))
        }
    }
}

/// HTTP client for the one-time dataset download.
///
/// The full OWID file is large, so the request may take as long as it needs.
pub fn dataset_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(None)
        .build()
        .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))
}

/// GET `url` and return the body text. Non-success statuses are errors.
pub fn fetch_text(client: &Client, url: &str) -> Result<String, AppError> {
    debug!(%url, "fetching dataset");
    let resp = client
        .get(url)
        .send()
        .map_err(|e| AppError::new(2, format!("Dataset request failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(AppError::new(2, format!("Network response was not ok: {}", resp.status())));
    }

    resp.text()
        .map_err(|e| AppError::new(2, format!("Failed to read dataset response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_input_error() {
        let err = open_source(&DataSource::parse("/definitely/not/here.csv")).err().unwrap();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Failed to open CSV"));
    }

    #[test]
    fn dataset_client_builds_without_timeout() {
        let client = dataset_client().unwrap();
        // No per-request timeout either; the download waits as long as it takes.
        let req = client.get("https://example.org/owid.csv").build().unwrap();
        assert_eq!(req.timeout(), None);
    }
}
