use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for URL: {url}")]
    Status { status: u16, url: String },

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("page snapshot directory not found: {0}")]
    MissingPages(PathBuf),

    #[error("failed to read page snapshot {path}: {source}")]
    PageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
