// Source trait for raw logger files
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{location} answered with status {status}")]
    Status { location: String, status: u16 },
    #[error("{location} returned no data")]
    Empty { location: String },
    #[error("malformed table: {0}")]
    Table(#[from] csv::Error),
    #[error("no header row after skipping {skipped} leading rows")]
    MissingHeader { skipped: usize },
    #[error("timestamp column '{column}' not found in header")]
    MissingTimestampColumn { column: String },
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Stable identifier for logs (path or URL)
    fn location(&self) -> &str;

    /// Fetch the full raw text of the source
    async fn fetch(&self) -> Result<String, SourceError>;
}
