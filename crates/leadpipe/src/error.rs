//! Error types for the leadpipe pipeline
//!
//! Run-level errors abort a stage and are raised to the caller; per-key
//! lookup failures are handled locally by the enrichment loop (see
//! `api::lookup::LookupError`) and never surface here.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Run-level error for pipeline stages
///
/// Every variant aborts the current stage. An interrupted enrichment run
/// leaves its checkpoint file in place for a later resume.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Remote scrape job could not be started
    #[error("Failed to start scrape job: {0}. Check the API key and scraper identifier.")]
    JobStart(String),

    /// Remote scrape job reached a terminal failure status
    #[error("Scrape job {status}: {message}")]
    JobFailed { status: String, message: String },

    /// Remote scrape job did not finish within the configured wait
    #[error("Scrape job timed out after {waited_secs}s. Raise max_wait_secs or retry later; no partial results were retrieved.")]
    JobTimeout { waited_secs: u64 },

    /// Required input file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Campaign creation or activation failed
    #[error("Campaign error: {0}")]
    Campaign(String),

    /// Configuration value is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection and service URL.")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}. Check the file syntax.")]
    JsonParse(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Create a job-start error
    pub fn job_start(msg: impl Into<String>) -> Self {
        Self::JobStart(msg.into())
    }

    /// Create a campaign error
    pub fn campaign(msg: impl Into<String>) -> Self {
        Self::Campaign(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
