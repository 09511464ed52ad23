//! Stage configuration
//!
//! Explicit configuration objects passed into each component at
//! construction. Defaults match the rates and cadences the external
//! providers tolerate; the values only need overriding in tests (shorter
//! sleeps, mock server URLs handled by the clients themselves).

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Collector Defaults
// ============================================================================

/// Maximum time to wait for a scrape job to finish.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 600;

/// Interval between job status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Result page size when draining the scrape dataset.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// ============================================================================
// Enricher Defaults
// ============================================================================

/// Hard floor between consecutive lookup calls (provider allows ~1/s).
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

/// Durable checkpoint save every N processed keys, regardless of outcome.
pub const DEFAULT_SAVE_INTERVAL: usize = 10;

/// Base backoff after a rate-limited response.
pub const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 5000;

/// Retry budget for a single rate-limited key before it is left unresolved.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 5;

// ============================================================================
// Dispatcher Defaults
// ============================================================================

/// Leads per bulk-upload batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pause between consecutive upload batches.
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 500;

/// Default HTTP timeout for all external calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Collector stage (job submit + poll + fetch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum seconds to wait for job completion before raising a timeout
    pub max_wait_secs: u64,

    /// Seconds between status polls
    pub poll_interval_secs: u64,

    /// Page size for paginated result retrieval
    pub page_size: usize,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl CollectorConfig {
    /// Maximum wait as a Duration
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// Poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(PipelineError::config("page_size must be greater than 0"));
        }
        if self.poll_interval_secs == 0 {
            return Err(PipelineError::config(
                "poll_interval_secs must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Configuration for the Enricher stage (the checkpointed lookup loop).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherConfig {
    /// Fixed delay applied after every lookup call, in milliseconds
    pub request_delay_ms: u64,

    /// Checkpoint save cadence in processed keys
    pub save_interval: usize,

    /// Base backoff after a rate-limited response, in milliseconds; doubles
    /// per consecutive retry of the same key
    pub rate_limit_backoff_ms: u64,

    /// Retries for a rate-limited key before it is left unresolved this run
    pub max_rate_limit_retries: u32,

    /// Decision-maker category requested from the lookup service
    pub decision_maker_category: String,

    /// Progress log cadence in processed keys
    pub progress_interval: usize,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            save_interval: DEFAULT_SAVE_INTERVAL,
            rate_limit_backoff_ms: DEFAULT_RATE_LIMIT_BACKOFF_MS,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
            decision_maker_category: "ceo".to_string(),
            progress_interval: 10,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl EnricherConfig {
    /// Inter-call delay as a Duration
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Rate-limit backoff for a given retry attempt (1-based), doubling per
    /// attempt.
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.rate_limit_backoff_ms.saturating_mul(factor))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.save_interval == 0 {
            return Err(PipelineError::config(
                "save_interval must be greater than 0",
            ));
        }
        if self.progress_interval == 0 {
            return Err(PipelineError::config(
                "progress_interval must be greater than 0",
            ));
        }
        if self.decision_maker_category.is_empty() {
            return Err(PipelineError::config(
                "decision_maker_category cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Configuration for the Dispatcher stage (bulk upload + activation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Leads per upload batch
    pub batch_size: usize,

    /// Pause between batches, in milliseconds
    pub batch_pause_ms: u64,

    /// Timezone for the campaign sending window
    pub timezone: String,

    /// Sending window start, "HH:MM"
    pub send_from: String,

    /// Sending window end, "HH:MM"
    pub send_to: String,

    /// Skip leads already present anywhere in the workspace
    pub skip_if_in_workspace: bool,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: DEFAULT_BATCH_PAUSE_MS,
            timezone: "America/Los_Angeles".to_string(),
            send_from: "09:00".to_string(),
            send_to: "17:00".to_string(),
            skip_if_in_workspace: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DispatcherConfig {
    /// Inter-batch pause as a Duration
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("batch_size must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.max_wait_secs, 600);
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.page_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enricher_defaults() {
        let config = EnricherConfig::default();
        assert_eq!(config.request_delay(), Duration::from_secs(1));
        assert_eq!(config.save_interval, 10);
        assert_eq!(config.decision_maker_category, "ceo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_backoff_doubles() {
        let config = EnricherConfig::default();
        assert_eq!(config.rate_limit_backoff(1), Duration::from_secs(5));
        assert_eq!(config.rate_limit_backoff(2), Duration::from_secs(10));
        assert_eq!(config.rate_limit_backoff(3), Duration::from_secs(20));
    }

    #[test]
    fn test_dispatcher_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_pause(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut collector = CollectorConfig::default();
        collector.page_size = 0;
        assert!(collector.validate().is_err());

        let mut enricher = EnricherConfig::default();
        enricher.save_interval = 0;
        assert!(enricher.validate().is_err());

        let mut dispatcher = DispatcherConfig::default();
        dispatcher.batch_size = 0;
        assert!(dispatcher.validate().is_err());
    }
}
