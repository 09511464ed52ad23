//! Logging configuration and initialization
//!
//! Centralized tracing setup for all pipeline stages. Long enrichment runs
//! are expected to be left unattended, so the file output uses a daily
//! rotated log in addition to (or instead of) the console.
//!
//! Use the structured macros (`info!`, `warn!`, `error!`) everywhere; never
//! `println!`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "leadpipe=debug,reqwest=warn"
    pub filter: String,

    /// Emit JSON instead of human-readable text
    pub json: bool,

    /// Write a daily rotated log file into this directory (in addition to
    /// the console) when set
    pub log_dir: Option<PathBuf>,

    /// Log file name prefix (e.g. "leadpipe" -> "leadpipe.2026-08-29.log")
    pub log_file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            log_dir: None,
            log_file_prefix: "leadpipe".to_string(),
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables.
    ///
    /// - `LEADPIPE_LOG`: filter directive (default "info")
    /// - `LEADPIPE_LOG_JSON`: "true" for JSON output
    /// - `LEADPIPE_LOG_DIR`: enable file output into this directory
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(filter) = std::env::var("LEADPIPE_LOG") {
            config.filter = filter;
        }
        if let Ok(val) = std::env::var("LEADPIPE_LOG_JSON") {
            config.json = val.parse().unwrap_or(false);
        }
        if let Ok(dir) = std::env::var("LEADPIPE_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup; a second call returns an error from the underlying
/// registry.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("Invalid log filter directive: '{}'", config.filter))?;

    let file_writer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;

            let file_appender =
                tracing_appender::rolling::daily(dir, &config.log_file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // The guard must outlive the process' logging; leak it so drops
            // elsewhere cannot silence the file output.
            std::mem::forget(guard);
            Some(non_blocking)
        }
        None => None,
    };

    // Each output mode builds its own full layer stack; the fmt layers are
    // generic over the subscriber they attach to, so they cannot be shared
    // across arms with different stack shapes.
    match (file_writer, config.json) {
        (None, false) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .try_init()?;
        }
        (None, true) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .json(),
                )
                .try_init()?;
        }
        (Some(writer), false) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false),
                )
                .try_init()?;
        }
        (Some(writer), true) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .json(),
                )
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .json(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "info");
        assert!(!config.json);
        assert!(config.log_dir.is_none());
    }

    // The one test allowed to install the global subscriber; everything
    // else must fail before `try_init` or not call `init_logging` at all.
    #[test]
    fn test_file_logging_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: Some(dir.path().join("logs")),
            ..Default::default()
        };
        init_logging(&config).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LogConfig {
            filter: "not==valid==filter".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
