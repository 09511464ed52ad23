//! Leadpipe Pipeline Library
//!
//! Resumable lead-generation pipeline with three stages:
//!
//! - **Collector** (`collector`): submits an asynchronous scrape job,
//!   polls it to completion, and writes a deduplicated leads artifact.
//! - **Enricher** (`enricher`): checkpointed, rate-limited decision-maker
//!   lookups; an interrupted run resumes without repeating paid calls.
//! - **Dispatcher** (`dispatcher`): creates an outreach campaign, uploads
//!   leads in batches, and activates sending.
//!
//! Stages communicate only through JSON files on disk, so each can run,
//! fail, and be retried independently.

pub mod api;
pub mod checkpoint;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod enricher;
pub mod error;

pub use checkpoint::Checkpoint;
pub use config::{CollectorConfig, DispatcherConfig, EnricherConfig};
pub use error::{PipelineError, Result};
