//! Leadpipe Common Library
//!
//! Shared types and utilities for the leadpipe workspace.
//!
//! # Overview
//!
//! This crate provides the pieces used by every pipeline stage:
//!
//! - **Logging**: centralized tracing setup (`logging`)
//! - **Domain keys**: URL-to-domain normalization and slugs (`domain`)
//! - **Types**: lead records and the on-disk file artifacts (`types`)

pub mod domain;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use domain::{normalize_domain, slugify};
pub use types::{CampaignSummary, ContactInfo, EnrichedFile, EnrichmentStats, Lead, LeadsFile};
