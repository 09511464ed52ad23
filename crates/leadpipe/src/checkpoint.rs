//! Enrichment checkpoint file
//!
//! Durable record of which domains have been resolved and how far the input
//! has been consumed. The mapping distinguishes "attempted, not found"
//! (explicit `null` entry) from "never attempted" (key absent) - collapsing
//! the two would re-issue paid lookups on resume.
//!
//! The file's existence is the signal that an input has not been fully
//! processed: it is written during a run and deleted only when the whole
//! input set completes. A single run owns its checkpoint path exclusively;
//! concurrent runs over the same path are unsupported (no locking) and are
//! the caller's responsibility to avoid.

use crate::error::Result;
use leadpipe_common::types::ContactInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix appended to the input file stem for the default checkpoint path.
const CHECKPOINT_SUFFIX: &str = "-progress.json";

/// On-disk enrichment progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    /// domain -> resolved contact, or `None` for attempted-not-found
    #[serde(default)]
    pub processed_domains: HashMap<String, Option<ContactInfo>>,

    /// One past the last input position folded into the mapping
    #[serde(default)]
    pub last_index: usize,
}

impl Checkpoint {
    /// Default checkpoint path for an input file: a sibling named
    /// `{stem}-progress.json`.
    pub fn default_path(input_file: &Path) -> PathBuf {
        let stem = input_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("enrichment");
        input_file.with_file_name(format!("{stem}{CHECKPOINT_SUFFIX}"))
    }

    /// Load a checkpoint, or start empty.
    ///
    /// A missing file is a fresh start. A file that exists but cannot be
    /// parsed (for example a crash mid-save) logs a warning and also starts
    /// fresh rather than stranding the run.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No checkpoint found. Starting fresh.");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Checkpoint>(&content) {
                Ok(checkpoint) => {
                    info!(
                        resume_index = checkpoint.last_index,
                        known_domains = checkpoint.processed_domains.len(),
                        emails_found = checkpoint.emails_found(),
                        "Resuming from checkpoint"
                    );
                    checkpoint
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Checkpoint unreadable. Starting fresh.");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read checkpoint. Starting fresh.");
                Self::default()
            }
        }
    }

    /// Persist the checkpoint to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Delete the checkpoint file after full completion. Missing file is fine.
    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Cached result for a domain: `None` = never attempted,
    /// `Some(None)` = attempted-not-found, `Some(Some(_))` = resolved.
    pub fn get(&self, domain: &str) -> Option<&Option<ContactInfo>> {
        self.processed_domains.get(domain)
    }

    /// Record a lookup outcome for a domain.
    pub fn insert(&mut self, domain: String, result: Option<ContactInfo>) {
        self.processed_domains.insert(domain, result);
    }

    /// Number of resolved contacts in the mapping.
    pub fn emails_found(&self) -> usize {
        self.processed_domains
            .values()
            .filter(|v| v.is_some())
            .count()
    }
}
