//! Shared record types and file artifacts
//!
//! Every pipeline stage communicates through these JSON documents: the
//! Collector writes a [`LeadsFile`], the Enricher reads one and writes an
//! [`EnrichedFile`], and the Dispatcher consumes enriched leads. Leads flow
//! forward in their original order; enrichment mutates records in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One discovered company record.
///
/// Created by the Collector from a raw scraped place, enriched in place by
/// the Enricher, consumed read-only by the Dispatcher. The `domain` field is
/// the record's stable identity; records without one pass through the
/// Enricher untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Company name from the listing
    pub company_name: String,

    /// City/state/region the listing reported
    #[serde(default)]
    pub location: String,

    /// Street address
    #[serde(default)]
    pub address: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Raw website URL as scraped
    #[serde(default)]
    pub website: String,

    /// Normalized domain key (see `leadpipe_common::domain`)
    #[serde(default)]
    pub domain: Option<String>,

    /// Contact email (from the listing, or filled in by enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Listing rating (e.g. 4.7)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Number of reviews on the listing
    #[serde(default)]
    pub review_count: u32,

    /// Listing categories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Provider's stable place identifier
    #[serde(default)]
    pub place_id: String,

    /// Link back to the original listing
    #[serde(default)]
    pub listing_url: String,

    /// Decision-maker first name (enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Decision-maker last name (enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Decision-maker job title (enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_maker_title: Option<String>,

    /// Decision-maker LinkedIn profile (enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

impl Lead {
    /// Apply a resolved contact to this lead's enrichment fields.
    pub fn apply_contact(&mut self, contact: &ContactInfo) {
        self.email = Some(contact.email.clone());
        self.first_name = Some(contact.first_name.clone());
        self.last_name = Some(contact.last_name.clone());
        self.decision_maker_title = Some(contact.title.clone());
        self.linkedin_url = Some(contact.linkedin_url.clone());
    }
}

/// Resolved decision-maker contact for a domain.
///
/// Stored verbatim in the checkpoint mapping, so the shape must stay stable
/// across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact email address
    pub email: String,

    /// First name, parsed from the provider's full-name string
    #[serde(default)]
    pub first_name: String,

    /// Last name, parsed from the provider's full-name string
    #[serde(default)]
    pub last_name: String,

    /// Job title
    #[serde(default)]
    pub title: String,

    /// LinkedIn profile URL
    #[serde(default)]
    pub linkedin_url: String,
}

/// Collector output: one scrape's worth of deduplicated leads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadsFile {
    /// Niche that was searched (e.g. "HVAC inspection companies")
    pub niche: String,

    /// Location that was searched (e.g. "California")
    pub location: String,

    /// Number of unique companies kept after deduplication
    pub total_found: usize,

    /// How many leads carried an email straight from the listing
    pub emails_found: usize,

    /// emails_found / total_found, formatted as a percentage
    pub find_rate: String,

    /// Estimated provider cost for the scrape
    pub estimated_cost: String,

    /// When the scrape finished
    pub scraped_at: DateTime<Utc>,

    /// Remote run identifier, kept for traceability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Ordered, deduplicated lead records
    #[serde(default)]
    pub leads: Vec<Lead>,
}

/// Enricher output: the input leads with contact fields populated where
/// resolvable, plus run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedFile {
    /// Niche carried over from the input file
    pub niche: String,

    /// Location carried over from the input file
    pub location: String,

    /// Total leads in the output (same count and order as the input)
    pub total_leads: usize,

    /// Leads carrying an email after enrichment
    pub emails_found: usize,

    /// emails_found / total_leads, formatted as a percentage
    pub find_rate: String,

    /// When enrichment finished
    pub enriched_at: DateTime<Utc>,

    /// Path of the input file this was derived from
    pub source_file: String,

    /// The enriched lead records, in original order
    #[serde(default)]
    pub leads: Vec<Lead>,

    /// External-call statistics for the run
    pub enrichment_stats: EnrichmentStats,
}

/// External lookup statistics for one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentStats {
    /// Lookup calls issued (retries included)
    pub api_requests: u64,

    /// Lookups that resolved to a contact
    pub emails_found: u64,

    /// Per-key failures, auth/credit refusals, and unresolved rate-limited keys
    pub errors: u64,
}

/// Result of a completed campaign launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    /// Campaign identifier assigned by the send service
    pub campaign_id: String,

    /// Generated campaign name
    pub campaign_name: String,

    /// Leads accepted across all upload batches (duplicates excluded)
    pub leads_added: usize,

    /// Campaign state after launch ("active")
    pub status: String,
}

/// Format a found/total ratio as a one-decimal percentage string.
pub fn format_find_rate(found: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", found as f64 / total as f64 * 100.0)
}
