//! Wire types for the external services
//!
//! Request and response shapes as the providers define them; `serde` rename
//! attributes bridge their camelCase to our snake_case.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Scrape Job Service
// ============================================================================

/// Envelope around scrape-run responses: `{ "data": { ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct RunEnvelope {
    pub data: ScrapeRun,
}

/// A scrape run handle with its current status.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRun {
    /// Run identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Dataset holding the run's results
    #[serde(default, rename = "defaultDatasetId")]
    pub default_dataset_id: Option<String>,

    /// Provider status string (e.g. "RUNNING", "SUCCEEDED")
    #[serde(default)]
    pub status: String,

    /// Provider's human-readable status message, set on failures
    #[serde(default, rename = "statusMessage")]
    pub status_message: Option<String>,
}

impl ScrapeRun {
    /// Terminal success status
    pub fn is_succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }

    /// Any terminal failure status
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "FAILED" | "ABORTED" | "TIMED-OUT")
    }
}

/// Parameters for starting a scrape run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunRequest {
    pub search_strings_array: Vec<String>,
    pub max_crawled_places_per_search: usize,
    pub language: String,
    pub include_websites: bool,
    pub include_emails: bool,
    pub include_phones: bool,
    pub skip_closed_places: bool,
}

impl StartRunRequest {
    /// Build a run request for one search query.
    pub fn new(search_query: &str, max_places: usize) -> Self {
        Self {
            search_strings_array: vec![search_query.to_string()],
            max_crawled_places_per_search: max_places,
            language: "en".to_string(),
            include_websites: true,
            include_emails: true,
            include_phones: true,
            skip_closed_places: false,
        }
    }
}

/// One raw scraped place, as the dataset endpoint returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    /// Business name
    #[serde(default)]
    pub title: String,

    /// Website URL, if the listing had one
    #[serde(default)]
    pub website: String,

    /// Email published on the listing
    #[serde(default)]
    pub email: String,

    /// City
    #[serde(default)]
    pub city: String,

    /// State / region
    #[serde(default)]
    pub state: String,

    /// Street address
    #[serde(default)]
    pub address: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Aggregate rating
    #[serde(default, rename = "totalScore")]
    pub total_score: Option<f64>,

    /// Review count
    #[serde(default, rename = "reviewsCount")]
    pub reviews_count: u32,

    /// Listing categories
    #[serde(default)]
    pub categories: Vec<String>,

    /// Provider's stable place identifier
    #[serde(default, rename = "placeId")]
    pub place_id: String,

    /// Listing URL
    #[serde(default)]
    pub url: String,
}

// ============================================================================
// Contact Lookup Service
// ============================================================================

/// Lookup request body.
#[derive(Debug, Clone, Serialize)]
pub struct LookupRequest {
    /// Company domain to search
    pub domain: String,

    /// Decision-maker category ("ceo", "cto", ...)
    pub decision_maker_category: String,
}

/// Lookup response body (HTTP 200). An absent or invalid email means the
/// provider attempted the search but found nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, rename = "personFullName")]
    pub person_full_name: String,

    #[serde(default, rename = "personJobTitle")]
    pub person_job_title: String,

    #[serde(default, rename = "personLinkedinUrl")]
    pub person_linkedin_url: String,
}

// ============================================================================
// Campaign Service
// ============================================================================

/// Campaign creation payload with the embedded multi-step sequence.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub campaign_schedule: CampaignSchedule,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSchedule {
    pub schedules: Vec<ScheduleWindow>,
}

/// One sending window: weekday hours in a fixed timezone.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleWindow {
    pub name: String,
    pub timing: ScheduleTiming,
    pub days: ScheduleDays,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleTiming {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDays {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl ScheduleDays {
    /// Monday through Friday only.
    pub fn weekdays() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
        }
    }
}

/// One email sequence: ordered steps with relative day delays.
#[derive(Debug, Clone, Serialize)]
pub struct Sequence {
    pub steps: Vec<SequenceStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceStep {
    #[serde(rename = "type")]
    pub step_type: String,

    /// Days after the previous step (0 for the first)
    pub delay: u32,

    /// Subject/body variants; multiple variants on a step enable A/B testing
    pub variants: Vec<StepVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepVariant {
    pub subject: String,
    pub body: String,
}

/// Campaign creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignCreated {
    #[serde(default)]
    pub id: Option<String>,
}

/// Bulk lead-upload payload.
#[derive(Debug, Clone, Serialize)]
pub struct AddLeadsRequest {
    pub campaign_id: String,
    pub leads: Vec<CampaignLead>,
    pub skip_if_in_workspace: bool,
}

/// Bulk lead-upload response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddLeadsResponse {
    #[serde(default)]
    pub added: usize,

    #[serde(default)]
    pub duplicates: usize,
}

/// One campaign-ready lead with its per-lead template variables.
///
/// The sequence templates reference these variables by name (for example
/// `{{email_body}}`), so the map keys must match what the sequence uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignLead {
    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub company_name: String,

    /// Template variables substituted into the sequence per lead
    #[serde(default)]
    pub custom_variables: BTreeMap<String, String>,
}
