//! Lead collection stage
//!
//! Submits one scrape job per niche, waits for it to finish, drains the
//! result dataset, and turns the raw places into a deduplicated
//! [`LeadsFile`] artifact on disk.

use crate::api::types::Place;
use crate::api::ScrapeJobClient;
use crate::config::CollectorConfig;
use crate::error::{PipelineError, Result};
use chrono::Utc;
use leadpipe_common::domain::{normalize_domain, slugify};
use leadpipe_common::types::{format_find_rate, Lead, LeadsFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-place billing rate of the scrape provider, used for the cost estimate
/// in the output artifact.
pub const COST_PER_PLACE: f64 = 0.004;

/// Run the full collection workflow for one niche.
///
/// Builds the search query as `"{niche} in {location}"`, submits the run,
/// polls it to completion, fetches the dataset, processes it, and writes
/// `{niche-slug}-leads.json` under `output_dir`.
///
/// An empty result set is not an error: a valid empty artifact is written
/// and a warning is logged.
pub async fn scrape_leads(
    client: &ScrapeJobClient,
    niche: &str,
    location: &str,
    max_places: usize,
    output_dir: &Path,
    config: &CollectorConfig,
) -> Result<LeadsFile> {
    config.validate()?;

    let search_query = format!("{niche} in {location}");
    info!(niche, location, max_places, "Collecting leads");

    let run = client.start_run(&search_query, max_places).await?;
    let run_id = run
        .id
        .ok_or_else(|| PipelineError::job_start("run started without an id"))?;
    let dataset_id = run.default_dataset_id.ok_or_else(|| {
        PipelineError::job_start("run started without a default dataset id")
    })?;

    client.wait_for_completion(&run_id, config).await?;

    let raw_places = client.fetch_dataset(&dataset_id, config).await?;
    if raw_places.is_empty() {
        warn!(niche, location, "Scrape run produced no places");
    }

    let mut result = process_places(&raw_places, niche, location);
    result.run_id = Some(run_id);

    let output_file = leads_file_path(output_dir, niche);
    std::fs::create_dir_all(output_dir)?;
    std::fs::write(&output_file, serde_json::to_string_pretty(&result)?)?;

    info!(
        niche,
        total_found = result.total_found,
        emails_found = result.emails_found,
        find_rate = %result.find_rate,
        estimated_cost = %result.estimated_cost,
        output = %output_file.display(),
        "Collection complete"
    );

    Ok(result)
}

/// Path of the collection artifact for a niche inside `output_dir`.
pub fn leads_file_path(output_dir: &Path, niche: &str) -> PathBuf {
    output_dir.join(format!("{}-leads.json", slugify(niche)))
}

/// Turn raw scraped places into the deduplicated lead list.
///
/// Entries with no company name are dropped. Within one run, the first
/// place seen for a domain wins; places without a derivable domain are all
/// kept. The cost estimate is based on the raw place count, since the
/// provider bills for duplicates too.
pub fn process_places(raw_places: &[Place], niche: &str, location: &str) -> LeadsFile {
    let mut leads = Vec::new();
    let mut seen_domains: HashSet<String> = HashSet::new();
    let mut emails_found = 0usize;

    for place in raw_places {
        let company_name = place.title.trim();
        if company_name.is_empty() {
            continue;
        }

        let domain = normalize_domain(&place.website);
        if let Some(d) = &domain {
            if !seen_domains.insert(d.clone()) {
                continue;
            }
        }

        let email = if place.email.is_empty() {
            None
        } else {
            emails_found += 1;
            Some(place.email.clone())
        };

        let lead_location = if !place.city.is_empty() {
            place.city.clone()
        } else if !place.state.is_empty() {
            place.state.clone()
        } else {
            location.to_string()
        };

        leads.push(Lead {
            company_name: company_name.to_string(),
            location: lead_location,
            address: place.address.clone(),
            phone: place.phone.clone(),
            website: place.website.clone(),
            domain,
            email,
            rating: place.total_score,
            review_count: place.reviews_count,
            categories: place.categories.clone(),
            place_id: place.place_id.clone(),
            listing_url: place.url.clone(),
            first_name: None,
            last_name: None,
            decision_maker_title: None,
            linkedin_url: None,
        });
    }

    let total_found = leads.len();
    let estimated_cost = raw_places.len() as f64 * COST_PER_PLACE;

    info!(
        raw_places = raw_places.len(),
        unique_companies = total_found,
        emails_found,
        "Processed scrape results"
    );

    LeadsFile {
        niche: niche.to_string(),
        location: location.to_string(),
        total_found,
        emails_found,
        find_rate: format_find_rate(emails_found, total_found),
        estimated_cost: format!("${estimated_cost:.2}"),
        scraped_at: Utc::now(),
        run_id: None,
        leads,
    }
}
