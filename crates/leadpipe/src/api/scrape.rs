//! Scrape job service client
//!
//! Submits a long-running scrape job to the provider's asynchronous job
//! endpoint, polls it to a terminal state, and drains the paginated result
//! dataset.

use crate::api::types::{Place, RunEnvelope, ScrapeRun, StartRunRequest};
use crate::config::CollectorConfig;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Client for the asynchronous scrape job service.
pub struct ScrapeJobClient {
    client: Client,
    base_url: String,
    api_key: String,
    scraper_id: String,
}

impl ScrapeJobClient {
    /// Create a new client.
    ///
    /// `scraper_id` selects which hosted scraper the runs are submitted to.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        scraper_id: impl Into<String>,
        config: &CollectorConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            scraper_id: scraper_id.into(),
        })
    }

    /// Submit a scrape run for one search query.
    ///
    /// Returns the run handle; a response without a run id is a fatal start
    /// error.
    pub async fn start_run(&self, search_query: &str, max_places: usize) -> Result<ScrapeRun> {
        let url = format!("{}/actors/{}/runs", self.base_url, self.scraper_id);
        let request = StartRunRequest::new(search_query, max_places);

        info!(query = %search_query, max_places, "Starting scrape run");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RunEnvelope = response.json().await?;
        let run = envelope.data;

        if run.id.is_none() {
            return Err(PipelineError::job_start(
                "service accepted the request but returned no run id",
            ));
        }

        info!(run_id = ?run.id, dataset_id = ?run.default_dataset_id, "Scrape run started");
        Ok(run)
    }

    /// Fetch the current status of a run.
    pub async fn run_status(&self, run_id: &str) -> Result<ScrapeRun> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RunEnvelope = response.json().await?;
        Ok(envelope.data)
    }

    /// Poll until the run reaches a terminal state or the configured wait
    /// elapses.
    ///
    /// Status transitions are logged once per distinct status value, not once
    /// per poll tick. A terminal failure raises [`PipelineError::JobFailed`]
    /// with the provider's message; exceeding `max_wait` raises
    /// [`PipelineError::JobTimeout`] without retrieving partial results.
    pub async fn wait_for_completion(
        &self,
        run_id: &str,
        config: &CollectorConfig,
    ) -> Result<ScrapeRun> {
        let started = Instant::now();
        let mut last_status: Option<String> = None;

        loop {
            let elapsed = started.elapsed();
            if elapsed > config.max_wait() {
                return Err(PipelineError::JobTimeout {
                    waited_secs: elapsed.as_secs(),
                });
            }

            let run = self.run_status(run_id).await?;

            if last_status.as_deref() != Some(run.status.as_str()) {
                info!(
                    run_id,
                    status = %run.status,
                    elapsed_secs = elapsed.as_secs(),
                    "Scrape run status changed"
                );
                last_status = Some(run.status.clone());
            }

            if run.is_succeeded() {
                info!(run_id, "Scrape run completed");
                return Ok(run);
            }

            if run.is_failed() {
                return Err(PipelineError::JobFailed {
                    status: run.status.clone(),
                    message: run
                        .status_message
                        .unwrap_or_else(|| "no status message from provider".to_string()),
                });
            }

            tokio::time::sleep(config.poll_interval()).await;
        }
    }

    /// Retrieve every item from a result dataset.
    ///
    /// Pages through the items endpoint with the configured page size until a
    /// short (or empty) page signals end-of-data.
    pub async fn fetch_dataset(
        &self,
        dataset_id: &str,
        config: &CollectorConfig,
    ) -> Result<Vec<Place>> {
        let url = format!("{}/datasets/{}/items", self.base_url, dataset_id);
        let mut all_items: Vec<Place> = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[
                    ("offset", offset.to_string()),
                    ("limit", config.page_size.to_string()),
                    ("format", "json".to_string()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let items: Vec<Place> = response.json().await?;
            let page_len = items.len();

            if page_len == 0 {
                break;
            }

            all_items.extend(items);
            info!(dataset_id, retrieved = all_items.len(), "Retrieved result page");

            if page_len < config.page_size {
                break;
            }

            offset += config.page_size;
        }

        if all_items.is_empty() {
            warn!(dataset_id, "Dataset contained no items");
        }

        Ok(all_items)
    }
}
