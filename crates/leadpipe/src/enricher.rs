//! Checkpointed enrichment loop
//!
//! Visits every input lead exactly once per run in original order, resolves a
//! decision-maker contact for its domain key, and guarantees that an
//! interruption never repeats a previously-successful paid lookup. Progress
//! is durable on disk at a bounded staleness: the checkpoint is saved
//! immediately after every successful lookup and on a periodic cadence
//! regardless of outcome.
//!
//! Per run the state machine is FRESH -> RESUMING (checkpoint found) ->
//! PROCESSING -> COMPLETE (checkpoint cleared). A crash during PROCESSING
//! leaves the checkpoint at its last save; the next invocation resumes from
//! it.

use crate::api::lookup::{LookupError, LookupService};
use crate::checkpoint::Checkpoint;
use crate::config::EnricherConfig;
use crate::error::{PipelineError, Result};
use chrono::Utc;
use leadpipe_common::domain::normalize_domain;
use leadpipe_common::types::{
    format_find_rate, ContactInfo, EnrichedFile, EnrichmentStats, LeadsFile,
};
use std::path::Path;
use tracing::{info, warn};

/// Outcome of resolving one domain key, retries included.
enum LookupOutcome {
    /// Contact resolved
    Found(ContactInfo),
    /// Provider attempted the search and found nothing
    NotFound,
    /// Per-key failure (transport, auth, credits); cached as not-found
    Failed,
    /// Rate-limit retries exhausted; left out of the checkpoint so a later
    /// occurrence or run can retry
    Unresolved,
}

/// Enrich every lead in `input_file` and write the combined artifact to
/// `output_file`.
///
/// `checkpoint_path` overrides the default sibling `{stem}-progress.json`.
/// The checkpoint is deleted only on full completion; its presence on disk
/// afterwards means the run was interrupted and can be resumed by calling
/// this again with the same arguments.
///
/// The caller must ensure no other run is using the same checkpoint path;
/// concurrent runs over one checkpoint are undefined.
pub async fn enrich_leads<S>(
    service: &S,
    input_file: &Path,
    output_file: &Path,
    checkpoint_path: Option<&Path>,
    config: &EnricherConfig,
) -> Result<EnrichedFile>
where
    S: LookupService + ?Sized,
{
    config.validate()?;

    if !input_file.exists() {
        return Err(PipelineError::FileNotFound(
            input_file.display().to_string(),
        ));
    }

    let content = std::fs::read_to_string(input_file)?;
    let input: LeadsFile = serde_json::from_str(&content)?;
    let total_leads = input.leads.len();

    info!(
        input = %input_file.display(),
        total_leads,
        "Starting enrichment"
    );

    let default_checkpoint = Checkpoint::default_path(input_file);
    let checkpoint_file = checkpoint_path.unwrap_or(&default_checkpoint);
    let mut checkpoint = Checkpoint::load_or_default(checkpoint_file);

    let mut stats = EnrichmentStats::default();
    let mut enriched = Vec::with_capacity(total_leads);
    let mut emails_applied = 0usize;
    let mut domains_processed = 0usize;

    for (i, mut lead) in input.leads.into_iter().enumerate() {
        // Rule 1: no derivable key - the record passes through untouched.
        let domain = match lead
            .domain
            .clone()
            .or_else(|| normalize_domain(&lead.website))
        {
            Some(d) => d,
            None => {
                enriched.push(lead);
                continue;
            }
        };

        // Rule 2: cached result wins, even a cached not-found. No call.
        if let Some(cached) = checkpoint.get(&domain).cloned() {
            if let Some(contact) = cached {
                lead.apply_contact(&contact);
                emails_applied += 1;
            }
            enriched.push(lead);
            continue;
        }

        // Rule 3: already folded into the cursor by a prior run. Duplicate
        // keys are normally caught by rule 2; this guards the rest.
        if i < checkpoint.last_index {
            enriched.push(lead);
            continue;
        }

        // Rule 4: one external lookup, bounded rate-limit retry.
        domains_processed += 1;
        let outcome = resolve_domain(service, &domain, config, &mut stats).await;

        // Record the outcome before advancing the cursor, so a save between
        // the two never claims a position whose result is missing.
        match outcome {
            LookupOutcome::Found(contact) => {
                checkpoint.insert(domain, Some(contact.clone()));
                checkpoint.last_index = i + 1;
                checkpoint.save(checkpoint_file)?;
                lead.apply_contact(&contact);
                emails_applied += 1;
                stats.emails_found += 1;
            }
            LookupOutcome::NotFound => {
                checkpoint.insert(domain, None);
                checkpoint.last_index = i + 1;
            }
            LookupOutcome::Failed => {
                stats.errors += 1;
                checkpoint.insert(domain, None);
                checkpoint.last_index = i + 1;
            }
            LookupOutcome::Unresolved => {
                stats.errors += 1;
                checkpoint.last_index = i + 1;
            }
        }
        enriched.push(lead);

        // Periodic durable save so silent not-found stretches still make
        // forward progress on disk.
        if domains_processed % config.save_interval == 0 {
            checkpoint.save(checkpoint_file)?;
        }

        if domains_processed % config.progress_interval == 0 {
            info!(
                position = i + 1,
                total = total_leads,
                domains_checked = domains_processed,
                emails_found = stats.emails_found,
                errors = stats.errors,
                "Enrichment progress"
            );
        }

        // Rule 5: hard rate floor after every external call.
        tokio::time::sleep(config.request_delay()).await;
    }

    let output = EnrichedFile {
        niche: input.niche,
        location: input.location,
        total_leads: enriched.len(),
        emails_found: emails_applied,
        find_rate: format_find_rate(emails_applied, enriched.len()),
        enriched_at: Utc::now(),
        source_file: input_file.display().to_string(),
        leads: enriched,
        enrichment_stats: stats.clone(),
    };

    let serialized = serde_json::to_string_pretty(&output)?;
    std::fs::write(output_file, serialized)?;

    // Full completion: the checkpoint's absence is the "done" signal.
    Checkpoint::remove(checkpoint_file)?;

    info!(
        output = %output_file.display(),
        total_leads = output.total_leads,
        emails_found = output.emails_found,
        find_rate = %output.find_rate,
        api_requests = stats.api_requests,
        errors = stats.errors,
        "Enrichment complete"
    );

    Ok(output)
}

/// Issue one lookup for a domain, retrying rate-limited responses with
/// exponential backoff up to the configured budget.
async fn resolve_domain<S>(
    service: &S,
    domain: &str,
    config: &EnricherConfig,
    stats: &mut EnrichmentStats,
) -> LookupOutcome
where
    S: LookupService + ?Sized,
{
    let mut attempt = 0u32;

    loop {
        stats.api_requests += 1;

        match service
            .find_decision_maker(domain, &config.decision_maker_category)
            .await
        {
            Ok(Some(contact)) => return LookupOutcome::Found(contact),
            Ok(None) => return LookupOutcome::NotFound,
            Err(LookupError::RateLimited) => {
                attempt += 1;
                if attempt > config.max_rate_limit_retries {
                    warn!(
                        domain,
                        retries = config.max_rate_limit_retries,
                        "Rate-limit retries exhausted; leaving domain unresolved for a later attempt"
                    );
                    return LookupOutcome::Unresolved;
                }
                let backoff = config.rate_limit_backoff(attempt);
                warn!(
                    domain,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Rate limited; backing off"
                );
                // The backoff already exceeds the inter-call floor.
                tokio::time::sleep(backoff).await;
            }
            Err(e @ LookupError::Unauthorized) | Err(e @ LookupError::OutOfCredits) => {
                // Terminal in spirit for the whole run; surfaced distinctly
                // but counted and skipped like any per-key failure. Callers
                // wanting a hard stop must watch the error count.
                warn!(domain, error = %e, "Lookup refused by provider");
                return LookupOutcome::Failed;
            }
            Err(LookupError::Transport(msg)) => {
                warn!(domain, error = %msg, "Lookup failed");
                return LookupOutcome::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leadpipe_common::types::Lead;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn contact(email: &str) -> ContactInfo {
        ContactInfo {
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            title: "CEO".to_string(),
            linkedin_url: String::new(),
        }
    }

    fn lead(name: &str, website: &str) -> Lead {
        Lead {
            company_name: name.to_string(),
            location: "CA".to_string(),
            address: String::new(),
            phone: String::new(),
            website: website.to_string(),
            domain: normalize_domain(website),
            email: None,
            rating: None,
            review_count: 0,
            categories: Vec::new(),
            place_id: String::new(),
            listing_url: String::new(),
            first_name: None,
            last_name: None,
            decision_maker_title: None,
            linkedin_url: None,
        }
    }

    fn write_leads_file(dir: &TempDir, leads: Vec<Lead>) -> PathBuf {
        let file = LeadsFile {
            niche: "hvac".to_string(),
            location: "California".to_string(),
            total_found: leads.len(),
            emails_found: 0,
            find_rate: "0.0%".to_string(),
            estimated_cost: "$0.00".to_string(),
            scraped_at: Utc::now(),
            run_id: None,
            leads,
        };
        let path = dir.path().join("hvac-leads.json");
        std::fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();
        path
    }

    /// Fast config: no real sleeping even outside paused clocks.
    fn test_config() -> EnricherConfig {
        EnricherConfig {
            request_delay_ms: 0,
            rate_limit_backoff_ms: 0,
            ..Default::default()
        }
    }

    /// In-memory lookup service: fixed results per domain, optional
    /// per-domain scripted error queues, call recording, and an optional
    /// checkpoint observer that records the on-disk cursor before each call.
    #[derive(Default)]
    struct FakeLookup {
        results: HashMap<String, Option<ContactInfo>>,
        scripted_errors: Mutex<HashMap<String, VecDeque<LookupError>>>,
        calls: Mutex<Vec<String>>,
        watch_checkpoint: Option<PathBuf>,
        observed_cursors: Mutex<Vec<usize>>,
    }

    impl FakeLookup {
        fn with_results(results: Vec<(&str, Option<ContactInfo>)>) -> Self {
            Self {
                results: results
                    .into_iter()
                    .map(|(d, r)| (d.to_string(), r))
                    .collect(),
                ..Default::default()
            }
        }

        fn script_errors(&self, domain: &str, errors: Vec<LookupError>) {
            self.scripted_errors
                .lock()
                .unwrap()
                .insert(domain.to_string(), errors.into());
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LookupService for FakeLookup {
        async fn find_decision_maker(
            &self,
            domain: &str,
            _category: &str,
        ) -> std::result::Result<Option<ContactInfo>, LookupError> {
            if let Some(path) = &self.watch_checkpoint {
                let cursor = if path.exists() {
                    let content = std::fs::read_to_string(path).unwrap();
                    serde_json::from_str::<Checkpoint>(&content)
                        .unwrap()
                        .last_index
                } else {
                    0
                };
                self.observed_cursors.lock().unwrap().push(cursor);
            }

            self.calls.lock().unwrap().push(domain.to_string());

            if let Some(queue) = self.scripted_errors.lock().unwrap().get_mut(domain) {
                if let Some(err) = queue.pop_front() {
                    return Err(err);
                }
            }

            Ok(self.results.get(domain).cloned().flatten())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_worked_example_duplicate_key() {
        let dir = TempDir::new().unwrap();
        let input = write_leads_file(
            &dir,
            vec![
                lead("A Inc", "https://a.com"),
                lead("B Inc", "https://b.com"),
                lead("A again", "https://www.a.com/about"),
            ],
        );
        let output = dir.path().join("out.json");

        let service = FakeLookup::with_results(vec![
            ("a.com", Some(contact("ceo@a.com"))),
            ("b.com", None),
        ]);

        let result = enrich_leads(&service, &input, &output, None, &test_config())
            .await
            .unwrap();

        // Exactly one paid call per unique key
        assert_eq!(service.calls(), vec!["a.com", "b.com"]);

        // Both a.com records carry the found contact; b.com is untouched
        assert_eq!(result.leads[0].email.as_deref(), Some("ceo@a.com"));
        assert_eq!(result.leads[2].email.as_deref(), Some("ceo@a.com"));
        assert!(result.leads[1].email.is_none());

        assert_eq!(result.emails_found, 2);
        assert_eq!(result.enrichment_stats.api_requests, 2);
        assert_eq!(result.enrichment_stats.emails_found, 1);
        assert_eq!(result.enrichment_stats.errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_clears_checkpoint() {
        let dir = TempDir::new().unwrap();
        let input = write_leads_file(&dir, vec![lead("A", "a.com"), lead("B", "b.com")]);
        let output = dir.path().join("out.json");
        let checkpoint = Checkpoint::default_path(&input);

        let service = FakeLookup::with_results(vec![("a.com", Some(contact("x@a.com")))]);
        enrich_leads(&service, &input, &output, None, &test_config())
            .await
            .unwrap();

        assert!(output.exists());
        assert!(!checkpoint.exists(), "checkpoint must be deleted on completion");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_through_preserves_keyless_records() {
        let dir = TempDir::new().unwrap();
        let keyless = lead("No Website LLC", "");
        let input = write_leads_file(
            &dir,
            vec![lead("A", "a.com"), keyless.clone(), lead("B", "b.com")],
        );
        let output = dir.path().join("out.json");

        let service = FakeLookup::with_results(vec![
            ("a.com", Some(contact("x@a.com"))),
            ("b.com", Some(contact("y@b.com"))),
        ]);
        let result = enrich_leads(&service, &input, &output, None, &test_config())
            .await
            .unwrap();

        // Still present, unmodified, at its original relative position
        assert_eq!(result.leads.len(), 3);
        assert_eq!(result.leads[1], keyless);
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_issues_only_remaining_lookups() {
        let dir = TempDir::new().unwrap();
        let leads = vec![
            lead("A", "a.com"),
            lead("B", "b.com"),
            lead("C", "c.com"),
            lead("D", "d.com"),
        ];
        let input = write_leads_file(&dir, leads.clone());
        let checkpoint_path = Checkpoint::default_path(&input);

        // Simulate an interruption after the first two lookups: their
        // outcomes (one hit, one explicit not-found) are durable, cursor = 2.
        let mut interrupted = Checkpoint::default();
        interrupted.insert("a.com".to_string(), Some(contact("ceo@a.com")));
        interrupted.insert("b.com".to_string(), None);
        interrupted.last_index = 2;
        interrupted.save(&checkpoint_path).unwrap();

        let service = FakeLookup::with_results(vec![
            ("a.com", Some(contact("ceo@a.com"))),
            ("c.com", Some(contact("ceo@c.com"))),
            ("d.com", None),
        ]);
        let output = dir.path().join("out.json");
        let resumed = enrich_leads(&service, &input, &output, None, &test_config())
            .await
            .unwrap();

        // Only the unprocessed keys were billed
        assert_eq!(service.calls(), vec!["c.com", "d.com"]);

        // And the final artifact matches an uninterrupted run
        let fresh_dir = TempDir::new().unwrap();
        let fresh_input = write_leads_file(&fresh_dir, leads);
        let fresh_service = FakeLookup::with_results(vec![
            ("a.com", Some(contact("ceo@a.com"))),
            ("b.com", None),
            ("c.com", Some(contact("ceo@c.com"))),
            ("d.com", None),
        ]);
        let fresh = enrich_leads(
            &fresh_service,
            &fresh_input,
            &fresh_dir.path().join("out.json"),
            None,
            &test_config(),
        )
        .await
        .unwrap();

        assert_eq!(resumed.leads, fresh.leads);
        assert_eq!(resumed.emails_found, fresh.emails_found);
        assert!(!checkpoint_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_monotonic_and_periodically_durable() {
        let dir = TempDir::new().unwrap();
        let leads: Vec<Lead> = (0..25)
            .map(|n| lead(&format!("Co {n}"), &format!("co{n}.example.com")))
            .collect();
        let input = write_leads_file(&dir, leads);
        let checkpoint_path = Checkpoint::default_path(&input);

        // All not-found: only the periodic cadence saves the checkpoint.
        let service = FakeLookup {
            watch_checkpoint: Some(checkpoint_path.clone()),
            ..Default::default()
        };
        enrich_leads(&service, &input, &dir.path().join("out.json"), None, &test_config())
            .await
            .unwrap();

        let observed = service.observed_cursors.lock().unwrap().clone();
        assert_eq!(observed.len(), 25);
        assert!(
            observed.windows(2).all(|w| w[0] <= w[1]),
            "durable cursor must never decrease: {observed:?}"
        );
        // Not-found stretches still hit disk every save_interval keys
        assert!(
            observed.iter().any(|&c| c >= 20),
            "periodic saves should have persisted progress: {observed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_floor_between_calls() {
        let dir = TempDir::new().unwrap();
        let leads: Vec<Lead> = (0..5)
            .map(|n| lead(&format!("Co {n}"), &format!("co{n}.example.com")))
            .collect();
        let input = write_leads_file(&dir, leads);

        let config = EnricherConfig::default(); // 1s floor
        let service = FakeLookup::default();

        let started = tokio::time::Instant::now();
        enrich_leads(&service, &input, &dir.path().join("out.json"), None, &config)
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert!(
            elapsed >= config.request_delay() * 4,
            "5 calls must span at least 4 delay periods, got {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_key_retried_then_resolves() {
        let dir = TempDir::new().unwrap();
        let input = write_leads_file(&dir, vec![lead("A", "a.com")]);

        let service = FakeLookup::with_results(vec![("a.com", Some(contact("ceo@a.com")))]);
        service.script_errors(
            "a.com",
            vec![LookupError::RateLimited, LookupError::RateLimited],
        );

        let result = enrich_leads(
            &service,
            &input,
            &dir.path().join("out.json"),
            None,
            &test_config(),
        )
        .await
        .unwrap();

        assert_eq!(result.enrichment_stats.api_requests, 3);
        assert_eq!(result.enrichment_stats.errors, 0);
        assert_eq!(result.leads[0].email.as_deref(), Some("ceo@a.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_rate_limit_leaves_key_retryable() {
        let dir = TempDir::new().unwrap();
        // Same key twice: the second occurrence must retry because an
        // unresolved key is never written into the mapping.
        let input = write_leads_file(&dir, vec![lead("A", "a.com"), lead("A2", "a.com")]);

        let mut config = test_config();
        config.max_rate_limit_retries = 2;

        let service = FakeLookup::default();
        service.script_errors(
            "a.com",
            vec![LookupError::RateLimited; 10],
        );

        let result = enrich_leads(
            &service,
            &input,
            &dir.path().join("out.json"),
            None,
            &config,
        )
        .await
        .unwrap();

        // 1 initial + 2 retries per occurrence
        assert_eq!(result.enrichment_stats.api_requests, 6);
        assert_eq!(result.enrichment_stats.errors, 2);
        assert!(result.leads[0].email.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_lookup_counts_error_and_continues() {
        let dir = TempDir::new().unwrap();
        let input = write_leads_file(&dir, vec![lead("A", "a.com"), lead("B", "b.com")]);

        let service = FakeLookup::with_results(vec![("b.com", Some(contact("ceo@b.com")))]);
        service.script_errors("a.com", vec![LookupError::OutOfCredits]);

        let result = enrich_leads(
            &service,
            &input,
            &dir.path().join("out.json"),
            None,
            &test_config(),
        )
        .await
        .unwrap();

        assert_eq!(result.enrichment_stats.errors, 1);
        // The run continued past the refusal
        assert_eq!(result.leads[1].email.as_deref(), Some("ceo@b.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let service = FakeLookup::default();

        let err = enrich_leads(
            &service,
            &dir.path().join("missing.json"),
            &dir.path().join("out.json"),
            None,
            &test_config(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::FileNotFound(_)));
        assert_eq!(service.call_count(), 0);
    }
}
