//! Campaign dispatch stage
//!
//! Takes campaign-ready leads (each carrying its personalized template
//! variables), creates the campaign, uploads the leads in fixed-size
//! batches, and activates sending.

use crate::api::types::CampaignLead;
use crate::api::CampaignClient;
use crate::config::DispatcherConfig;
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use leadpipe_common::types::CampaignSummary;
use std::path::Path;
use tracing::info;

/// Launch a complete campaign for one niche.
///
/// Creates the campaign, uploads `leads` in batches of
/// `config.batch_size` with `config.batch_pause()` between batches, then
/// activates it. A failed batch aborts the launch before activation;
/// already-uploaded batches are not rolled back, and the created campaign
/// is left inactive for inspection.
pub async fn launch_campaign(
    client: &CampaignClient,
    niche_name: &str,
    problem_angle: &str,
    leads: &[CampaignLead],
    config: &DispatcherConfig,
) -> Result<CampaignSummary> {
    config.validate()?;

    let name = campaign_name(niche_name, problem_angle, Utc::now());
    info!(campaign = %name, leads = leads.len(), "Launching campaign");

    let campaign_id = client.create_campaign(&name, config).await?;

    let mut leads_added = 0usize;
    let mut duplicates = 0usize;
    let batch_count = leads.len().div_ceil(config.batch_size);

    for (i, batch) in leads.chunks(config.batch_size).enumerate() {
        let result = client.add_leads(&campaign_id, batch, config).await?;
        leads_added += result.added;
        duplicates += result.duplicates;

        info!(
            campaign_id = %campaign_id,
            batch = i + 1,
            batches = batch_count,
            added = result.added,
            "Uploaded lead batch"
        );

        if i + 1 < batch_count {
            tokio::time::sleep(config.batch_pause()).await;
        }
    }

    client.activate(&campaign_id).await?;

    info!(
        campaign_id = %campaign_id,
        campaign = %name,
        leads_added,
        duplicates,
        "Campaign launched"
    );

    Ok(CampaignSummary {
        campaign_id,
        campaign_name: name,
        leads_added,
        status: "active".to_string(),
    })
}

/// Campaign names follow `{Niche}_{MonYYYY}_{ProblemAngle}`.
fn campaign_name(niche_name: &str, problem_angle: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}_{}", niche_name, now.format("%b%Y"), problem_angle)
}

/// Read a campaign-ready leads file: a JSON array of leads, each with its
/// per-lead template variables already filled in.
pub fn load_campaign_leads(path: &Path) -> Result<Vec<CampaignLead>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let leads: Vec<CampaignLead> = serde_json::from_str(&content)?;
    Ok(leads)
}
