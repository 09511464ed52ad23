//! Campaign service client
//!
//! Creates an outreach campaign with its email sequence embedded, bulk-adds
//! leads, and activates sending.

use crate::api::types::{
    AddLeadsRequest, AddLeadsResponse, CampaignCreated, CampaignLead, CampaignSchedule,
    CreateCampaignRequest, ScheduleDays, ScheduleTiming, ScheduleWindow, Sequence, SequenceStep,
    StepVariant,
};
use crate::config::DispatcherConfig;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Client for the campaign/send service.
pub struct CampaignClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CampaignClient {
    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        config: &DispatcherConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a campaign with the embedded three-step sequence.
    ///
    /// Step delays are relative to the previous step: 0 (day 0), 3 (day 3),
    /// 4 (day 7). The first step carries three subject variants for A/B/C
    /// testing; all bodies come from per-lead template variables.
    ///
    /// Returns the new campaign id; a response without one is fatal.
    pub async fn create_campaign(
        &self,
        name: &str,
        config: &DispatcherConfig,
    ) -> Result<String> {
        let url = format!("{}/campaigns", self.base_url);
        let request = build_campaign_request(name, config);

        info!(campaign = %name, "Creating campaign");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let created: CampaignCreated = response.json().await?;

        match created.id {
            Some(id) => {
                info!(campaign_id = %id, "Campaign created");
                Ok(id)
            }
            None => Err(PipelineError::campaign(
                "campaign creation returned no id",
            )),
        }
    }

    /// Bulk-add one batch of leads to a campaign.
    pub async fn add_leads(
        &self,
        campaign_id: &str,
        leads: &[CampaignLead],
        config: &DispatcherConfig,
    ) -> Result<AddLeadsResponse> {
        let url = format!("{}/leads/add", self.base_url);
        let request = AddLeadsRequest {
            campaign_id: campaign_id.to_string(),
            leads: leads.to_vec(),
            skip_if_in_workspace: config.skip_if_in_workspace,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let result: AddLeadsResponse = response.json().await?;
        info!(
            campaign_id,
            added = result.added,
            duplicates = result.duplicates,
            "Leads added to campaign"
        );
        Ok(result)
    }

    /// Activate a campaign to start sending.
    pub async fn activate(&self, campaign_id: &str) -> Result<()> {
        let url = format!("{}/campaigns/{}/activate", self.base_url, campaign_id);

        self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;

        info!(campaign_id, "Campaign activated");
        Ok(())
    }
}

/// Build the campaign creation payload: weekday sending window plus the
/// three-step sequence with template-variable subjects and bodies.
fn build_campaign_request(name: &str, config: &DispatcherConfig) -> CreateCampaignRequest {
    let schedule = CampaignSchedule {
        schedules: vec![ScheduleWindow {
            name: format!("{name} Schedule"),
            timing: ScheduleTiming {
                from: config.send_from.clone(),
                to: config.send_to.clone(),
            },
            days: ScheduleDays::weekdays(),
            timezone: config.timezone.clone(),
        }],
    };

    let sequence = Sequence {
        steps: vec![
            SequenceStep {
                step_type: "email".to_string(),
                delay: 0,
                variants: vec![
                    StepVariant {
                        subject: "{{subject_variant_a}}".to_string(),
                        body: "{{email_body}}".to_string(),
                    },
                    StepVariant {
                        subject: "{{subject_variant_b}}".to_string(),
                        body: "{{email_body}}".to_string(),
                    },
                    StepVariant {
                        subject: "{{subject_variant_c}}".to_string(),
                        body: "{{email_body}}".to_string(),
                    },
                ],
            },
            SequenceStep {
                step_type: "email".to_string(),
                delay: 3,
                variants: vec![StepVariant {
                    subject: "Re: {{subject_variant_a}}".to_string(),
                    body: "{{follow_up_day_3}}".to_string(),
                }],
            },
            SequenceStep {
                step_type: "email".to_string(),
                delay: 4,
                variants: vec![StepVariant {
                    subject: "Last note - {{problem_angle}}".to_string(),
                    body: "{{follow_up_day_7}}".to_string(),
                }],
            },
        ],
    };

    CreateCampaignRequest {
        name: name.to_string(),
        campaign_schedule: schedule,
        sequences: vec![sequence],
    }
}
