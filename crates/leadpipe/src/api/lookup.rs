//! Contact lookup service client
//!
//! One lookup resolves a company domain to a decision-maker contact, or to an
//! explicit not-found. The [`LookupService`] trait is the seam the enrichment
//! loop is written against, so tests can inject an in-memory implementation
//! and the loop never needs network access.

use crate::config::EnricherConfig;
use async_trait::async_trait;
use leadpipe_common::types::ContactInfo;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::api::types::{LookupRequest, LookupResponse};

/// Per-call lookup failure.
///
/// These are consumed by the enrichment loop (retry, count, continue) and
/// never abort a run on their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Provider signalled rate limiting; the caller should back off and retry
    #[error("lookup rate limited")]
    RateLimited,

    /// API key rejected
    #[error("lookup unauthorized: check the API key")]
    Unauthorized,

    /// Account has no remaining lookup credits
    #[error("lookup refused: out of credits")]
    OutOfCredits,

    /// Timeout, malformed response, or unexpected status
    #[error("lookup failed: {0}")]
    Transport(String),
}

/// A service resolving a domain to a decision-maker contact.
///
/// `Ok(None)` is an explicit "attempted, not found" and is cached by the
/// enrichment loop just like a hit; callers must not repeat the call.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn find_decision_maker(
        &self,
        domain: &str,
        category: &str,
    ) -> std::result::Result<Option<ContactInfo>, LookupError>;
}

/// HTTP client for the hosted contact lookup service.
pub struct LookupClient {
    client: Client,
    endpoint_url: String,
    api_key: String,
}

impl LookupClient {
    /// Create a new client. `endpoint_url` is the full search endpoint URL.
    pub fn new(
        endpoint_url: impl Into<String>,
        api_key: impl Into<String>,
        config: &EnricherConfig,
    ) -> std::result::Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint_url: endpoint_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl LookupService for LookupClient {
    async fn find_decision_maker(
        &self,
        domain: &str,
        category: &str,
    ) -> std::result::Result<Option<ContactInfo>, LookupError> {
        let request = LookupRequest {
            domain: domain.to_string(),
            decision_maker_category: category.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: LookupResponse = response
                    .json()
                    .await
                    .map_err(|e| LookupError::Transport(e.to_string()))?;
                Ok(contact_from_response(body))
            }
            StatusCode::UNAUTHORIZED => Err(LookupError::Unauthorized),
            StatusCode::PAYMENT_REQUIRED => Err(LookupError::OutOfCredits),
            StatusCode::TOO_MANY_REQUESTS => Err(LookupError::RateLimited),
            status => Err(LookupError::Transport(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

/// Map a 200 response to a contact, or `None` when no usable email came back.
fn contact_from_response(body: LookupResponse) -> Option<ContactInfo> {
    let email = body.email?;
    if !email.contains('@') {
        return None;
    }

    Some(ContactInfo {
        email,
        first_name: first_name(&body.person_full_name),
        last_name: last_name(&body.person_full_name),
        title: body.person_job_title,
        linkedin_url: body.person_linkedin_url,
    })
}

fn first_name(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn last_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    if parts.len() > 1 {
        parts[parts.len() - 1].to_string()
    } else {
        String::new()
    }
}
