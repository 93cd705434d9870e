//! Forwards completed intakes to the lead relay (the email relay that notifies
//! the consulting team).
//!
//! Server errors and transport failures are retried with exponential backoff;
//! 4xx responses fail immediately.

use anyhow::{Context, Result};
use backoff::{future::retry, ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::domain::{AnalysisResult, IntakeAnswers, RiskFactor};
use crate::error::ApiError;

/// Payload sent to the relay.
#[derive(Debug, Clone, Serialize)]
pub struct LeadSubmission<'a> {
    pub session_id: String,
    pub answers: &'a IntakeAnswers,
    pub completeness_score: u8,
    pub complexity_score: u8,
    pub estimated_duration: &'a str,
    pub recommended_team_size: &'a str,
    pub risk_factors: &'a [RiskFactor],
    pub sow_generated: bool,
}

impl<'a> LeadSubmission<'a> {
    pub fn new(
        session_id: String,
        answers: &'a IntakeAnswers,
        analysis: &'a AnalysisResult,
        sow_generated: bool,
    ) -> Self {
        Self {
            session_id,
            answers,
            completeness_score: analysis.completeness_score,
            complexity_score: analysis.complexity_score,
            estimated_duration: &analysis.estimated_duration,
            recommended_team_size: &analysis.recommended_team_size,
            risk_factors: &analysis.risk_factors,
            sow_generated,
        }
    }
}

#[derive(Clone)]
pub struct LeadRelay {
    client: Client,
    url: Option<String>,
    token: Option<String>,
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl LeadRelay {
    pub fn new(url: Option<String>, token: Option<String>, max_elapsed_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        match &url {
            Some(url) => tracing::info!(url = %url, "Lead relay configured"),
            None => tracing::warn!("LEAD_RELAY_URL not set - submissions will only be logged"),
        }

        Ok(Self {
            client,
            url,
            token,
            initial_interval: Duration::from_millis(250),
            max_elapsed: Duration::from_secs(max_elapsed_seconds),
        })
    }

    /// A relay that only logs submissions.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            url: None,
            token: None,
            initial_interval: Duration::from_millis(250),
            max_elapsed: Duration::from_secs(0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    /// Deliver a lead. Returns whether it actually left the process.
    #[instrument(skip(self, lead), fields(session_id = %lead.session_id))]
    pub async fn send(&self, lead: &LeadSubmission<'_>) -> Result<bool, ApiError> {
        let Some(url) = &self.url else {
            info!(
                completeness = lead.completeness_score,
                sow_generated = lead.sow_generated,
                "Lead received (relay not configured)"
            );
            return Ok(false);
        };

        retry(self.backoff_policy(), || async move {
            let mut req = self.client.post(url).json(lead);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Lead relay request failed, retrying");
                    return Err(backoff::Error::transient(ApiError::SubmissionFailed(
                        "Lead relay unavailable".to_string(),
                    )));
                }
            };

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else if status.is_server_error() || status.as_u16() == 429 {
                warn!(status = %status, "Lead relay error, retrying");
                Err(backoff::Error::transient(ApiError::SubmissionFailed(
                    format!("Lead relay returned {}", status),
                )))
            } else {
                Err(backoff::Error::permanent(ApiError::SubmissionFailed(
                    format!("Lead relay rejected the submission ({})", status),
                )))
            }
        })
        .await?;

        info!(completeness = lead.completeness_score, "Lead relayed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::heuristic;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn relay_for(server: &MockServer) -> LeadRelay {
        let mut relay = LeadRelay::new(
            Some(format!("{}/leads", server.uri())),
            Some("relay-token".to_string()),
            1,
        )
        .unwrap();
        relay.initial_interval = Duration::from_millis(10);
        relay
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/leads"))
            .and(header("authorization", "Bearer relay-token"))
            .and(body_partial_json(serde_json::json!({
                "session_id": "abc",
                "sow_generated": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let answers = IntakeAnswers::new();
        let analysis = heuristic::analyze(&answers);
        let lead = LeadSubmission::new("abc".to_string(), &answers, &analysis, true);

        assert!(relay_for(&server).send(&lead).await.unwrap());
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/leads"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let answers = IntakeAnswers::new();
        let analysis = heuristic::analyze(&answers);
        let lead = LeadSubmission::new("abc".to_string(), &answers, &analysis, false);

        let err = relay_for(&server).send(&lead).await.unwrap_err();
        assert!(matches!(err, ApiError::SubmissionFailed(_)));
    }

    #[tokio::test]
    async fn test_server_error_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/leads"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/leads"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let answers = IntakeAnswers::new();
        let analysis = heuristic::analyze(&answers);
        let lead = LeadSubmission::new("abc".to_string(), &answers, &analysis, false);

        assert!(relay_for(&server).send(&lead).await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_relay_only_logs() {
        let answers = IntakeAnswers::new();
        let analysis = heuristic::analyze(&answers);
        let lead = LeadSubmission::new("abc".to_string(), &answers, &analysis, false);

        let relay = LeadRelay::disabled();
        assert!(!relay.is_configured());
        assert!(!relay.send(&lead).await.unwrap());
    }
}
