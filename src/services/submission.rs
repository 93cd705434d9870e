//! Final submission of a completed intake.
//!
//! Final analysis, optional SOW (gated on completeness), lead relay, then the
//! draft is discarded. A relay failure leaves the draft in place so the
//! visitor can retry without re-entering anything.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::{AnalysisResult, SubmissionOutcome};
use crate::error::ApiError;
use crate::services::analysis::Analyzer;
use crate::services::intake_form::IntakeForm;
use crate::services::lead_relay::{LeadRelay, LeadSubmission};
use crate::services::session_store::SessionStore;
use crate::services::sow;

/// Whether an analysis is complete enough to back a SOW.
pub fn meets_sow_threshold(analysis: &AnalysisResult, min_completeness: u8) -> bool {
    analysis.completeness_score >= min_completeness
}

/// Collaborators of the submission flow.
pub struct Submission<'a> {
    pub analyzer: &'a Analyzer,
    pub relay: &'a LeadRelay,
    pub sessions: &'a SessionStore,
    pub min_completeness: u8,
}

impl Submission<'_> {
    #[instrument(skip(self, form), fields(session_id = %form.session_id()))]
    pub async fn submit(
        &self,
        form: &IntakeForm,
        request_id: Option<&str>,
    ) -> Result<SubmissionOutcome, ApiError> {
        let answers = form.answers();
        let analysis = self.analyzer.analyze(answers, request_id).await;

        let document = if meets_sow_threshold(&analysis, self.min_completeness) {
            Some(sow::build_document(answers, &analysis, Utc::now()))
        } else {
            info!(
                completeness = analysis.completeness_score,
                threshold = self.min_completeness,
                "Completeness below threshold, no SOW generated"
            );
            None
        };

        let lead = LeadSubmission::new(
            form.session_id().to_string(),
            answers,
            &analysis,
            document.is_some(),
        );
        let relayed = self.relay.send(&lead).await?;

        if let Err(e) = self.sessions.delete(form.session_id()).await {
            warn!(error = %e, "Failed to discard submitted session");
        }

        info!(
            completeness = analysis.completeness_score,
            sow_generated = document.is_some(),
            relayed,
            "Intake submitted"
        );

        Ok(SubmissionOutcome {
            analysis,
            document,
            relayed,
        })
    }
}
