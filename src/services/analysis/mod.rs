//! Completeness and risk analysis of intake answers.
//!
//! Two interchangeable analyzers share the `analyze(answers)` contract:
//! - [`LocalAnalyzer`]: rule evaluation, always available
//! - [`RemoteAnalyzer`]: delegates to the generative API, falling back to the
//!   local rules per field or wholesale

pub mod heuristic;
pub mod remote;

pub use heuristic::LocalAnalyzer;
pub use remote::RemoteAnalyzer;

use crate::domain::{AnalysisResult, IntakeAnswers};
use crate::services::ai_client::AiClient;

/// The analyzer selected at start-up.
#[derive(Clone)]
pub enum Analyzer {
    Local(LocalAnalyzer),
    Remote(RemoteAnalyzer),
}

impl Analyzer {
    /// Remote when a client is configured, local otherwise. Without a
    /// credential no outbound call is ever attempted.
    pub fn new(client: Option<AiClient>) -> Self {
        match client {
            Some(client) => Self::Remote(RemoteAnalyzer::new(client)),
            None => Self::Local(LocalAnalyzer),
        }
    }

    pub async fn analyze(
        &self,
        answers: &IntakeAnswers,
        request_id: Option<&str>,
    ) -> AnalysisResult {
        match self {
            Self::Local(local) => local.analyze(answers).await,
            Self::Remote(remote) => remote.analyze(answers, request_id).await,
        }
    }

    pub fn ai_client(&self) -> Option<&AiClient> {
        match self {
            Self::Local(_) => None,
            Self::Remote(remote) => Some(remote.client()),
        }
    }
}
