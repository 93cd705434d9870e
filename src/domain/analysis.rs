//! Analysis results and the request/response DTOs of the analysis endpoints.

use serde::{Deserialize, Serialize};

use super::intake::IntakeAnswers;

/// Risk severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskFactor {
    pub category: String,
    pub severity: Severity,
    pub mitigation: String,
}

impl RiskFactor {
    pub fn new(category: impl Into<String>, severity: Severity, mitigation: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            severity,
            mitigation: mitigation.into(),
        }
    }
}

/// Which analyzer produced a result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    #[default]
    Local,
    Remote,
}

/// Output of one analysis run. Always built fresh; a new result replaces the
/// previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    /// 0-100
    pub completeness_score: u8,
    pub missing_critical_info: Vec<String>,
    pub suggested_follow_ups: Vec<String>,
    pub risk_factors: Vec<RiskFactor>,
    pub estimated_duration: String,
    pub recommended_team_size: String,
    /// 1-10
    pub complexity_score: u8,
    #[serde(default)]
    pub source: AnalysisSource,
}

// =============================================================================
// Request/Response DTOs for API endpoints
// =============================================================================

/// Request for a stateless analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub answers: IntakeAnswers,
}

/// Request for a stateless SOW export. The analysis is recomputed when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SowRequest {
    pub answers: IntakeAnswers,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
}
