use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::analysis::AnalysisResult;
use super::documents::GeneratedDocument;
use super::intake::{FieldId, IntakeAnswers};

/// Unit of persistence: one per session id, overwritten wholesale on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub answers: IntakeAnswers,
    pub current_step: usize,
    pub updated_at: DateTime<Utc>,
}

/// Field -> message, at most one message per field.
pub type ValidationErrors = BTreeMap<FieldId, String>;

/// One `setField` call.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    pub field: FieldId,
    pub value: String,
}

/// Request DTO for updating one or more fields
#[derive(Debug, Clone, Deserialize)]
pub struct SetFieldsRequest {
    pub updates: Vec<FieldUpdate>,
}

/// Response DTO for any session read or mutation
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: SessionRecord,
    pub step_count: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: ValidationErrors,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: ValidationErrors,
}

/// Result of the final submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub analysis: AnalysisResult,
    /// Present only when the completeness gate was met.
    pub document: Option<GeneratedDocument>,
    pub relayed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    pub advanced: bool,
    pub session: SessionRecord,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: ValidationErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionOutcome>,
}
