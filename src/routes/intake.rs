//! Stateless intake endpoints: the step table, analysis and SOW export.

use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use chrono::Utc;
use std::sync::Arc;

use crate::api::{DataResponse, JsonBody, MarkdownAttachment};
use crate::app::AppState;
use crate::domain::{AnalyzeRequest, IntakeStep, SowRequest, INTAKE_STEPS};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestIdExt;
use crate::services::{sow, submission::meets_sow_threshold};

/// GET /intake/steps
pub async fn list_steps() -> DataResponse<&'static [IntakeStep]> {
    DataResponse::new(&INTAKE_STEPS[..])
}

/// Analyze a set of answers without touching any session.
///
/// POST /intake/analyze
pub async fn analyze(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AnalyzeRequest>,
) -> impl IntoResponse {
    let analysis = state
        .analyzer
        .analyze(&req.answers, headers.request_id())
        .await;
    DataResponse::new(analysis)
}

/// Export a SOW as a markdown download.
///
/// POST /intake/sow
pub async fn export_sow(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SowRequest>,
) -> ApiResult<MarkdownAttachment> {
    let analysis = match req.analysis {
        Some(analysis) => analysis,
        None => {
            state
                .analyzer
                .analyze(&req.answers, headers.request_id())
                .await
        }
    };

    let threshold = state.settings.sow_min_completeness;
    if !meets_sow_threshold(&analysis, threshold) {
        return Err(ApiError::Unprocessable(format!(
            "Completeness score {}% is below the {}% required for a Statement of Work",
            analysis.completeness_score, threshold
        )));
    }

    let document = sow::build_document(&req.answers, &analysis, Utc::now());
    tracing::info!(filename = %document.filename, "SOW exported");

    Ok(MarkdownAttachment {
        filename: document.filename,
        content: document.content,
    })
}
