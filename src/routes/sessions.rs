//! Intake session endpoints.
//!
//! Each request loads the stored draft (or starts a fresh one under the
//! requested id), applies one form operation and writes the snapshot back.
//! A failed snapshot write is logged and the response still reflects the
//! in-memory state; the next successful write supersedes it.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, JsonBody, NoContent};
use crate::app::AppState;
use crate::domain::{
    step_count, AdvanceResponse, SessionRecord, SessionResponse, SetFieldsRequest,
    ValidationResponse,
};
use crate::error::ApiResult;
use crate::middleware::RequestIdExt;
use crate::services::{AdvanceOutcome, IntakeForm};

async fn load_form(state: &AppState, session_id: Uuid) -> IntakeForm {
    match state.sessions.load(session_id).await {
        Some(record) => IntakeForm::from_record(record),
        None => IntakeForm::new(session_id),
    }
}

async fn persist(state: &AppState, form: &IntakeForm) -> SessionRecord {
    match state
        .sessions
        .save(form.session_id(), form.answers(), form.current_step())
        .await
    {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(session_id = %form.session_id(), error = ?e, "Failed to persist session");
            form.to_record()
        }
    }
}

fn session_response(form: &IntakeForm, session: SessionRecord) -> SessionResponse {
    SessionResponse {
        session,
        step_count: step_count(),
        errors: form.errors().clone(),
    }
}

/// Start a session.
///
/// POST /intake/sessions
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let form = IntakeForm::new(Uuid::new_v4());
    let session = persist(&state, &form).await;

    tracing::info!(session_id = %form.session_id(), "Intake session started");
    Created(session_response(&form, session))
}

/// Resume a session. Unknown or unreadable drafts come back fresh.
///
/// GET /intake/sessions/:session_id
pub async fn get_session(
    Path(session_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let (form, session) = match state.sessions.load(session_id).await {
        Some(record) => (IntakeForm::from_record(record.clone()), record),
        None => {
            let form = IntakeForm::new(session_id);
            let session = form.to_record();
            (form, session)
        }
    };

    DataResponse::new(session_response(&form, session))
}

/// Set one or more fields, last write wins.
///
/// PUT /intake/sessions/:session_id/fields
pub async fn set_fields(
    Path(session_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SetFieldsRequest>,
) -> impl IntoResponse {
    let mut form = load_form(&state, session_id).await;
    for update in req.updates {
        form.set_field(update.field, update.value);
    }
    let session = persist(&state, &form).await;

    DataResponse::new(session_response(&form, session))
}

/// Validate the current step without moving.
///
/// POST /intake/sessions/:session_id/validate
pub async fn validate_step(
    Path(session_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let mut form = load_form(&state, session_id).await;
    let valid = form.validate_current_step();

    DataResponse::new(ValidationResponse {
        valid,
        errors: form.errors().clone(),
    })
}

/// Move forward; on the last step this performs the final submission.
///
/// POST /intake/sessions/:session_id/advance
pub async fn advance(
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let request_id = headers.request_id();
    let mut form = load_form(&state, session_id).await;

    let response = match form.advance(&state.analyzer, request_id).await {
        AdvanceOutcome::Blocked => AdvanceResponse {
            advanced: false,
            session: form.to_record(),
            errors: form.errors().clone(),
            analysis: None,
            submission: None,
        },
        AdvanceOutcome::Moved { analysis } => AdvanceResponse {
            advanced: true,
            session: persist(&state, &form).await,
            errors: Default::default(),
            analysis,
            submission: None,
        },
        AdvanceOutcome::ReadyToSubmit => {
            // The draft must survive a failed submission
            persist(&state, &form).await;
            let outcome = state.submission().submit(&form, request_id).await?;
            AdvanceResponse {
                advanced: true,
                session: form.to_record(),
                errors: Default::default(),
                analysis: None,
                submission: Some(outcome),
            }
        }
    };

    Ok(DataResponse::new(response))
}

/// Step back without validating.
///
/// POST /intake/sessions/:session_id/retreat
pub async fn retreat(
    Path(session_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let mut form = load_form(&state, session_id).await;
    let session = if form.retreat() {
        persist(&state, &form).await
    } else {
        form.to_record()
    };

    DataResponse::new(session_response(&form, session))
}

/// Discard a draft. Deleting an unknown id is not an error.
///
/// DELETE /intake/sessions/:session_id
pub async fn delete_session(
    Path(session_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<NoContent> {
    state.sessions.delete(session_id).await?;
    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use crate::domain::{FieldId, IntakeAnswers};
    use crate::routes::test_support::{body_json, local_state, request};
    use crate::services::analysis::heuristic::tests::complete_answers;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn updates(answers: &IntakeAnswers) -> Value {
        let updates: Vec<Value> = answers
            .iter()
            .map(|(field, value)| json!({ "field": field, "value": value }))
            .collect();
        json!({ "updates": updates })
    }

    #[tokio::test]
    async fn test_create_session() {
        let state = local_state();
        let app = crate::app::create_app(state.clone());

        let response = app
            .oneshot(request("POST", "/intake/sessions", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["data"]["session"]["current_step"], 0);
        assert_eq!(body["data"]["step_count"], 6);

        let id: Uuid = body["data"]["session"]["session_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(state.sessions.load(id).await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_session_starts_fresh() {
        let id = Uuid::new_v4();
        let app = crate::app::create_app(local_state());

        let response = app
            .oneshot(request("GET", &format!("/intake/sessions/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["session"]["session_id"], id.to_string());
        assert_eq!(body["data"]["session"]["answers"], json!({}));
        assert_eq!(body["data"]["session"]["current_step"], 0);
    }

    #[tokio::test]
    async fn test_set_fields_persists_snapshot() {
        let id = Uuid::new_v4();
        let state = local_state();
        let app = crate::app::create_app(state.clone());

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/intake/sessions/{}/fields", id),
                Some(json!({ "updates": [
                    { "field": "industry", "value": "Retail" },
                    { "field": "industry", "value": "Energy" }
                ]})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let record = state.sessions.load(id).await.unwrap();
        assert_eq!(record.answers.get(FieldId::Industry), "Energy");
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let app = crate::app::create_app(local_state());

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/intake/sessions/{}/fields", Uuid::new_v4()),
                Some(json!({ "updates": [{ "field": "favourite_colour", "value": "blue" }] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_validate_reports_field_errors() {
        let app = crate::app::create_app(local_state());

        let response = app
            .oneshot(request(
                "POST",
                &format!("/intake/sessions/{}/validate", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(body["data"]["errors"]["organization_name"], "Organization Name is required");
        assert_eq!(body["data"]["errors"].as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_advance_blocked_keeps_step() {
        let id = Uuid::new_v4();
        let state = local_state();
        let mut answers = IntakeAnswers::new();
        answers.set(FieldId::OrganizationName, "Acme");
        answers.set(FieldId::CompanySize, "51-200");
        answers.set(FieldId::ConsultingCategory, "STRATEGY");
        state.sessions.save(id, &answers, 0).await.unwrap();

        let response = crate::app::create_app(state.clone())
            .oneshot(request("POST", &format!("/intake/sessions/{}/advance", id), None))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["data"]["advanced"], false);
        assert_eq!(body["data"]["session"]["current_step"], 0);
        assert_eq!(body["data"]["errors"]["industry"], "Industry is required");
        assert_eq!(state.sessions.load(id).await.unwrap().current_step, 0);
    }

    #[tokio::test]
    async fn test_advance_from_trigger_step_returns_analysis() {
        let id = Uuid::new_v4();
        let state = local_state();
        state.sessions.save(id, &complete_answers(), 1).await.unwrap();

        let response = crate::app::create_app(state.clone())
            .oneshot(request("POST", &format!("/intake/sessions/{}/advance", id), None))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["data"]["advanced"], true);
        assert_eq!(body["data"]["session"]["current_step"], 2);
        assert_eq!(body["data"]["analysis"]["completeness_score"], 100);
        assert_eq!(body["data"]["analysis"]["source"], "local");
        assert_eq!(state.sessions.load(id).await.unwrap().current_step, 2);
    }

    #[tokio::test]
    async fn test_full_walkthrough_submits_and_clears() {
        let id = Uuid::new_v4();
        let state = local_state();
        let app = crate::app::create_app(state.clone());

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/intake/sessions/{}/fields", id),
                Some(updates(&complete_answers())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut last = Value::Null;
        for _ in 0..6 {
            let response = app
                .clone()
                .oneshot(request("POST", &format!("/intake/sessions/{}/advance", id), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            last = body_json(response).await;
            assert_eq!(last["data"]["advanced"], true);
        }

        let submission = &last["data"]["submission"];
        assert_eq!(submission["relayed"], false);
        assert_eq!(submission["analysis"]["completeness_score"], 100);
        assert!(submission["document"]["content"]
            .as_str()
            .unwrap()
            .starts_with("# Statement of Work"));
        assert!(state.sessions.load(id).await.is_none());
    }

    #[tokio::test]
    async fn test_retreat_and_delete() {
        let id = Uuid::new_v4();
        let state = local_state();
        state.sessions.save(id, &complete_answers(), 3).await.unwrap();
        let app = crate::app::create_app(state.clone());

        let response = app
            .clone()
            .oneshot(request("POST", &format!("/intake/sessions/{}/retreat", id), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["session"]["current_step"], 2);

        let response = app
            .oneshot(request("DELETE", &format!("/intake/sessions/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.load(id).await.is_none());
    }
}
