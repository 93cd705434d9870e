use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub session_store: String,
    pub session_backend: String,
    pub ai_service: String,
    pub lead_relay: String,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let ai_check = async {
        match state.analyzer.ai_client() {
            Some(client) => Some(client.health_check().await.is_ok()),
            None => None,
        }
    };

    let (store_result, ai_result) = tokio::join!(state.sessions.health_check(), ai_check);

    let store_status = if store_result.is_ok() { "ok" } else { "error" };
    let ai_status = match ai_result {
        Some(true) => "ok",
        Some(false) => "error",
        None => "disabled",
    };

    // The local analyzer covers a generative API outage, the store is critical
    let status = match (store_result.is_ok(), ai_result) {
        (false, _) => "unhealthy",
        (true, Some(false)) => "degraded",
        (true, _) => "healthy",
    };

    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                session_store: store_status.to_string(),
                session_backend: state.sessions.backend_name().to_string(),
                ai_service: ai_status.to_string(),
                lead_relay: if state.relay.is_configured() {
                    "configured"
                } else {
                    "log_only"
                }
                .to_string(),
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_json, local_app};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_with_local_backends() {
        let response = local_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["session_backend"], "memory");
        assert_eq!(body["services"]["ai_service"], "disabled");
        assert_eq!(body["services"]["lead_relay"], "log_only");
    }
}
