pub mod health;
pub mod intake;
pub mod sessions;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/intake/steps", get(intake::list_steps))
        .route("/intake/analyze", post(intake::analyze))
        .route("/intake/sow", post(intake::export_sow))
        // Sessions
        .route("/intake/sessions", post(sessions::create_session))
        .route(
            "/intake/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/intake/sessions/:session_id/fields", put(sessions::set_fields))
        .route(
            "/intake/sessions/:session_id/validate",
            post(sessions::validate_step),
        )
        .route("/intake/sessions/:session_id/advance", post(sessions::advance))
        .route("/intake/sessions/:session_id/retreat", post(sessions::retreat))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{header, Request},
        response::Response,
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;

    use crate::app::{create_app, AppState};
    use crate::config::Settings;
    use crate::services::{Analyzer, LeadRelay, SessionStore};

    /// In-memory sessions, local analysis, log-only relay.
    pub fn local_state() -> Arc<AppState> {
        let settings = Settings::from_lookup(|_| None).unwrap();
        AppState::new(
            settings,
            SessionStore::memory(),
            Analyzer::new(None),
            LeadRelay::disabled(),
        )
    }

    pub fn local_app() -> Router {
        create_app(local_state())
    }

    pub fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
