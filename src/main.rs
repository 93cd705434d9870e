mod api;
mod app;
mod config;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use services::{AiClient, Analyzer, LeadRelay, RedisSessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting intake service"
    );

    let sessions = match &settings.redis_url {
        Some(url) => SessionStore::Redis(
            RedisSessionStore::new(url, settings.session_ttl_seconds).await?,
        ),
        None => {
            tracing::warn!("REDIS_URL not set - drafts are kept in process memory");
            SessionStore::memory()
        }
    };
    tracing::info!(backend = sessions.backend_name(), "Session store initialized");

    // Without a key the local rules are the only analyzer
    let ai_client = match &settings.ai_api_key {
        Some(key) => Some(AiClient::new(
            &settings.ai_api_url,
            key,
            &settings.ai_model,
            settings.ai_timeout_seconds,
        )?),
        None => {
            tracing::info!("AI_API_KEY not set - using local analysis only");
            None
        }
    };

    if let Some(client) = ai_client.clone() {
        tokio::spawn(async move {
            match client.health_check().await {
                Ok(()) => tracing::info!("Generative API is reachable"),
                Err(e) => tracing::warn!(error = %e, "Generative API health check failed - local fallback stays available"),
            }
        });
    }

    let relay = LeadRelay::new(
        settings.lead_relay_url.clone(),
        settings.lead_relay_token.clone(),
        settings.lead_relay_max_elapsed_seconds,
    )?;

    let state = app::AppState::new(settings.clone(), sessions, Analyzer::new(ai_client), relay);

    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
