pub mod routes;
pub mod wire;

use crate::ai::openai::OpenAiClient;
use crate::ai::LanguageModel;
use crate::config::Config;
use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::github::ActivitySource;
use crate::orchestrator::Orchestrator;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, immutable handler state
#[derive(Clone)]
pub struct AppState {
    pub activity: Arc<dyn ActivitySource>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(activity: Arc<dyn ActivitySource>, model: Arc<dyn LanguageModel>) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&activity), model));
        Self {
            activity,
            orchestrator,
        }
    }

    /// Build the real GitHub and language model clients from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let github = GitHubClient::new(
            config.github_token()?.to_string(),
            &config.github_api_url,
            timeout,
        )?;
        let model = OpenAiClient::new(
            config.openai_api_key()?.to_string(),
            &config.openai_api_url,
            timeout,
        )?
        .with_model(config.model.clone())
        .with_temperature(config.temperature);

        Ok(Self::new(Arc::new(github), Arc::new(model)))
    }
}

/// Build the API router
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/repos", get(routes::list_repositories))
        .route(
            "/api/repos/:owner/:name/pull-requests",
            get(routes::list_pull_requests),
        )
        .route("/api/default-prompt", get(routes::default_prompt))
        .route("/api/generate-summary", post(routes::generate_summary))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = AppState::from_config(config)?;
    let app = router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
