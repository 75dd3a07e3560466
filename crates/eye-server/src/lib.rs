//! HTTP surface for the EyeOfTerror orchestrator.
//!
//! | Method | Path                | Behavior                                  |
//! |--------|---------------------|-------------------------------------------|
//! | GET    | `/healthz`          | liveness probe                            |
//! | GET    | `/debug/controller` | controller endpoint + last error          |
//! | POST   | `/route`            | plan → execute → re-plan → execute        |
//! | POST   | `/ingest`           | log a line from a sibling service         |
//! | POST   | `/stt_result`       | log a pushed transcription                |
//!
//! Client-classified failures map to 400, dependency failures to 502, and
//! deadline/cancellation to 504. Every failure body is
//! `{ok: false, error: {kind, message}, logs}` where `logs` reflects the
//! steps that did complete.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use eye_core::Orchestrator;
use eye_types::EyeConfig;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Overall `/route` deadline; `None` means no deadline.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn from_config(config: &EyeConfig) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::from_config(config)),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Build the router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &EyeConfig) -> std::io::Result<()> {
    let state = AppState::from_config(config);
    let app = build_router(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "EyeOfTerror listening");
    axum::serve(listener, app).await
}
