//! HTTP request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use eye_core::{OrchestrateError, RouteFailure};
use eye_types::InboundMessage;

use super::AppState;

/// Build all API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/debug/controller", get(debug_controller))
        .route("/route", post(route))
        .route("/ingest", post(ingest))
        .route("/stt_result", post(stt_result))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn debug_controller(State(state): State<AppState>) -> Json<Value> {
    Json(state.orchestrator.controller().debug_state())
}

async fn route(State(state): State<AppState>, Json(msg): Json<InboundMessage>) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("route", %request_id);

    let cancel = CancellationToken::new();
    if let Some(deadline) = state.request_timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            token.cancel();
        });
    }

    let outcome = state
        .orchestrator
        .route(&msg, &cancel)
        .instrument(span)
        .await;
    cancel.cancel();

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(failure) => failure_response(failure),
    }
}

fn failure_response(failure: RouteFailure) -> Response {
    let status = status_for(&failure.error);
    let body = json!({
        "ok": false,
        "error": {
            "kind": failure.error.kind(),
            "message": failure.error.to_string(),
        },
        "logs": failure.logs,
    });
    (status, Json(body)).into_response()
}

fn status_for(error: &OrchestrateError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        match error {
            OrchestrateError::Timeout | OrchestrateError::Canceled => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// A log line pushed by a sibling service in the federation.
#[derive(Debug, Deserialize)]
struct IngestBody {
    module: String,
    text: String,
}

async fn ingest(Json(body): Json<IngestBody>) -> Json<Value> {
    info!(module = %body.module, text = %body.text, "ingest");
    Json(json!({ "ok": true }))
}

async fn stt_result(Json(body): Json<Value>) -> Json<Value> {
    let text = body.get("text").and_then(Value::as_str).unwrap_or("");
    info!(%text, "stt result");
    Json(json!({ "ok": true }))
}
