//! Worker model router.
//!
//! Resolves a plan's route descriptor (`{name, purpose}`) to a configured
//! endpoint and performs the chat completion. The `purpose` value never
//! reaches the worker verbatim; it selects a short system directive.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use eye_http::{HttpError, HttpPool, TimeoutClass};
use eye_types::{EyeConfig, Purpose, RouteEndpoint, RouteName};

use crate::types::{completions_url, ChatMessage, ChatRequest, ChatResponse};

/// Errors from worker model dispatch.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The plan named a route with no configured endpoint.
    #[error("unknown route: {0}")]
    UnknownRoute(RouteName),

    /// Transport, timeout, status, or cancellation from the pool.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered 2xx but not with a usable envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Routes model steps to configured worker endpoints.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    pool: HttpPool,
    routes: HashMap<RouteName, RouteEndpoint>,
    call_timeout: Duration,
}

impl ModelRouter {
    pub fn new(pool: HttpPool, config: &EyeConfig) -> Self {
        let routes = config
            .routes
            .iter()
            .cloned()
            .map(|r| (r.name, r))
            .collect();
        Self {
            pool,
            routes,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }

    /// The system directive sent for a given purpose.
    pub fn directive(purpose: Purpose) -> &'static str {
        match purpose {
            Purpose::Chat => "Answer briefly in Russian.",
            Purpose::Code => "Write correct, minimal code. Output code only.",
            Purpose::Reason => "Reason step by step, then answer concisely.",
            Purpose::Summarize => "Summarize the input in a few sentences.",
            Purpose::Plan => "Break the task into short, actionable steps.",
            Purpose::Main => "Answer helpfully and concisely.",
        }
    }

    /// Perform a chat completion against the named route.
    ///
    /// Returns `{"text": <content>}` so downstream steps can interpolate
    /// `${<emit>.text}`.
    pub async fn chat_complete(
        &self,
        route: RouteName,
        purpose: Purpose,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, ModelError> {
        let endpoint = self
            .routes
            .get(&route)
            .ok_or(ModelError::UnknownRoute(route))?;

        let request = ChatRequest::new(
            endpoint.model.clone(),
            vec![
                ChatMessage::system(Self::directive(purpose)),
                ChatMessage::user(user_text),
            ],
        )
        .temperature(0.0)
        .max_tokens(512);

        let url = completions_url(&endpoint.base);
        debug!(route = %route, purpose = %purpose, %url, "worker chat completion");

        let (_, body) = self
            .pool
            .post_json(
                &url,
                &serde_json::to_value(&request)?,
                TimeoutClass::Call(self.call_timeout),
                cancel,
            )
            .await?;

        let response: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        let content = response
            .content()
            .ok_or_else(|| ModelError::InvalidResponse("no choices in envelope".to_string()))?;

        Ok(json!({ "text": content }))
    }
}
