//! Controller client: ask the planner model for a JSON execution plan.
//!
//! The controller's output is untrusted text. The trust boundary is the
//! schema validator -- there is no best-effort acceptance. When any stage
//! fails (transport, status, no JSON found, schema mismatch) and fallback
//! is enabled for the current phase, the deterministic planner takes over;
//! otherwise the error surfaces. The last failure is kept for
//! `/debug/controller`.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use eye_http::{HttpPool, TimeoutClass};
use eye_llm::{completions_url, ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use eye_types::{ControllerConfig, Plan, SchemaError};

use crate::error::OrchestrateError;
use crate::fallback;
use crate::json_extract;

/// Which planning pass is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial planning over the inbound message.
    Plan,
    /// Re-planning over the phase-A output text.
    Postprocess,
}

const SYSTEM_PROMPT: &str = r#"You are the EyeOfTerror controller.
Always answer with exactly one JSON object and no other text.
Response format:
{
  "version": "1.0",
  "route_parts": {},
  "steps": [
    {"id":"m1","kind":"model","route":{"name":"20b","purpose":"chat"},"wait_for":[],"emit":"reply"}
  ],
  "criteria": {
    "success_when": ["reply"],
    "deliver": ["reply"]
  }
}
Tool steps use {"id":"t1","kind":"tool","call":{"tool":"tts.speak","args":{"text":"..."}},"wait_for":[],"emit":"speech"}.
No explanations, no text outside the JSON object.
"#;

/// Client for the controller endpoint, plus the fallback decision.
#[derive(Debug)]
pub struct ControllerClient {
    pool: HttpPool,
    config: ControllerConfig,
    call_timeout: Duration,
    last_error: Mutex<Option<String>>,
}

impl ControllerClient {
    pub fn new(pool: HttpPool, config: ControllerConfig, call_timeout: Duration) -> Self {
        Self {
            pool,
            config,
            call_timeout,
            last_error: Mutex::new(None),
        }
    }

    /// Produce a plan for `input` in the given phase.
    pub async fn plan(
        &self,
        input: &Value,
        phase: Phase,
        cancel: &CancellationToken,
    ) -> Result<Plan, OrchestrateError> {
        if !self.config.enabled {
            self.record_error("controller disabled");
            return Ok(fallback::build_plan(input));
        }

        match self.request_plan(input, cancel).await {
            Ok(plan) => Ok(plan),
            Err(OrchestrateError::Canceled) => Err(OrchestrateError::Canceled),
            Err(error) => {
                self.record_error(error.to_string());
                if self.fallback_allowed(phase) {
                    warn!(%error, ?phase, "controller failed, using fallback planner");
                    Ok(fallback::build_plan(input))
                } else {
                    Err(error)
                }
            }
        }
    }

    async fn request_plan(
        &self,
        input: &Value,
        cancel: &CancellationToken,
    ) -> Result<Plan, OrchestrateError> {
        let user = format!(
            "{}\nAnswer with exactly one JSON object and nothing else.",
            serde_json::to_string(input)
                .map_err(|e| OrchestrateError::Transport(e.to_string()))?
        );
        let request = ChatRequest::new(
            self.config.model.clone(),
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
        )
        .temperature(0.0)
        .max_tokens(128)
        .response_format(ResponseFormat::json_object());

        let (_, body) = self
            .pool
            .post_json(
                &self.endpoint(),
                &serde_json::to_value(&request)
                    .map_err(|e| OrchestrateError::Transport(e.to_string()))?,
                TimeoutClass::Call(self.call_timeout),
                cancel,
            )
            .await?;

        let envelope: ChatResponse = serde_json::from_slice(&body).map_err(|e| {
            OrchestrateError::Schema(SchemaError::new("$", format!("controller envelope: {e}")))
        })?;
        let content = envelope.content().ok_or_else(|| {
            OrchestrateError::Schema(SchemaError::new("$", "controller envelope has no choices"))
        })?;

        let value = json_extract::extract_object(content)
            .map_err(|e| OrchestrateError::Schema(SchemaError::new("$", e.to_string())))?;
        Ok(Plan::from_value(value)?)
    }

    fn fallback_allowed(&self, phase: Phase) -> bool {
        match phase {
            Phase::Plan => self.config.fallback_plan,
            Phase::Postprocess => self.config.fallback_post,
        }
    }

    fn endpoint(&self) -> String {
        completions_url(&self.config.base)
    }

    fn record_error(&self, message: impl Into<String>) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(message.into());
        }
    }

    /// State for `/debug/controller`.
    pub fn debug_state(&self) -> Value {
        let last_error = self
            .last_error
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        json!({
            "base": self.config.base,
            "endpoint": self.endpoint(),
            "last_error": last_error,
        })
    }
}
