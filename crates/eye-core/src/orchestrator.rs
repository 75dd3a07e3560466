//! Two-phase orchestration of one inbound message.
//!
//! Phase A plans over the inbound message and executes. If the execution
//! bound a `reply` or `full_text`, phase B re-plans over that output text
//! (`phase: "postprocess"`) and executes into the same context. The
//! delivered artifacts come from the phase-B plan's criteria when phase B
//! ran, else from phase A's.

use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use eye_http::HttpPool;
use eye_llm::ModelRouter;
use eye_tools::ToolRegistry;
use eye_types::{EyeConfig, InboundMessage, OrchestratorResult};

use crate::context::Context;
use crate::controller::{ControllerClient, Phase};
use crate::error::OrchestrateError;
use crate::executor::PlanExecutor;

/// A failed `/route`: the error plus every log line accumulated before it.
#[derive(Debug)]
pub struct RouteFailure {
    pub error: OrchestrateError,
    pub logs: Vec<String>,
}

impl RouteFailure {
    fn bare(error: OrchestrateError) -> Self {
        Self {
            error,
            logs: Vec::new(),
        }
    }
}

/// The request-scoped dependency bundle: controller client, tool
/// registry, and model router, wired to one shared HTTP pool.
#[derive(Debug)]
pub struct Orchestrator {
    controller: ControllerClient,
    executor: PlanExecutor,
}

impl Orchestrator {
    /// Assemble the full bundle from configuration.
    ///
    /// Order matters for nothing but clarity: resolve endpoints, build
    /// the registry, then the router, all over one pool.
    pub fn from_config(config: &EyeConfig) -> Self {
        Self::with_pool(config, HttpPool::new())
    }

    pub fn with_pool(config: &EyeConfig, pool: HttpPool) -> Self {
        let mut tools = ToolRegistry::new();
        eye_tools::register_all(&mut tools, pool.clone(), config);
        let models = ModelRouter::new(pool.clone(), config);
        let controller = ControllerClient::new(
            pool,
            config.controller.clone(),
            Duration::from_secs(config.call_timeout_secs),
        );
        Self {
            controller,
            executor: PlanExecutor::new(tools, models),
        }
    }

    /// The controller client, for the debug surface.
    pub fn controller(&self) -> &ControllerClient {
        &self.controller
    }

    /// Route one inbound message through plan → execute → re-plan →
    /// execute → deliver.
    #[instrument(skip_all)]
    pub async fn route(
        &self,
        msg: &InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<OrchestratorResult, RouteFailure> {
        if !msg.has_payload() {
            return Err(RouteFailure::bare(OrchestrateError::InvalidInput));
        }
        let inbound = serde_json::to_value(msg)
            .map_err(|e| RouteFailure::bare(OrchestrateError::Transport(e.to_string())))?;

        let mut ctx = Context::seeded(inbound.clone());

        // Phase A: plan over the inbound message.
        let plan_in = self
            .controller
            .plan(&inbound, Phase::Plan, cancel)
            .await
            .map_err(RouteFailure::bare)?;
        let mut logs = self
            .executor
            .execute(&plan_in, &mut ctx, cancel)
            .await
            .map_err(|f| RouteFailure {
                error: f.error,
                logs: f.trace,
            })?;

        // Phase B: if a model produced output text, re-plan over it.
        let mut plan_out = None;
        if ctx.contains("reply") || ctx.contains("full_text") {
            let text_out = ctx
                .resolve_path("reply.text")
                .and_then(Value::as_str)
                .or_else(|| ctx.resolve_path("full_text.text").and_then(Value::as_str))
                .unwrap_or("")
                .to_string();
            debug!(text_out_len = text_out.len(), "entering postprocess phase");

            let post_input = json!({ "text": text_out, "phase": "postprocess" });
            let plan = self
                .controller
                .plan(&post_input, Phase::Postprocess, cancel)
                .await
                .map_err(|error| RouteFailure {
                    error,
                    logs: logs.clone(),
                })?;

            ctx.set_input(json!({ "text": text_out }));
            match self.executor.execute(&plan, &mut ctx, cancel).await {
                Ok(trace) => logs.extend(trace),
                Err(f) => {
                    logs.extend(f.trace);
                    return Err(RouteFailure {
                        error: f.error,
                        logs,
                    });
                }
            }
            plan_out = Some(plan);
        }

        // Deliver: extract the requested context names, null when unbound.
        let deliver = &plan_out.as_ref().unwrap_or(&plan_in).criteria.deliver;
        let mut artifacts = serde_json::Map::with_capacity(deliver.len());
        for key in deliver {
            artifacts.insert(
                key.clone(),
                ctx.get(key).cloned().unwrap_or(Value::Null),
            );
        }

        Ok(OrchestratorResult {
            ok: true,
            artifacts,
            logs,
        })
    }
}
