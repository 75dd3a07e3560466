//! Plan executor: sequential evaluation of the step DAG.
//!
//! Steps run in declaration order; every `wait_for` id must already be
//! done when a step starts. This is the minimum-conformance scheduling
//! contract -- a parallel evaluator would produce the same outputs for
//! well-formed plans and differ only in wall time, so sequential keeps the
//! context single-owner with the outbound HTTP calls as the only
//! suspension points.
//!
//! Any step failure aborts the execution; the failure carries the trace of
//! the steps that did complete, and the partially-updated context stays
//! with the caller (it is not surfaced on the error path).

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use eye_llm::ModelRouter;
use eye_tools::ToolRegistry;
use eye_types::{Plan, Step, StepKind};

use crate::context::Context;
use crate::error::OrchestrateError;

/// A failed execution: the error plus the completed-step trace.
#[derive(Debug)]
pub struct ExecutionFailure {
    pub error: OrchestrateError,
    pub trace: Vec<String>,
}

/// Evaluates validated plans against the tool registry and model router.
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    tools: ToolRegistry,
    models: ModelRouter,
}

impl PlanExecutor {
    pub fn new(tools: ToolRegistry, models: ModelRouter) -> Self {
        Self { tools, models }
    }

    /// Execute `plan` against `ctx`, returning the step trace.
    #[instrument(skip_all, fields(steps = plan.steps.len()))]
    pub async fn execute(
        &self,
        plan: &Plan,
        ctx: &mut Context,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, ExecutionFailure> {
        let mut done: Vec<&str> = Vec::with_capacity(plan.steps.len());
        let mut emitted: Vec<&str> = Vec::new();
        let mut trace: Vec<String> = Vec::new();

        for step in &plan.steps {
            if cancel.is_cancelled() {
                return Err(fail(OrchestrateError::Canceled, trace));
            }

            for dep in &step.wait_for {
                if !done.contains(&dep.as_str()) {
                    return Err(fail(
                        OrchestrateError::DependencyMissing {
                            step: step.id.clone(),
                            dep: dep.clone(),
                        },
                        trace,
                    ));
                }
            }

            let (result, entry) = match self.run_step(step, ctx, cancel).await {
                Ok(pair) => pair,
                Err(error) => return Err(fail(error, trace)),
            };

            if let Some(emit) = &step.emit {
                if emitted.contains(&emit.as_str()) {
                    return Err(fail(
                        OrchestrateError::EmitConflict { name: emit.clone() },
                        trace,
                    ));
                }
                emitted.push(emit.as_str());
                ctx.bind(emit.clone(), result);
            }

            done.push(step.id.as_str());
            debug!(step = %step.id, %entry, "step complete");
            trace.push(entry);
        }

        Ok(trace)
    }

    async fn run_step(
        &self,
        step: &Step,
        ctx: &Context,
        cancel: &CancellationToken,
    ) -> Result<(Value, String), OrchestrateError> {
        let emit = step.emit.as_deref().unwrap_or("-");
        match step.kind {
            StepKind::Tool => {
                let call = step
                    .call
                    .as_ref()
                    .ok_or_else(|| OrchestrateError::BadStep(step.id.clone()))?;
                let tool = self
                    .tools
                    .get(call.tool)
                    .ok_or(OrchestrateError::UnknownTool(call.tool))?;
                let args = interpolate_args(&call.args, ctx);
                let result = tool.execute(&args, cancel).await?;
                Ok((result, format!("tool {} -> {}", call.tool, emit)))
            }
            StepKind::Model => {
                let route = step
                    .route
                    .as_ref()
                    .ok_or_else(|| OrchestrateError::BadStep(step.id.clone()))?;
                let result = self
                    .models
                    .chat_complete(route.name, route.purpose, ctx.input_text(), cancel)
                    .await?;
                Ok((
                    result,
                    format!("model {}/{} -> {}", route.name, route.purpose, emit),
                ))
            }
        }
    }
}

fn fail(error: OrchestrateError, trace: Vec<String>) -> ExecutionFailure {
    ExecutionFailure { error, trace }
}

/// Interpolate variable references in a tool argument map.
///
/// A *string* value of exactly the form `${a.b.c}` is replaced by the
/// context value at that dotted path; an unresolvable path degrades to
/// `""`. All other values (non-matching strings, non-strings, nested
/// structures) pass through unchanged.
pub fn interpolate_args(
    args: &serde_json::Map<String, Value>,
    ctx: &Context,
) -> serde_json::Map<String, Value> {
    let mut out = serde_json::Map::with_capacity(args.len());
    for (key, value) in args {
        let resolved = match value {
            Value::String(s) => match reference_path(s) {
                Some(path) => ctx
                    .resolve_path(path)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new())),
                None => value.clone(),
            },
            other => other.clone(),
        };
        out.insert(key.clone(), resolved);
    }
    out
}

/// The dotted path of a whole-string `${...}` reference, if `s` is one.
///
/// Segments must be non-empty and free of `{`, `}` and `$`, so strings
/// that merely contain a reference (`"${a} and more"`, `"${a}${b}"`) pass
/// through as literals.
fn reference_path(s: &str) -> Option<&str> {
    let path = s.strip_prefix("${")?.strip_suffix('}')?;
    let well_formed = !path.is_empty()
        && path
            .split('.')
            .all(|seg| !seg.is_empty() && !seg.contains(['{', '}', '$']));
    well_formed.then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn literal_args_pass_through_unchanged() {
        let ctx = Context::default();
        let input = args(&[
            ("text", json!("plain")),
            ("count", json!(3)),
            ("nested", json!({"inner": "${reply.text}"})),
        ]);
        let out = interpolate_args(&input, &ctx);
        assert_eq!(Value::Object(out), Value::Object(input));
    }

    #[test]
    fn bound_reference_substitutes_exact_value() {
        let mut ctx = Context::default();
        ctx.bind("reply", json!({"text": "привет"}));
        let out = interpolate_args(&args(&[("text", json!("${reply.text}"))]), &ctx);
        assert_eq!(out["text"], "привет");
    }

    #[test]
    fn reference_can_substitute_non_string_values() {
        let mut ctx = Context::default();
        ctx.bind("speech", json!({"meta": {"rate": 24000}}));
        let out = interpolate_args(&args(&[("rate", json!("${speech.meta.rate}"))]), &ctx);
        assert_eq!(out["rate"], 24000);
    }

    #[test]
    fn unresolvable_reference_degrades_to_empty_string() {
        let ctx = Context::default();
        let out = interpolate_args(&args(&[("text", json!("${reply.text}"))]), &ctx);
        assert_eq!(out["text"], "");
    }

    #[test]
    fn partial_reference_is_a_literal() {
        let mut ctx = Context::default();
        ctx.bind("a", json!("x"));
        for literal in ["${a} and more", "${a}${a}", "prefix ${a}", "${}", "${a..b}"] {
            let out = interpolate_args(&args(&[("text", json!(literal))]), &ctx);
            assert_eq!(out["text"], *literal, "for {literal:?}");
        }
    }

    #[test]
    fn reference_path_accepts_dotted_keys() {
        assert_eq!(reference_path("${reply.text}"), Some("reply.text"));
        assert_eq!(reference_path("${transcript}"), Some("transcript"));
        assert_eq!(reference_path("plain"), None);
        assert_eq!(reference_path("${}"), None);
    }

    // -- executor scheduling, tool-only plans ---------------------------

    use eye_types::{Criteria, Plan, StepKind, ToolCall, ToolName};
    use tokio_util::sync::CancellationToken;

    fn display_step(id: &str, text: Value, wait_for: &[&str], emit: Option<&str>) -> eye_types::Step {
        let mut call_args = serde_json::Map::new();
        call_args.insert("text".to_string(), text);
        eye_types::Step {
            id: id.to_string(),
            kind: StepKind::Tool,
            route: None,
            call: Some(ToolCall {
                tool: ToolName::RenderDisplay,
                args: call_args,
            }),
            wait_for: wait_for.iter().map(|s| s.to_string()).collect(),
            emit: emit.map(|s| s.to_string()),
        }
    }

    fn tool_only_plan(steps: Vec<eye_types::Step>) -> Plan {
        Plan {
            version: eye_types::PLAN_VERSION.to_string(),
            route_parts: Default::default(),
            steps,
            criteria: Criteria::default(),
        }
    }

    fn executor_with_display() -> PlanExecutor {
        let mut tools = ToolRegistry::new();
        tools.register(std::sync::Arc::new(eye_tools::RenderDisplayTool));
        let mut config = eye_types::EyeConfig::from_env();
        config.routes.clear();
        let models = ModelRouter::new(eye_http::HttpPool::new(), &config);
        PlanExecutor::new(tools, models)
    }

    #[tokio::test]
    async fn chain_executes_in_order_and_binds_emits() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![
            display_step("d1", json!("first"), &[], Some("one")),
            display_step("d2", json!("${one.text}"), &["d1"], Some("two")),
        ]);
        let mut ctx = Context::seeded(json!({"text": "in"}));
        let trace = executor
            .execute(&plan, &mut ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            trace,
            vec![
                "tool render.display -> one",
                "tool render.display -> two"
            ]
        );
        assert_eq!(ctx.get("one").unwrap()["text"], "first");
        // d2 saw d1's emission through interpolation.
        assert_eq!(ctx.get("two").unwrap()["text"], "first");
    }

    #[tokio::test]
    async fn step_without_emit_binds_nothing() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![display_step("d1", json!("x"), &[], None)]);
        let mut ctx = Context::default();
        let trace = executor
            .execute(&plan, &mut ctx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(trace, vec!["tool render.display -> -"]);
        assert!(ctx.get("x").is_none());
    }

    #[tokio::test]
    async fn forward_reference_fails_at_run_time() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![
            display_step("d1", json!("x"), &["later"], Some("one")),
            display_step("later", json!("y"), &[], Some("two")),
        ]);
        let mut ctx = Context::default();
        let failure = executor
            .execute(&plan, &mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            OrchestrateError::DependencyMissing { .. }
        ));
        assert!(failure.trace.is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_completed_trace() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![
            display_step("d1", json!("ok"), &[], Some("one")),
            display_step("d2", json!(42), &["d1"], Some("two")),
        ]);
        let mut ctx = Context::default();
        let failure = executor
            .execute(&plan, &mut ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        // Non-string text: the handler rejects it after d1 completed.
        assert!(matches!(failure.error, OrchestrateError::Tool(_)));
        assert_eq!(failure.trace, vec!["tool render.display -> one"]);
    }

    #[tokio::test]
    async fn empty_registry_is_unknown_tool() {
        let mut config = eye_types::EyeConfig::from_env();
        config.routes.clear();
        let executor = PlanExecutor::new(
            ToolRegistry::new(),
            ModelRouter::new(eye_http::HttpPool::new(), &config),
        );
        let plan = tool_only_plan(vec![display_step("d1", json!("x"), &[], None)]);
        let failure = executor
            .execute(&plan, &mut Context::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            OrchestrateError::UnknownTool(ToolName::RenderDisplay)
        ));
    }

    #[tokio::test]
    async fn mismatched_payload_is_bad_step() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![eye_types::Step {
            id: "broken".to_string(),
            kind: StepKind::Tool,
            route: None,
            call: None,
            wait_for: vec![],
            emit: None,
        }]);
        let failure = executor
            .execute(&plan, &mut Context::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, OrchestrateError::BadStep(_)));
    }

    #[tokio::test]
    async fn duplicate_emit_is_a_conflict() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![
            display_step("d1", json!("a"), &[], Some("out")),
            display_step("d2", json!("b"), &["d1"], Some("out")),
        ]);
        let failure = executor
            .execute(&plan, &mut Context::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            OrchestrateError::EmitConflict { .. }
        ));
    }

    #[tokio::test]
    async fn canceled_token_stops_before_first_step() {
        let executor = executor_with_display();
        let plan = tool_only_plan(vec![display_step("d1", json!("x"), &[], None)]);
        let token = CancellationToken::new();
        token.cancel();
        let failure = executor
            .execute(&plan, &mut Context::default(), &token)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, OrchestrateError::Canceled));
        assert!(failure.trace.is_empty());
    }
}
