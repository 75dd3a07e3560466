//! Plan schema: strict decode + structural validation of controller output.
//!
//! The controller model returns untrusted JSON. [`Plan::from_value`] is the
//! only way to turn that JSON into a [`Plan`], and it is a total function:
//! it either yields a fully-validated plan or a [`SchemaError`] naming the
//! first violation. There is no partial acceptance and no best-effort mode.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// The only plan format version this executor understands.
pub const PLAN_VERSION: &str = "1.0";

/// Worker model route names. Closed set, enforced at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteName {
    #[serde(rename = "7b")]
    SevenB,
    #[serde(rename = "20b")]
    TwentyB,
    #[serde(rename = "70b")]
    SeventyB,
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteName::SevenB => "7b",
            RouteName::TwentyB => "20b",
            RouteName::SeventyB => "70b",
        };
        f.write_str(s)
    }
}

/// What a model step is being asked to do. Closed set.
///
/// The model router turns this into a short system directive; the value
/// never reaches the worker endpoint verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Chat,
    Code,
    Reason,
    Summarize,
    Plan,
    Main,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Purpose::Chat => "chat",
            Purpose::Code => "code",
            Purpose::Reason => "reason",
            Purpose::Summarize => "summarize",
            Purpose::Plan => "plan",
            Purpose::Main => "main",
        };
        f.write_str(s)
    }
}

/// Names of the tools in the closed registry.
///
/// An unknown tool name is a decode error, so a validated plan can only
/// ever reference tools the process was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolName {
    #[serde(rename = "tts.speak")]
    TtsSpeak,
    #[serde(rename = "stt.transcribe")]
    SttTranscribe,
    #[serde(rename = "render.display")]
    RenderDisplay,
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolName::TtsSpeak => "tts.speak",
            ToolName::SttTranscribe => "stt.transcribe",
            ToolName::RenderDisplay => "render.display",
        };
        f.write_str(s)
    }
}

/// Routing descriptor for a model step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetModel {
    /// Which worker endpoint to call.
    pub name: RouteName,
    /// What to ask it to do.
    pub purpose: Purpose,
}

/// Tool invocation descriptor for a tool step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Registry name of the tool.
    pub tool: ToolName,
    /// Arguments, interpolated by the executor before dispatch.
    #[serde(default)]
    pub args: serde_json::Map<String, Value>,
}

/// Discriminant for the two step payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Tool,
    Model,
}

/// A single node of the plan DAG.
///
/// Exactly one of `call` / `route` must be present, matching `kind`;
/// [`Plan::validate`] enforces the exclusivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique id within the plan.
    pub id: String,
    /// Whether this step invokes a tool or a worker model.
    pub kind: StepKind,
    /// Model routing descriptor (model steps only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<TargetModel>,
    /// Tool invocation descriptor (tool steps only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<ToolCall>,
    /// Step ids that must complete before this one runs.
    #[serde(default)]
    pub wait_for: Vec<String>,
    /// Context name the result is bound under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<String>,
}

/// Delivery criteria: which context names form the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Advisory success expressions. Stored, surfaced, never evaluated.
    #[serde(default)]
    pub success_when: Vec<String>,
    /// Context names extracted into the final artifact bundle.
    #[serde(default)]
    pub deliver: Vec<String>,
}

/// A validated execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Format version; must equal [`PLAN_VERSION`].
    #[serde(default = "default_version")]
    pub version: String,
    /// Reserved for forward compatibility. Round-trips, no semantics.
    #[serde(default)]
    pub route_parts: HashMap<String, String>,
    /// Steps, in declaration order.
    pub steps: Vec<Step>,
    /// Delivery criteria.
    pub criteria: Criteria,
}

fn default_version() -> String {
    PLAN_VERSION.to_string()
}

impl Plan {
    /// Decode and validate untrusted JSON into a plan.
    ///
    /// Decode-level failures (unknown top-level keys, unknown tool or route
    /// names, wrong value shapes) report at path `"$"` with the decoder's
    /// message; structural failures name the offending location.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let plan: Plan = serde_json::from_value(value)
            .map_err(|e| SchemaError::new("$", e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Structural validation pass. See the crate docs for the invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.version != PLAN_VERSION {
            return Err(SchemaError::new(
                "version",
                format!("unsupported version {:?}, expected {:?}", self.version, PLAN_VERSION),
            ));
        }

        let mut ids = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if !ids.insert(step.id.as_str()) {
                return Err(SchemaError::new(
                    format!("steps[{i}].id"),
                    format!("duplicate step id {:?}", step.id),
                ));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            match step.kind {
                StepKind::Tool => {
                    if step.call.is_none() {
                        return Err(SchemaError::new(
                            format!("steps[{i}]"),
                            "kind is \"tool\" but \"call\" is absent",
                        ));
                    }
                    if step.route.is_some() {
                        return Err(SchemaError::new(
                            format!("steps[{i}]"),
                            "kind is \"tool\" but \"route\" is present",
                        ));
                    }
                }
                StepKind::Model => {
                    if step.route.is_none() {
                        return Err(SchemaError::new(
                            format!("steps[{i}]"),
                            "kind is \"model\" but \"route\" is absent",
                        ));
                    }
                    if step.call.is_some() {
                        return Err(SchemaError::new(
                            format!("steps[{i}]"),
                            "kind is \"model\" but \"call\" is present",
                        ));
                    }
                }
            }
        }

        let mut emits = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(emit) = &step.emit {
                if !emits.insert(emit.as_str()) {
                    return Err(SchemaError::new(
                        format!("steps[{i}].emit"),
                        format!("emit name {:?} is bound by more than one step", emit),
                    ));
                }
            }
        }

        self.check_acyclic()
    }

    /// Single topological pass over the `wait_for` edges.
    ///
    /// Only cycles are a schema violation. A `wait_for` id that names no
    /// step at all passes validation and fails at execution time as a
    /// missing dependency, matching the executor's contract.
    fn check_acyclic(&self) -> Result<(), SchemaError> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for step in &self.steps {
            graph.add_node(step.id.as_str());
        }
        for step in &self.steps {
            for dep in &step.wait_for {
                if dep == &step.id {
                    return Err(SchemaError::new(
                        "steps",
                        format!("wait_for cycle involving step {:?}", step.id),
                    ));
                }
                graph.add_edge(dep.as_str(), step.id.as_str(), ());
            }
        }
        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(SchemaError::new(
                "steps",
                format!("wait_for cycle involving step {:?}", cycle.node_id()),
            )),
        }
    }
}
