//! Orchestration error taxonomy.
//!
//! [`OrchestrateError`] aggregates the per-crate errors into the kinds the
//! HTTP surface reports. Kinds split into two classes: client errors (the
//! request or the plan referenced something invalid) and infrastructure
//! errors (a downstream dependency failed); [`OrchestrateError::is_client_error`]
//! drives the status mapping.

use thiserror::Error;

use eye_http::HttpError;
use eye_llm::ModelError;
use eye_tools::ToolError;
use eye_types::{RouteName, SchemaError, ToolName};

/// Everything that can go wrong while routing one inbound message.
#[derive(Debug, Error)]
pub enum OrchestrateError {
    /// The inbound message carried neither text nor audio.
    #[error("inbound message has neither text nor audio")]
    InvalidInput,

    /// Controller output failed strict decoding or validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A plan step referenced a tool the registry does not hold.
    #[error("unknown tool: {0}")]
    UnknownTool(ToolName),

    /// A plan step referenced a route with no configured endpoint.
    #[error("unknown route: {0}")]
    UnknownRoute(RouteName),

    /// A step's payload did not match its kind.
    #[error("bad step {0}")]
    BadStep(String),

    /// A step ran before one of its `wait_for` predecessors.
    #[error("dependency {dep:?} missing for step {step:?}")]
    DependencyMissing { step: String, dep: String },

    /// Two steps bound the same emit name within one execution.
    #[error("emit {name:?} already bound in this execution")]
    EmitConflict { name: String },

    /// A tool handler rejected its arguments or its backend's response.
    #[error(transparent)]
    Tool(ToolError),

    /// Network-level failure reaching a dependency.
    #[error("transport error: {0}")]
    Transport(String),

    /// A dependency call exceeded its deadline.
    #[error("timeout")]
    Timeout,

    /// A dependency answered with a non-2xx status.
    #[error("http status {code} from dependency: {body}")]
    Status { code: u16, body: String },

    /// The request was canceled.
    #[error("canceled")]
    Canceled,
}

impl OrchestrateError {
    /// Stable snake_case kind for the wire error body.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrateError::InvalidInput => "invalid_input",
            OrchestrateError::Schema(_) => "schema_error",
            OrchestrateError::UnknownTool(_) => "unknown_tool",
            OrchestrateError::UnknownRoute(_) => "unknown_route",
            OrchestrateError::BadStep(_) => "bad_step",
            OrchestrateError::DependencyMissing { .. } => "dependency_missing",
            OrchestrateError::EmitConflict { .. } => "emit_conflict",
            OrchestrateError::Tool(_) => "tool_error",
            OrchestrateError::Transport(_) => "transport",
            OrchestrateError::Timeout => "timeout",
            OrchestrateError::Status { .. } => "http_status",
            OrchestrateError::Canceled => "canceled",
        }
    }

    /// True for kinds the caller is responsible for (4xx class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrchestrateError::InvalidInput
                | OrchestrateError::Schema(_)
                | OrchestrateError::UnknownTool(_)
                | OrchestrateError::UnknownRoute(_)
                | OrchestrateError::BadStep(_)
                | OrchestrateError::DependencyMissing { .. }
                | OrchestrateError::EmitConflict { .. }
                | OrchestrateError::Tool(_)
        )
    }
}

impl From<HttpError> for OrchestrateError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Transport(msg) => OrchestrateError::Transport(msg),
            HttpError::Timeout => OrchestrateError::Timeout,
            HttpError::Status { code, body } => OrchestrateError::Status { code, body },
            HttpError::Canceled => OrchestrateError::Canceled,
        }
    }
}

impl From<ModelError> for OrchestrateError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownRoute(name) => OrchestrateError::UnknownRoute(name),
            ModelError::Http(http) => http.into(),
            ModelError::InvalidResponse(msg) => {
                OrchestrateError::Transport(format!("invalid model response: {msg}"))
            }
            ModelError::Json(e) => OrchestrateError::Transport(e.to_string()),
        }
    }
}

impl From<ToolError> for OrchestrateError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Http(http) => http.into(),
            other => OrchestrateError::Tool(other),
        }
    }
}
