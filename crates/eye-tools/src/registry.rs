//! Tool registry and [`Tool`] trait definition.
//!
//! The registry is a static mapping from [`ToolName`] to handler,
//! populated once at startup and immutable afterwards. The plan schema
//! already restricts tool references to the closed [`ToolName`] set, so a
//! missed lookup can only mean the process was assembled without one of
//! the built-ins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use eye_http::HttpError;
use eye_types::ToolName;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments, after interpolation, are missing or invalid.
    #[error("{tool}: {reason}")]
    InvalidArgs { tool: ToolName, reason: String },

    /// The backing endpoint answered 2xx but with an unusable body.
    #[error("{tool}: invalid response: {reason}")]
    InvalidResponse { tool: ToolName, reason: String },

    /// Transport, timeout, status, or cancellation from the pool.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl ToolError {
    pub fn invalid_args(tool: ToolName, reason: impl Into<String>) -> Self {
        ToolError::InvalidArgs {
            tool,
            reason: reason.into(),
        }
    }
}

/// A named asynchronous operation invocable by plan steps.
///
/// Handlers receive their arguments pre-interpolated by the executor and
/// must return typed errors only.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry name of this tool.
    fn name(&self) -> ToolName;

    /// Execute with interpolated arguments.
    async fn execute(
        &self,
        args: &serde_json::Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError>;
}

/// Immutable-after-startup mapping from tool name to handler.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<ToolName, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Look up a handler.
    pub fn get(&self, name: ToolName) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.tools.keys().map(|n| n.to_string()).collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
