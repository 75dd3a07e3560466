//! Core types for the EyeOfTerror orchestrator.
//!
//! This crate defines the data model shared by every other crate in the
//! workspace:
//!
//! - [`Plan`] and its parts ([`Step`], [`TargetModel`], [`ToolCall`],
//!   [`Criteria`]) -- the typed representation of a controller-emitted
//!   execution plan, with strict decoding and structural validation
//! - [`InboundMessage`] / [`OrchestratorResult`] -- the `/route` wire types
//! - [`EyeConfig`] -- environment-driven process configuration
//! - [`SchemaError`] -- the validation error carried back to callers
//!
//! The plan schema is the single trust boundary between untrusted controller
//! output and the executor: a value that passes [`Plan::from_value`] cannot
//! become structurally invalid afterwards.

pub mod config;
pub mod error;
pub mod message;
pub mod plan;

pub use config::{ControllerConfig, EyeConfig, RouteEndpoint, SttConfig, TtsConfig};
pub use error::SchemaError;
pub use message::{ErrorInfo, InboundMessage, OrchestratorResult};
pub use plan::{
    Criteria, Plan, Purpose, RouteName, Step, StepKind, TargetModel, ToolCall, ToolName,
    PLAN_VERSION,
};
