//! Plan-driven orchestration core.
//!
//! The pipeline for one `/route` invocation:
//!
//! 1. [`controller::ControllerClient`] asks the controller model for a
//!    JSON plan and validates it (falling back to [`fallback`] when the
//!    controller misbehaves)
//! 2. [`executor::PlanExecutor`] evaluates the plan DAG over the tool
//!    registry and model router, accumulating results in a [`context::Context`]
//! 3. [`orchestrator::Orchestrator`] drives the two-phase
//!    plan → execute → re-plan → execute protocol and assembles the
//!    delivered artifacts

pub mod context;
pub mod controller;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod json_extract;
pub mod orchestrator;

pub use context::Context;
pub use controller::{ControllerClient, Phase};
pub use error::OrchestrateError;
pub use executor::{ExecutionFailure, PlanExecutor};
pub use orchestrator::{Orchestrator, RouteFailure};
