//! Wire types for the orchestrator's HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound user message posted to `/route`.
///
/// At least one of `text` / `audio_b64` must be present; the orchestrator
/// rejects the message as invalid input otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Free-text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded audio payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_b64: Option<String>,
    /// Free-form caller metadata, carried through untouched.
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
}

impl InboundMessage {
    /// A text-only message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An audio-only message.
    pub fn audio(audio_b64: impl Into<String>) -> Self {
        Self {
            audio_b64: Some(audio_b64.into()),
            ..Self::default()
        }
    }

    /// Whether the message carries any payload at all.
    pub fn has_payload(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
            || self.audio_b64.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Successful `/route` response: delivered artifacts plus the step trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorResult {
    pub ok: bool,
    /// One entry per `criteria.deliver` name; unbound names are `null`.
    #[serde(default)]
    pub artifacts: serde_json::Map<String, Value>,
    /// Step traces in declaration order, both phases concatenated.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Error descriptor embedded in a failed `/route` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable snake_case error kind (e.g. `"dependency_missing"`).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}
