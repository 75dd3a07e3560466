//! Environment-driven process configuration.
//!
//! Everything the orchestrator needs to reach its collaborators comes from
//! environment variables with fixed defaults; there is no config file and
//! no persisted state. [`EyeConfig::from_env`] is called once at startup
//! and the resulting value is threaded through the dependency bundle.

use serde::{Deserialize, Serialize};

use crate::plan::RouteName;

/// Controller (planner model) endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Base URL of the controller's OpenAI-compatible endpoint.
    pub base: String,
    /// Model id sent in controller requests.
    pub model: String,
    /// When false, planning always uses the deterministic fallback.
    pub enabled: bool,
    /// Recover from controller failures with the fallback planner in
    /// phase A (initial planning).
    pub fallback_plan: bool,
    /// Same, for phase B (postprocess planning).
    pub fallback_post: bool,
}

/// One worker model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEndpoint {
    /// Route name plans refer to.
    pub name: RouteName,
    /// Base URL of the worker's OpenAI-compatible endpoint.
    pub base: String,
    /// Model id sent in requests to this worker.
    pub model: String,
}

/// Audio pipeline (TTS) endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Base URL of the audio pipeline service.
    pub base: String,
    /// Speaker used when a plan does not name one.
    pub default_speaker: String,
}

/// Speech-to-text endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Base URL of the STT service.
    pub base: String,
}

/// Full orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EyeConfig {
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    pub controller: ControllerConfig,
    /// Worker model route table. Routes the schema admits but this table
    /// omits fail with an unknown-route error at dispatch.
    pub routes: Vec<RouteEndpoint>,
    pub tts: TtsConfig,
    pub stt: SttConfig,
    /// Per-call timeout for controller, model, and short tool traffic.
    pub call_timeout_secs: u64,
    /// Overall `/route` deadline. `None` means no deadline.
    pub request_timeout_secs: Option<u64>,
}

impl EyeConfig {
    /// Load configuration from the environment, with fixed defaults.
    pub fn from_env() -> Self {
        let m7b = env_str("MODEL_7B_BASE", "http://127.0.0.1:8021");
        let m20b = env_str("MODEL_20B_BASE", "http://127.0.0.1:8020");

        Self {
            host: env_str("EYE_HOST", "0.0.0.0"),
            port: env_parse("EYE_PORT", 1488),
            controller: ControllerConfig {
                base: m7b.clone(),
                model: env_str("VLLM_MODEL", "7b"),
                enabled: env_bool("EYE_CTRL_ENABLED", true),
                fallback_plan: env_bool("EYE_FALLBACK_PLAN", true),
                fallback_post: env_bool("EYE_FALLBACK_POST", true),
            },
            routes: vec![
                RouteEndpoint {
                    name: RouteName::SevenB,
                    base: m7b,
                    model: env_str("VLLM_MODEL", "7b"),
                },
                RouteEndpoint {
                    name: RouteName::TwentyB,
                    base: m20b,
                    model: "20b".to_string(),
                },
            ],
            tts: TtsConfig {
                base: env_str("WARPWAILS_URL", "http://127.0.0.1:8009"),
                default_speaker: env_str("TTS_DEFAULT_SPK", "kseniya"),
            },
            stt: SttConfig {
                base: env_str("STT_BASE", "http://127.0.0.1:8022"),
            },
            call_timeout_secs: env_parse("EYE_CALL_TIMEOUT", 45),
            request_timeout_secs: std::env::var("EYE_REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// `host:port` string for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
