//! Tool implementations for the EyeOfTerror orchestrator.
//!
//! The tool set is closed and known at build time:
//!
//! - **`tts.speak`** ([`speak`]): synthesize text via the audio pipeline,
//!   returning the drained WAV as base64
//! - **`stt.transcribe`** ([`transcribe`]): speech-to-text via the external
//!   STT service
//! - **`render.display`** ([`display`]): no-op artifact fixation
//!
//! Handlers receive pre-interpolated arguments from the executor and
//! return typed errors only.

pub mod display;
pub mod registry;
pub mod speak;
pub mod transcribe;

use std::sync::Arc;
use std::time::Duration;

use eye_http::HttpPool;
use eye_types::EyeConfig;

pub use display::RenderDisplayTool;
pub use registry::{Tool, ToolError, ToolRegistry};
pub use speak::TtsSpeakTool;
pub use transcribe::SttTranscribeTool;

/// Register every built-in tool with the given registry.
pub fn register_all(registry: &mut ToolRegistry, pool: HttpPool, config: &EyeConfig) {
    let call_timeout = Duration::from_secs(config.call_timeout_secs);
    registry.register(Arc::new(TtsSpeakTool::new(pool.clone(), &config.tts)));
    registry.register(Arc::new(SttTranscribeTool::new(
        pool,
        &config.stt,
        call_timeout,
    )));
    registry.register(Arc::new(RenderDisplayTool));
}

#[cfg(test)]
mod tests {
    use super::*;
    use eye_types::ToolName;

    #[test]
    fn register_all_covers_the_closed_set() {
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, HttpPool::new(), &EyeConfig::from_env());
        assert_eq!(registry.len(), 3);
        for name in [
            ToolName::TtsSpeak,
            ToolName::SttTranscribe,
            ToolName::RenderDisplay,
        ] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
    }
}
