//! `tts.speak` -- synthesize text through the audio pipeline service.
//!
//! Forwards to `POST {base}/speak_full` and drains the whole WAV stream
//! before returning; the result carries the audio as base64 so downstream
//! steps can interpolate `${<emit>.data_b64}`. Synthesis length is
//! unbounded, so the call uses the cancellable no-deadline class.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use eye_http::{HttpPool, TimeoutClass};
use eye_types::{ToolName, TtsConfig};

use crate::registry::{Tool, ToolError};

pub struct TtsSpeakTool {
    pool: HttpPool,
    base: String,
    default_speaker: String,
}

impl TtsSpeakTool {
    pub fn new(pool: HttpPool, config: &TtsConfig) -> Self {
        Self {
            pool,
            base: config.base.trim_end_matches('/').to_string(),
            default_speaker: config.default_speaker.clone(),
        }
    }
}

#[async_trait]
impl Tool for TtsSpeakTool {
    fn name(&self) -> ToolName {
        ToolName::TtsSpeak
    }

    async fn execute(
        &self,
        args: &serde_json::Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ToolError::invalid_args(self.name(), "missing 'text'"))?;
        let speaker = args
            .get("speaker")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_speaker)
            .to_string();

        // Extra args (emotion presets etc.) pass through to the pipeline.
        let mut payload = args.clone();
        payload.insert("text".into(), json!(text));
        payload.insert("speaker".into(), json!(speaker));

        let url = format!("{}/speak_full", self.base);
        debug!(%url, %speaker, text_len = text.len(), "tts synthesis");
        let (_, wav) = self
            .pool
            .post_json(&url, &Value::Object(payload), TimeoutClass::Unbounded, cancel)
            .await?;

        Ok(json!({
            "type": "audio/wav",
            "speaker": speaker,
            "data_b64": BASE64.encode(&wav),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(base: &str) -> TtsSpeakTool {
        TtsSpeakTool::new(
            HttpPool::new(),
            &TtsConfig {
                base: base.to_string(),
                default_speaker: "kseniya".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn missing_text_fails() {
        let tool = tool("http://127.0.0.1:9");
        let err = tool
            .execute(&serde_json::Map::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "tts.speak: missing 'text'");
    }

    #[tokio::test]
    async fn empty_text_fails() {
        let tool = tool("http://127.0.0.1:9");
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!(""));
        let err = tool.execute(&args, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs { .. }));
    }

    #[tokio::test]
    async fn non_string_text_fails() {
        let tool = tool("http://127.0.0.1:9");
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!(42));
        assert!(tool.execute(&args, &CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn drains_wav_and_returns_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speak_full"))
            .and(body_partial_json(json!({
                "text": "привет",
                "speaker": "kseniya",
                "preset": "imp_light"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"RIFFwav".to_vec(), "audio/wav"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tool = tool(&server.uri());
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!("привет"));
        args.insert("preset".into(), json!("imp_light"));
        let result = tool.execute(&args, &CancellationToken::new()).await.unwrap();
        assert_eq!(result["type"], "audio/wav");
        assert_eq!(result["speaker"], "kseniya");
        assert_eq!(result["data_b64"], BASE64.encode(b"RIFFwav"));
    }

    #[tokio::test]
    async fn explicit_speaker_wins_over_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"speaker": "aidar"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "audio/wav"))
            .expect(1)
            .mount(&server)
            .await;

        let tool = tool(&server.uri());
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!("hi"));
        args.insert("speaker".into(), json!("aidar"));
        let result = tool.execute(&args, &CancellationToken::new()).await.unwrap();
        assert_eq!(result["speaker"], "aidar");
    }

    #[tokio::test]
    async fn pipeline_error_propagates_as_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("text is required"))
            .mount(&server)
            .await;

        let tool = tool(&server.uri());
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!("hi"));
        let err = tool.execute(&args, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ToolError::Http(eye_http::HttpError::Status { code: 400, .. })
        ));
    }
}
