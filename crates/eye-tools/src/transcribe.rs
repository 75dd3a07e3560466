//! `stt.transcribe` -- speech-to-text through the external STT service.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use eye_http::{HttpPool, TimeoutClass};
use eye_types::{SttConfig, ToolName};

use crate::registry::{Tool, ToolError};

pub struct SttTranscribeTool {
    pool: HttpPool,
    base: String,
    call_timeout: Duration,
}

impl SttTranscribeTool {
    pub fn new(pool: HttpPool, config: &SttConfig, call_timeout: Duration) -> Self {
        Self {
            pool,
            base: config.base.trim_end_matches('/').to_string(),
            call_timeout,
        }
    }
}

#[async_trait]
impl Tool for SttTranscribeTool {
    fn name(&self) -> ToolName {
        ToolName::SttTranscribe
    }

    async fn execute(
        &self,
        args: &serde_json::Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        let audio_b64 = args
            .get("audio_b64")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ToolError::invalid_args(self.name(), "missing 'audio_b64'"))?;

        let url = format!("{}/transcribe", self.base);
        debug!(%url, audio_len = audio_b64.len(), "stt transcription");
        let (_, body) = self
            .pool
            .post_json(
                &url,
                &json!({ "audio_b64": audio_b64 }),
                TimeoutClass::Call(self.call_timeout),
                cancel,
            )
            .await?;

        let parsed: Value = serde_json::from_slice(&body).map_err(|e| ToolError::InvalidResponse {
            tool: self.name(),
            reason: e.to_string(),
        })?;
        let text = parsed
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidResponse {
                tool: self.name(),
                reason: "no 'text' field".to_string(),
            })?;

        Ok(json!({ "text": text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(base: &str) -> SttTranscribeTool {
        SttTranscribeTool::new(
            HttpPool::new(),
            &SttConfig {
                base: base.to_string(),
            },
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn missing_audio_fails() {
        let tool = tool("http://127.0.0.1:9");
        let err = tool
            .execute(&serde_json::Map::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "stt.transcribe: missing 'audio_b64'");
    }

    #[tokio::test]
    async fn transcribes_and_reemits_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .and(body_json(json!({"audio_b64": "QUJD"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "привет"})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = tool(&server.uri());
        let mut args = serde_json::Map::new();
        args.insert("audio_b64".into(), json!("QUJD"));
        let result = tool.execute(&args, &CancellationToken::new()).await.unwrap();
        assert_eq!(result, json!({"text": "привет"}));
    }

    #[tokio::test]
    async fn body_without_text_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lang": "ru"})))
            .mount(&server)
            .await;

        let tool = tool(&server.uri());
        let mut args = serde_json::Map::new();
        args.insert("audio_b64".into(), json!("QUJD"));
        let err = tool.execute(&args, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidResponse { .. }));
    }
}
