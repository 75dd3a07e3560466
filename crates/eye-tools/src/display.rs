//! `render.display` -- fix a text artifact in the context without I/O.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use eye_types::ToolName;

use crate::registry::{Tool, ToolError};

pub struct RenderDisplayTool;

#[async_trait]
impl Tool for RenderDisplayTool {
    fn name(&self) -> ToolName {
        ToolName::RenderDisplay
    }

    async fn execute(
        &self,
        args: &serde_json::Map<String, Value>,
        _cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_args(self.name(), "missing 'text'"))?;
        Ok(json!({ "ok": true, "text": text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixes_text_as_artifact() {
        let mut args = serde_json::Map::new();
        args.insert("text".into(), json!("на экран"));
        let result = RenderDisplayTool
            .execute(&args, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true, "text": "на экран"}));
    }

    #[tokio::test]
    async fn missing_text_fails() {
        let err = RenderDisplayTool
            .execute(&serde_json::Map::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "render.display: missing 'text'");
    }
}
