//! Request and response types for chat completion calls.
//!
//! These mirror the OpenAI chat-completions format. Response decoding is
//! deliberately lenient: only the fields the orchestrator reads are
//! required, so stub servers and thin proxies stay compatible.

use serde::{Deserialize, Serialize};

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Constraint on the response shape, e.g. `{"type": "json_object"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format: String,
}

impl ResponseFormat {
    /// The JSON-object constraint used for controller requests.
    pub fn json_object() -> Self {
        Self {
            format: "json_object".to_string(),
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// A minimal request with a model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// A chat completion response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A single completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice, if the envelope has one.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Chat-completions endpoint for a base URL, trailing slash tolerated.
pub fn completions_url(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_helpers_set_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
    }

    #[test]
    fn request_omits_unset_fields() {
        let req = ChatRequest::new("7b", vec![ChatMessage::user("hi")]);
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("temperature").is_none());
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn request_serializes_controller_shape() {
        let req = ChatRequest::new("7b", vec![ChatMessage::user("hi")])
            .temperature(0.0)
            .max_tokens(128)
            .response_format(ResponseFormat::json_object());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["max_tokens"], 128);
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn response_content_reads_first_choice() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "id": "cmpl-1",
            "model": "7b",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "one"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "two"}}
            ]
        }))
        .unwrap();
        assert_eq!(resp.content(), Some("one"));
    }

    #[test]
    fn empty_choices_has_no_content() {
        let resp: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(resp.content().is_none());
    }

    #[test]
    fn completions_url_strips_trailing_slash() {
        assert_eq!(
            completions_url("http://127.0.0.1:8020/"),
            "http://127.0.0.1:8020/chat/completions"
        );
        assert_eq!(
            completions_url("http://127.0.0.1:8020"),
            "http://127.0.0.1:8020/chat/completions"
        );
    }
}
