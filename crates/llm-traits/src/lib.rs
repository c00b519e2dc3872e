use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One conversation entry, kept as the caller sent it.
///
/// Entries are forwarded to the provider as-is; only the provider decides
/// whether a given `{role, content}` shape is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatMessage(Value);

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self(serde_json::json!({ "role": role.into(), "content": content.into() }))
    }

    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ChatMessage {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Completion body as the provider returned it.
///
/// Held as raw JSON and read field by field, so any JSON body decodes: a
/// `null` or mistyped field just reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatResponse(Value);

impl ChatResponse {
    /// `Some` when the provider reported an error. The inner value is the
    /// provider's message if it sent one. `null`, `false`, `""` and `0` are
    /// not errors.
    pub fn error_message(&self) -> Option<Option<String>> {
        let err = self.0.get("error")?;
        let msg = match err {
            Value::Null | Value::Bool(false) => return None,
            Value::String(s) if s.is_empty() => return None,
            Value::Number(n) if n.as_f64() == Some(0.0) => return None,
            Value::String(s) => Some(s.clone()),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        Some(msg.filter(|m| !m.trim().is_empty()))
    }

    /// Text of the first choice, if the body carries one.
    pub fn first_content(&self) -> Option<&str> {
        self.0
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ChatResponse {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
}

/// Bearer secret for the upstream provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredential(String);

impl UpstreamCredential {
    /// Blank values count as absent.
    pub fn new(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UpstreamCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpstreamCredential(len={})", self.0.len())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Transport(String),
    #[error("provider http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the decoded provider body, including bodies that only carry
    /// an error object.
    async fn chat(
        &self,
        credential: &UpstreamCredential,
        req: ChatRequest,
    ) -> Result<ChatResponse, ProviderError>;
}

#[async_trait::async_trait]
pub trait SpeechClient: Send + Sync {
    /// Raw audio bytes on success.
    async fn synthesize(
        &self,
        credential: &UpstreamCredential,
        req: SpeechRequest,
    ) -> Result<Vec<u8>, ProviderError>;
}

#[async_trait::async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn chat(
        &self,
        credential: &UpstreamCredential,
        req: ChatRequest,
    ) -> Result<ChatResponse, ProviderError> {
        (**self).chat(credential, req).await
    }
}

#[async_trait::async_trait]
impl<T: SpeechClient + ?Sized> SpeechClient for Arc<T> {
    async fn synthesize(
        &self,
        credential: &UpstreamCredential,
        req: SpeechRequest,
    ) -> Result<Vec<u8>, ProviderError> {
        (**self).synthesize(credential, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips_unknown_fields() {
        let raw = serde_json::json!({"role": "user", "content": "hi", "name": "ann"});
        let msg: ChatMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.role(), Some("user"));
        assert_eq!(msg.content(), Some("hi"));
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn error_object_message_is_extracted() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"error":{"message":"rate limited","type":"requests"}}"#)
                .unwrap();
        assert_eq!(resp.error_message(), Some(Some("rate limited".to_string())));
        assert!(resp.first_content().is_none());
    }

    #[test]
    fn null_error_is_not_an_error() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"error":null,"choices":[{"index":0,"message":{"role":"assistant","content":" ok "}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.error_message(), None);
        assert_eq!(resp.first_content(), Some(" ok "));
    }

    #[test]
    fn falsy_error_values_are_not_errors() {
        for error in [
            serde_json::json!(false),
            serde_json::json!(""),
            serde_json::json!(0),
            serde_json::json!(0.0),
        ] {
            let resp = ChatResponse::from(serde_json::json!({
                "error": error,
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            }));
            assert_eq!(resp.error_message(), None, "{error}");
            assert_eq!(resp.first_content(), Some("ok"));
        }
    }

    #[test]
    fn truthy_scalar_errors_still_count() {
        let resp = ChatResponse::from(serde_json::json!({"error": true}));
        assert_eq!(resp.error_message(), Some(None));
        let resp = ChatResponse::from(serde_json::json!({"error": "quota exceeded"}));
        assert_eq!(resp.error_message(), Some(Some("quota exceeded".to_string())));
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"error":{"message":"rate limited"},"choices":null}"#).unwrap();
        assert_eq!(resp.error_message(), Some(Some("rate limited".to_string())));
        assert!(resp.first_content().is_none());

        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":null,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.error_message(), None);
        assert_eq!(resp.first_content(), Some("hi"));

        let resp: ChatResponse = serde_json::from_str(r#"{"choices":"nope"}"#).unwrap();
        assert!(resp.first_content().is_none());
    }

    #[test]
    fn error_without_message_still_counts() {
        let resp: ChatResponse = serde_json::from_str(r#"{"error":{"code":"x"}}"#).unwrap();
        assert_eq!(resp.error_message(), Some(None));
    }

    #[test]
    fn blank_credential_is_absent() {
        assert!(UpstreamCredential::new(None).is_none());
        assert!(UpstreamCredential::new(Some("   ")).is_none());
        let c = UpstreamCredential::new(Some(" sk-abc ")).unwrap();
        assert_eq!(c.expose(), "sk-abc");
        assert!(!format!("{c:?}").contains("sk-abc"));
    }
}
