use llm_traits::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::RelayError;

/// Inbound body: the caller's conversation, oldest turn first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Checks the envelope only. Individual entries are not inspected.
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        let v: Value = serde_json::from_slice(body).map_err(|e| {
            RelayError::InvalidRequest(format!("Request body must be a JSON object: {e}"))
        })?;
        let messages = v
            .get("messages")
            .ok_or_else(|| RelayError::InvalidRequest("Missing `messages` in request body".into()))?
            .as_array()
            .ok_or_else(|| RelayError::InvalidRequest("`messages` must be an array".into()))?;
        if messages.is_empty() {
            return Err(RelayError::InvalidRequest(
                "`messages` must not be empty".into(),
            ));
        }
        Ok(Self {
            messages: messages.iter().cloned().map(ChatMessage::from).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub role: String,
    pub content: String,
    /// `data:audio/mp3;base64,...`
    pub audio: String,
}

impl ChatReply {
    pub fn assistant(content: String, audio: String) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            audio,
        }
    }
}

/// Model names for the two provider calls. Sampling parameters and the
/// voice are fixed in [`crate::orchestrator`].
#[derive(Debug, Clone, Serialize)]
pub struct RelaySettings {
    pub chat_model: String,
    pub speech_model: String,
}

/// Status code plus JSON body, ready for whatever HTTP layer sits in front.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

impl RelayResponse {
    pub fn ok(reply: &ChatReply) -> Self {
        Self {
            status: 200,
            body: json!({
                "role": reply.role,
                "content": reply.content,
                "audio": reply.audio,
            }),
        }
    }
}

impl From<&RelayError> for RelayResponse {
    fn from(e: &RelayError) -> Self {
        Self {
            status: e.status(),
            body: e.to_body(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_message_order_and_shape() {
        let body = br#"{"messages":[{"role":"system","content":"a"},{"role":"user","content":"b","name":"x"}]}"#;
        let req = ChatRequest::from_body(body).unwrap();
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role(), Some("system"));
        assert_eq!(
            req.messages[1].as_value(),
            &json!({"role": "user", "content": "b", "name": "x"})
        );
    }

    #[test]
    fn malformed_entries_pass_through() {
        let req = ChatRequest::from_body(br#"{"messages":[{"who":"me"}, 3]}"#).unwrap();
        assert_eq!(req.messages.len(), 2);
    }

    #[test]
    fn envelope_errors_are_invalid_request() {
        let bodies: [&[u8]; 6] = [
            b"not json",
            br#"{"msgs":[]}"#,
            br#"{"messages":"hi"}"#,
            br#"{"messages":[]}"#,
            br#"[1,2]"#,
            b"",
        ];
        for body in bodies {
            let err = ChatRequest::from_body(body).unwrap_err();
            assert!(matches!(err, RelayError::InvalidRequest(_)), "{body:?}");
            assert_eq!(err.status(), 400);
        }
    }
}
