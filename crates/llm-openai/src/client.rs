// crates/llm-openai/src/client.rs

use llm_traits::{
    ChatRequest, ChatResponse, LlmClient, ProviderError, SpeechClient, SpeechRequest,
    UpstreamCredential,
};
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";

/// Client for an OpenAI-compatible API. Covers both chat completions and
/// speech synthesis; cheap to clone.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        credential: &UpstreamCredential,
        req: ChatRequest,
    ) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": req.model,
            "messages": req.messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        tracing::debug!(
            "POST {} model={} messages={}",
            url,
            req.model,
            req.messages.len()
        );

        let resp = self
            .http
            .post(url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("chat completion request failed: {e}")))?;

        let resp_status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            ProviderError::Transport(format!("chat completion body read failed: {e}"))
        })?;

        // Providers send error objects with non-2xx statuses; hand those back
        // so the caller sees the provider's own message. Only a body that is
        // not JSON at all is a decode failure.
        let parsed = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(v) => ChatResponse::from(v),
            Err(e) if resp_status.is_success() => {
                return Err(ProviderError::Decode(format!(
                    "chat completion response is not valid JSON: {e}"
                )));
            }
            Err(_) => {
                return Err(ProviderError::Status {
                    status: resp_status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
        };

        if resp_status.is_success() || parsed.error_message().is_some() {
            Ok(parsed)
        } else {
            Err(ProviderError::Status {
                status: resp_status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        }
    }
}

#[async_trait::async_trait]
impl SpeechClient for OpenAiClient {
    async fn synthesize(
        &self,
        credential: &UpstreamCredential,
        req: SpeechRequest,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/audio/speech", self.base_url);
        tracing::debug!(
            "POST {} model={} voice={} input_chars={}",
            url,
            req.model,
            req.voice,
            req.input.chars().count()
        );

        let resp = self
            .http
            .post(url)
            .bearer_auth(credential.expose())
            .json(&json!({
                "model": req.model,
                "voice": req.voice,
                "input": req.input,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("speech request failed: {e}")))?;

        let resp_status = resp.status();
        if !resp_status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: resp_status.as_u16(),
                body: text,
            });
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("speech body read failed: {e}")))?;
        Ok(audio.to_vec())
    }
}
