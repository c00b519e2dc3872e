use llm_traits::{
    ChatMessage, ChatRequest as CompletionRequest, LlmClient, ProviderError, SpeechClient,
    SpeechRequest, UpstreamCredential,
};
use tracing::{debug, error, info, warn};

use crate::{
    audio,
    error::{RelayError, AUDIO_FAILURE},
    types::{ChatReply, ChatRequest, RelayResponse, RelaySettings},
};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 512;
pub const VOICE: &str = "nova";

/// Text reply first, then speech for that reply. Both calls use the same
/// credential and run strictly one after the other.
pub struct Orchestrator<L, S> {
    llm: L,
    speech: S,
    settings: RelaySettings,
}

impl<L: LlmClient, S: SpeechClient> Orchestrator<L, S> {
    pub fn new(llm: L, speech: S, settings: RelaySettings) -> Self {
        Self {
            llm,
            speech,
            settings,
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Full request cycle. Never fails: every error becomes a status code and
    /// an `{ "error": ... }` body, and a success always carries both text and
    /// audio.
    pub async fn handle(
        &self,
        method: &str,
        body: &[u8],
        credential: Option<&UpstreamCredential>,
    ) -> RelayResponse {
        match self.try_handle(method, body, credential).await {
            Ok(reply) => RelayResponse::ok(&reply),
            Err(e) => {
                if e.is_rejection() {
                    warn!("chat request rejected ({}): {}", e.status(), e);
                } else {
                    error!("chat request failed: {}", e);
                }
                RelayResponse::from(&e)
            }
        }
    }

    async fn try_handle(
        &self,
        method: &str,
        body: &[u8],
        credential: Option<&UpstreamCredential>,
    ) -> Result<ChatReply, RelayError> {
        if method != "POST" {
            return Err(RelayError::MethodNotAllowed);
        }
        let credential = credential.ok_or(RelayError::Configuration)?;
        let req = ChatRequest::from_body(body)?;
        self.reply(req.messages, credential).await
    }

    /// Completion then synthesis, without the HTTP envelope.
    pub async fn reply(
        &self,
        messages: Vec<ChatMessage>,
        credential: &UpstreamCredential,
    ) -> Result<ChatReply, RelayError> {
        let text = self.complete(messages, credential).await?;
        let audio = self.synthesize(&text, credential).await?;
        info!(
            "reply ready: {} chars, {} audio bytes",
            text.chars().count(),
            audio.len()
        );
        Ok(ChatReply::assistant(text, audio::to_data_uri(&audio)))
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        credential: &UpstreamCredential,
    ) -> Result<String, RelayError> {
        info!(
            "LLM call → {} ({} messages)",
            self.settings.chat_model,
            messages.len()
        );
        let req = CompletionRequest {
            model: self.settings.chat_model.clone(),
            messages,
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        };
        let resp = self.llm.chat(credential, req).await?;

        if let Some(msg) = resp.error_message() {
            return Err(RelayError::upstream(msg));
        }

        let text = resp
            .first_content()
            .ok_or_else(|| {
                warn!("completion body has no choices[0].message.content");
                RelayError::upstream(None)
            })?
            .trim()
            .to_string();
        debug!("completion text: {} chars", text.chars().count());
        Ok(text)
    }

    async fn synthesize(
        &self,
        text: &str,
        credential: &UpstreamCredential,
    ) -> Result<Vec<u8>, RelayError> {
        info!(
            "TTS call → {} voice={} ({} chars)",
            self.settings.speech_model,
            VOICE,
            text.chars().count()
        );
        let req = SpeechRequest {
            model: self.settings.speech_model.clone(),
            voice: VOICE.to_string(),
            input: text.to_string(),
        };
        match self.speech.synthesize(credential, req).await {
            Ok(bytes) => Ok(bytes),
            Err(e @ ProviderError::Transport(_)) => Err(e.into()),
            Err(e) => {
                warn!("speech synthesis failed: {}", e);
                Err(RelayError::Upstream(AUDIO_FAILURE.to_string()))
            }
        }
    }
}
