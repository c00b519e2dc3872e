use llm_traits::ProviderError;
use serde_json::{json, Value};

/// Fallback text when a failure carries no usable message.
pub const GENERIC_FAILURE: &str = "Error processing request";
pub const AUDIO_FAILURE: &str = "Error generating audio";
pub const MISSING_KEY: &str = "Missing API Key in Server Configuration";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Missing API Key in Server Configuration")]
    Configuration,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Transport(String),
}

impl RelayError {
    /// Upstream failure with the provider's message, or the generic one.
    pub fn upstream(msg: Option<String>) -> Self {
        match msg {
            Some(m) if !m.trim().is_empty() => RelayError::Upstream(m),
            _ => RelayError::Upstream(GENERIC_FAILURE.to_string()),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            RelayError::MethodNotAllowed => 405,
            RelayError::InvalidRequest(_) => 400,
            RelayError::Configuration | RelayError::Upstream(_) | RelayError::Transport(_) => 500,
        }
    }

    /// Rejections decided before any upstream work.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RelayError::MethodNotAllowed | RelayError::Configuration | RelayError::InvalidRequest(_)
        )
    }

    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<ProviderError> for RelayError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Transport(m) => RelayError::Transport(m),
            other => RelayError::upstream(Some(other.to_string())),
        }
    }
}
