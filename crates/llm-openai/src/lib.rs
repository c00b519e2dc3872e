mod client;

pub use client::{OpenAiClient, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_SPEECH_MODEL};
