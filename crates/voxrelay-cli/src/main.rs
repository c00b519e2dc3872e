use std::path::Path;

use clap::Parser;
use llm_openai::OpenAiClient;
use llm_traits::{ChatMessage, UpstreamCredential};
use relay_core::{audio, error::MISSING_KEY, Orchestrator, RelaySettings};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "voxrelay")]
#[command(about = "One chat turn through the relay: reply text on stdout, speech to a file")]
struct Args {
    /// user message to send
    #[arg(long)]
    message: String,

    /// optional system prompt placed before the message
    #[arg(long)]
    system: Option<String>,

    /// where to write the synthesized audio
    #[arg(long, default_value = "reply.mp3")]
    out: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = llm_openai::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "CHAT_MODEL", default_value = llm_openai::DEFAULT_CHAT_MODEL)]
    chat_model: String,

    #[arg(long, env = "TTS_MODEL", default_value = llm_openai::DEFAULT_SPEECH_MODEL)]
    tts_model: String,

    /// log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn conversation(system: Option<&str>, message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(s) = system.filter(|s| !s.trim().is_empty()) {
        messages.push(ChatMessage::new("system", s));
    }
    messages.push(ChatMessage::new("user", message));
    messages
}

/// `Ok(false)` when there is no file to load; a file that exists but does
/// not parse is an error.
fn load_dotenv(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(true),
        Err(dotenvy::Error::Io(_)) => Ok(false),
        Err(e) => Err(anyhow::anyhow!(
            "Malformed .env file: {}: {}",
            path.display(),
            e
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // before arg parsing: clap reads env defaults
    let dotenv = Path::new(".env");
    let loaded = load_dotenv(dotenv)?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log_level.clone()))
        .with_target(false)
        .compact()
        .init();
    if loaded {
        tracing::info!("loaded .env from {}", dotenv.display());
    } else {
        tracing::warn!("no .env at {}", dotenv.display());
    }

    let key = std::env::var("OPENAI_API_KEY").ok();
    let credential =
        UpstreamCredential::new(key.as_deref()).ok_or_else(|| anyhow::anyhow!(MISSING_KEY))?;

    let client = OpenAiClient::new(args.base_url.clone());
    let orchestrator = Orchestrator::new(
        client.clone(),
        client,
        RelaySettings {
            chat_model: args.chat_model.clone(),
            speech_model: args.tts_model.clone(),
        },
    );

    let reply = orchestrator
        .reply(conversation(args.system.as_deref(), &args.message), &credential)
        .await?;

    let bytes = audio::from_data_uri(&reply.audio)
        .ok_or_else(|| anyhow::anyhow!("reply audio is not an audio/mp3 data URI"))?;
    tokio::fs::write(&args.out, &bytes).await?;

    println!("{}", reply.content);
    tracing::info!("wrote {} audio bytes to {}", bytes.len(), args.out);
    Ok(())
}
