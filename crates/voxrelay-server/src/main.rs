// /src/main.rs
mod api;
mod server_config;

use std::{net::SocketAddr, sync::Arc};

use llm_openai::OpenAiClient;
use relay_core::{Orchestrator, RelaySettings};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    api::{router, AppState},
    server_config::ServerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,axum=warn,tower_http=warn"));
    fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .init();
    info!("logger initialized");

    ServerConfig::load_dotenvs()?;
    let cfg = ServerConfig::from_env()?;
    cfg.log_summary(); // key only as len + hash
    let cfg = Arc::new(cfg);

    let client = OpenAiClient::new(cfg.llm.base_url.clone());
    let orchestrator = Orchestrator::new(
        client.clone(),
        client,
        RelaySettings {
            chat_model: cfg.llm.chat_model.clone(),
            speech_model: cfg.llm.speech_model.clone(),
        },
    );

    let app = router(AppState {
        orchestrator: Arc::new(orchestrator),
        cfg: cfg.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", cfg.http.bind_addr, cfg.http.bind_port).parse()?;
    info!("listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
