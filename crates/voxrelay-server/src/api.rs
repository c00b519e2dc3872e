// /src/api.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use llm_traits::{LlmClient, SpeechClient};
use relay_core::Orchestrator;
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::server_config::ServerConfig;

pub struct JsonUtf<T>(pub T);

impl<T: Serialize> IntoResponse for JsonUtf<T> {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self.0) {
            Ok(v) => v,
            Err(e) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        };
        let mut resp = body.into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        resp
    }
}

pub struct AppState<L, S> {
    pub orchestrator: Arc<Orchestrator<L, S>>,
    pub cfg: Arc<ServerConfig>,
}

// Clone only the Arcs; no bounds on L or S.
impl<L, S> Clone for AppState<L, S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            cfg: Arc::clone(&self.cfg),
        }
    }
}

pub fn router<L, S>(state: AppState<L, S>) -> Router
where
    L: LlmClient + 'static,
    S: SpeechClient + 'static,
{
    let cors_origin = state.cfg.http.cors_origin.clone();

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/health/config", get(health_config::<L, S>))
        // every verb reaches the handler so non-POST gets the JSON 405 body
        .route("/api/chat", any(chat::<L, S>))
        .with_state(state);

    if let Some(origin) = cors_origin {
        let allow = if origin == "*" {
            AllowOrigin::any()
        } else {
            match HeaderValue::from_str(&origin) {
                Ok(v) => AllowOrigin::exact(v),
                Err(_) => {
                    tracing::warn!("CORS_ALLOW_ORIGIN `{}` is not a valid header value", origin);
                    AllowOrigin::list(Vec::<HeaderValue>::new())
                }
            }
        };
        app = app.layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(allow)
                .allow_headers(Any),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        ))
}

/// `/api/chat`: conversation in, `{role, content, audio}` out.
pub async fn chat<L, S>(
    State(st): State<AppState<L, S>>,
    method: Method,
    body: Bytes,
) -> impl IntoResponse
where
    L: LlmClient + 'static,
    S: SpeechClient + 'static,
{
    let credential = st.cfg.credential();
    let out = st
        .orchestrator
        .handle(method.as_str(), &body, credential.as_ref())
        .await;
    let status = StatusCode::from_u16(out.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, JsonUtf(out.body))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn health_config<L, S>(State(st): State<AppState<L, S>>) -> JsonUtf<serde_json::Value>
where
    L: LlmClient + 'static,
    S: SpeechClient + 'static,
{
    let settings = st.orchestrator.settings();
    JsonUtf(json!({
        "config": st.cfg.reveal_masked(),
        "relay": {
            "chat_model": settings.chat_model,
            "speech_model": settings.speech_model,
            "temperature": relay_core::orchestrator::TEMPERATURE,
            "max_tokens": relay_core::orchestrator::MAX_TOKENS,
            "voice": relay_core::orchestrator::VOICE,
        }
    }))
}
