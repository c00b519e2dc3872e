// file: src/server_config.rs
use llm_traits::UpstreamCredential;
use sha2::{Digest, Sha256};

type AnyResult<T> = anyhow::Result<T>;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub llm: LlmSection,
    pub http: HttpSection,
}

#[derive(Clone, Debug)]
pub struct LlmSection {
    pub base_url: String,        // OpenAI-compatible API root
    pub api_key: Option<String>, // normalized; absence is reported per request
    pub chat_model: String,
    pub speech_model: String,
}

#[derive(serde::Serialize, Clone, Debug)]
pub struct HttpSection {
    pub bind_addr: String,
    pub bind_port: u16,
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    pub fn load_dotenvs() -> anyhow::Result<()> {
        use std::path::Path;

        fn load_one(path: &Path) -> anyhow::Result<()> {
            match dotenvy::from_filename(path) {
                Ok(_) => {
                    let absolute_path = std::fs::canonicalize(path)?;
                    tracing::info!(
                        "loaded .env from {}: {}",
                        path.display(),
                        absolute_path.display()
                    );
                    Ok(())
                }
                Err(dotenvy::Error::Io(_)) => {
                    tracing::warn!("no .env at {}", path.display());
                    Ok(())
                }
                Err(e) => {
                    // present but unreadable: refuse to start
                    tracing::error!("malformed .env at {}: {}", path.display(), e);
                    Err(anyhow::anyhow!("Malformed .env file: {}", path.display()))
                }
            }
        }

        load_one(Path::new(".env"))
    }

    pub fn from_env() -> AnyResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AnyResult<Self> {
        // --- LLM ---
        let api_key = get("OPENAI_API_KEY")
            .map(|s| normalize_secret(&s))
            .filter(|s| !s.is_empty());
        match &api_key {
            Some(k) => check_api_key(k),
            None => tracing::warn!(
                "ENV `OPENAI_API_KEY` not set; /api/chat will answer with a configuration error"
            ),
        }

        let llm = LlmSection {
            base_url: get_or_warn(&get, "OPENAI_BASE_URL", llm_openai::DEFAULT_BASE_URL),
            api_key,
            chat_model: get_or_warn(&get, "CHAT_MODEL", llm_openai::DEFAULT_CHAT_MODEL),
            speech_model: get_or_warn(&get, "TTS_MODEL", llm_openai::DEFAULT_SPEECH_MODEL),
        };

        // --- HTTP ---
        let http = HttpSection {
            bind_addr: get_or_warn(&get, "BIND_ADDR", "127.0.0.1"),
            bind_port: get_num_or_warn(&get, "BIND_PORT", 8090),
            cors_origin: get("CORS_ALLOW_ORIGIN")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        Ok(Self { llm, http })
    }

    /// Read on every request; never cached elsewhere.
    pub fn credential(&self) -> Option<UpstreamCredential> {
        UpstreamCredential::new(self.llm.api_key.as_deref())
    }

    pub fn log_summary(&self) {
        if let Some(k) = &self.llm.api_key {
            tracing::info!("LLM api_key: len={}, sha256[:8]={}", k.len(), sha256_8(k));
        } else {
            tracing::warn!("LLM api_key not set");
        }
        tracing::info!(
            "LLM base_url={} chat_model='{}' speech_model='{}'",
            self.llm.base_url,
            self.llm.chat_model,
            self.llm.speech_model
        );
        tracing::info!(
            "HTTP {}:{} cors={:?}",
            self.http.bind_addr,
            self.http.bind_port,
            self.http.cors_origin
        );
    }

    pub fn reveal_masked(&self) -> MaskedConfig {
        MaskedConfig {
            llm: MaskedLlm {
                api_key: self.llm.api_key.as_ref().map(|k| MaskedSecret {
                    len: k.len(),
                    sha256_8: sha256_8(k),
                    starts_with: k.chars().take(3).collect(),
                    ends_with: k
                        .chars()
                        .rev()
                        .take(4)
                        .collect::<String>()
                        .chars()
                        .rev()
                        .collect(),
                }),
                base_url: self.llm.base_url.clone(),
                chat_model: self.llm.chat_model.clone(),
                speech_model: self.llm.speech_model.clone(),
            },
            http: self.http.clone(),
        }
    }
}

// ===== helpers =====
fn normalize_secret(s: &str) -> String {
    let mut t = s.trim().trim_matches('\u{feff}').to_string();
    if t.len() >= 2
        && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\'')))
    {
        t = t[1..t.len() - 1].to_string();
    }
    t.trim().to_string()
}

fn check_api_key(k: &str) {
    if k.len() < 20 {
        tracing::warn!("LLM api_key looks too short ({} chars)", k.len());
    }
    if k.chars().any(char::is_whitespace) {
        tracing::warn!("LLM api_key contains whitespace");
    }
}

fn sha256_8(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    let d = h.finalize();
    hex::encode(&d[..4])
}

// ===== masked view for /health/config =====
#[derive(serde::Serialize, Clone, Debug)]
pub struct MaskedConfig {
    pub llm: MaskedLlm,
    pub http: HttpSection,
}

#[derive(serde::Serialize, Clone, Debug)]
pub struct MaskedLlm {
    pub api_key: Option<MaskedSecret>,
    pub base_url: String,
    pub chat_model: String,
    pub speech_model: String,
}

#[derive(serde::Serialize, Clone, Debug)]
pub struct MaskedSecret {
    pub len: usize,
    pub sha256_8: String,
    pub starts_with: String,
    pub ends_with: String,
}

// blank counts as unset
fn get_or_warn(get: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    match get(name).map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        Some(_) => {
            tracing::warn!("ENV `{}` is blank, using default", name);
            default.to_string()
        }
        None => {
            tracing::warn!("ENV `{}` not set, using default", name);
            default.to_string()
        }
    }
}

fn get_num_or_warn<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match get(name) {
        Some(v) => match v.trim().parse::<T>() {
            Ok(x) => x,
            Err(_) => {
                tracing::warn!("ENV `{}` invalid value `{}`, using default", name, v);
                default
            }
        },
        None => {
            tracing::warn!("ENV `{}` not set, using default", name);
            default
        }
    }
}
