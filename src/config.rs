//! Configuration types.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Secret file mounted by the hosting platform when the key is not in the environment.
pub const OPENAI_SECRET_FILE: &str = "/etc/secrets/openai_api_key";

/// Default OpenAI model when `OPENAI_MODEL` is unset.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5-nano";

/// Default Anthropic model when `ANTHROPIC_MODEL` is unset.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Which provider backs the model path.
    pub backend: LlmBackend,
    /// Credential for the selected backend (None routes every request to the rules).
    pub api_key: Option<SecretString>,
    /// Model name passed to the provider.
    pub model: String,
    /// Upper bound on a single model call.
    pub llm_timeout: Duration,
    /// HTTP listen port.
    pub port: u16,
    /// Maximum accepted request body for `/analyze`.
    pub max_upload_bytes: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            llm_timeout: Duration::from_secs(20),
            port: 8000,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl TriageConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok(), Some(Path::new(OPENAI_SECRET_FILE)))
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `secret_file` is consulted only for the OpenAI backend, and only when
    /// `OPENAI_API_KEY` is absent or blank.
    pub fn from_vars<F>(lookup: F, secret_file: Option<&Path>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("TRIAGE_LLM_BACKEND")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("openai") => LlmBackend::OpenAi,
            Some("anthropic") => LlmBackend::Anthropic,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TRIAGE_LLM_BACKEND".into(),
                    message: format!("unknown backend '{other}' (expected openai or anthropic)"),
                });
            }
        };

        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = match backend {
            LlmBackend::OpenAi => non_blank("OPENAI_API_KEY").or_else(|| {
                secret_file
                    .and_then(|path| std::fs::read_to_string(path).ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            }),
            LlmBackend::Anthropic => non_blank("ANTHROPIC_API_KEY"),
        }
        .map(SecretString::from);

        let model = match backend {
            LlmBackend::OpenAi => {
                non_blank("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
            }
            LlmBackend::Anthropic => non_blank("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
        };

        let llm_timeout = parse_or("TRIAGE_LLM_TIMEOUT_SECS", &lookup, defaults.llm_timeout.as_secs())?;
        if llm_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGE_LLM_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }

        let port = match lookup("TRIAGE_PORT") {
            Some(_) => parse_or("TRIAGE_PORT", &lookup, defaults.port)?,
            None => parse_or("PORT", &lookup, defaults.port)?,
        };

        let max_upload_bytes =
            parse_or("TRIAGE_MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?;

        Ok(Self {
            backend,
            api_key,
            model,
            llm_timeout: Duration::from_secs(llm_timeout),
            port,
            max_upload_bytes,
        })
    }

    /// Provider configuration, or the reason the model path cannot be built.
    pub fn llm_config(&self) -> Result<LlmConfig, ConfigError> {
        let api_key = self.api_key.clone().ok_or_else(|| ConfigError::MissingCredential {
            var: self.backend.credential_var().to_string(),
            searched: match self.backend {
                LlmBackend::OpenAi => format!("nem env var, nem {OPENAI_SECRET_FILE}"),
                LlmBackend::Anthropic => "nem env var".to_string(),
            },
        })?;
        Ok(LlmConfig {
            backend: self.backend,
            api_key,
            model: self.model.clone(),
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
