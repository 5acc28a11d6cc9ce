//! Error types for email triage.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Shown to API callers inside the fallback reason.
    #[error("{var} não encontrada ({searched})")]
    MissingCredential { var: String, searched: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Errors turning an upload or form field into email text.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Formato inválido. Envie .txt ou .pdf.")]
    UnsupportedFormat { filename: String },

    #[error("Envie um texto ou arquivo.")]
    EmptyInput,

    #[error("Falha ao ler o PDF: {0}")]
    Pdf(String),

    #[error("Requisição multipart inválida: {0}")]
    Multipart(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
