//! HTTP surface: `/health` and multipart `/analyze`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::TriageConfig;
use crate::error::IngestError;
use crate::ingest::{email_text_from_upload, resolve_email_text};
use crate::llm::ClientOutcome;
use crate::pipeline::{AnalysisResponse, EmailAnalyzer, EmailInput, RuleClassifier, Tone};

/// Form field with the pasted email text.
const FIELD_TEXT: &str = "texto_email";
/// Form field with the desired reply tone.
const FIELD_TONE: &str = "tom_resposta";
/// Form field with the uploaded `.txt` / `.pdf`.
const FIELD_FILE: &str = "arquivo_email";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<EmailAnalyzer>,
}

/// Build the Axum router with the triage routes.
pub fn routes(analyzer: Arc<EmailAnalyzer>, max_upload_bytes: usize) -> Router {
    let state = AppState { analyzer };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/analyze",
            post(analyze).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured port and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &TriageConfig) -> crate::error::Result<()> {
    let client = ClientOutcome::connect(config);
    info!(
        model_ready = client.is_ready(),
        model = %config.model,
        timeout_secs = config.llm_timeout.as_secs(),
        "Analyzer configured"
    );

    let analyzer = Arc::new(EmailAnalyzer::new(
        client,
        RuleClassifier::default_rules(),
        config.llm_timeout,
    ));
    let app = routes(analyzer, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "Email triage server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

// ── Errors ──────────────────────────────────────────────────────────────

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

// ── Analyze ─────────────────────────────────────────────────────────────

/// Fields collected from the multipart body.
#[derive(Default)]
struct AnalyzeForm {
    text: Option<String>,
    tone: Tone,
    file: Option<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, IngestError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IngestError::Multipart(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_TEXT => {
                form.text = Some(field.text().await.map_err(|e| IngestError::Multipart(e.body_text()))?);
            }
            FIELD_TONE => {
                let raw = field.text().await.map_err(|e| IngestError::Multipart(e.body_text()))?;
                form.tone = Tone::parse(&raw);
            }
            FIELD_FILE => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| IngestError::Multipart(e.body_text()))?;
                // Browsers send an empty, unnamed part when no file was chosen
                if !(filename.is_empty() && bytes.is_empty()) {
                    form.file = Some((filename, bytes));
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, IngestError> {
    let form = read_form(multipart).await.inspect_err(|e| warn!(error = %e, "Rejected form"))?;

    let file_text = match form.file {
        Some((filename, bytes)) => {
            let decoded =
                tokio::task::spawn_blocking(move || email_text_from_upload(&filename, &bytes))
                    .await
                    .map_err(|e| IngestError::Pdf(e.to_string()))?;
            Some(decoded.inspect_err(|e| warn!(error = %e, "Rejected upload"))?)
        }
        None => None,
    };

    let text = resolve_email_text(form.text, file_text)?;
    let response = state.analyzer.analyze(&EmailInput::new(text), form.tone).await;
    Ok(Json(response))
}
