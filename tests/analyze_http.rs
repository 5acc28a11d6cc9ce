//! Integration tests for the triage HTTP surface.
//!
//! Each test builds the Axum router in-process and drives it with
//! `tower::ServiceExt::oneshot`, using hand-built multipart bodies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use email_triage::error::LlmError;
use email_triage::llm::ClientOutcome;
use email_triage::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
use email_triage::pipeline::{EmailAnalyzer, RuleClassifier};
use email_triage::server::routes;

const BOUNDARY: &str = "triage-test-boundary";
const MAX_UPLOAD: usize = 64 * 1024;

/// Stub LLM provider (no real API calls).
struct StubLlm {
    content: &'static str,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: self.content.to_string(),
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}

/// Stub that behaves like an exhausted quota.
struct QuotaExceededLlm;

#[async_trait]
impl LlmProvider for QuotaExceededLlm {
    fn model_name(&self) -> &str {
        "quota"
    }
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "quota".into(),
            reason: "429 insufficient_quota".into(),
        })
    }
}

fn rules_only_app() -> Router {
    routes(
        Arc::new(EmailAnalyzer::rules_only("OPENAI_API_KEY não encontrada")),
        MAX_UPLOAD,
    )
}

fn app_with(llm: Arc<dyn LlmProvider>) -> Router {
    let analyzer = EmailAnalyzer::new(
        ClientOutcome::Ready(llm),
        RuleClassifier::default_rules(),
        Duration::from_secs(2),
    );
    routes(Arc::new(analyzer), MAX_UPLOAD)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_analyze(app: Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn non_empty_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

// ── Health ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = rules_only_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({"status": "ok"}));
}

// ── Analyze: rules path ─────────────────────────────────────────────────

#[tokio::test]
async fn analyze_text_field() {
    let (status, json) = post_analyze(
        rules_only_app(),
        &[
            Part::Text("texto_email", "Obrigado pelo excelente atendimento!"),
            Part::Text("tom_resposta", "formal"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Improdutivo");
    assert!((json["confidence"].as_f64().unwrap() - 0.85).abs() < 1e-6);
    assert!(json["reply"].as_str().unwrap().contains("disposição"));
    assert!(json["reason"].as_str().unwrap().contains("OPENAI_API_KEY"));
    assert!(json["highlights"].is_array());
}

#[tokio::test]
async fn analyze_txt_upload() {
    let (status, json) = post_analyze(
        rules_only_app(),
        &[Part::File(
            "arquivo_email",
            "email.txt",
            "Por favor, verifiquem o status do chamado #1234.".as_bytes(),
        )],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Produtivo");
    let highlights = json["highlights"].as_array().unwrap();
    assert!(highlights.iter().any(|h| h.as_str().unwrap().contains("#1234")));
}

#[tokio::test]
async fn uploaded_file_wins_over_text_field() {
    let (status, json) = post_analyze(
        rules_only_app(),
        &[
            Part::Text("texto_email", "Preciso de acesso ao sistema?"),
            Part::File("arquivo_email", "natal.txt", "Feliz Natal a toda equipe!".as_bytes()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Improdutivo");
    assert!(json["reply"].as_str().unwrap().contains("Feliz Natal"));
}

#[tokio::test]
async fn short_tone_limits_reply() {
    let (status, json) = post_analyze(
        rules_only_app(),
        &[
            Part::Text("texto_email", "Não consigo fazer login, erro de senha."),
            Part::Text("tom_resposta", "curto"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(non_empty_lines(json["reply"].as_str().unwrap()) <= 4);
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let (status, json) = post_analyze(
        rules_only_app(),
        &[Part::File("arquivo_email", "foto.png", b"\x89PNG\r\n")],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Formato inválido. Envie .txt ou .pdf.");
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let (status, json) = post_analyze(rules_only_app(), &[Part::Text("texto_email", "   ")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Envie um texto ou arquivo.");
}

#[tokio::test]
async fn tone_without_text_is_rejected() {
    let (status, json) = post_analyze(rules_only_app(), &[Part::Text("tom_resposta", "formal")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Envie um texto ou arquivo.");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let big = vec![b'a'; MAX_UPLOAD * 2];
    let (status, _) = post_analyze(
        rules_only_app(),
        &[Part::File("arquivo_email", "grande.txt", &big)],
    )
    .await;

    assert!(status.is_client_error());
}

// ── Analyze: model path ─────────────────────────────────────────────────

#[tokio::test]
async fn model_answer_is_returned() {
    let app = app_with(Arc::new(StubLlm {
        content: r#"```json
{"category": "Produtivo", "confidence": "0.92", "reply": "Vamos verificar.", "reason": "pedido de status", "highlights": ["status do chamado"]}
```"#,
    }));
    let (status, json) = post_analyze(
        app,
        &[Part::Text("texto_email", "Qual o status do chamado 77?")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Produtivo");
    assert!((json["confidence"].as_f64().unwrap() - 0.92).abs() < 1e-6);
    assert_eq!(json["reply"], "Vamos verificar.");
    assert_eq!(json["reason"], "pedido de status");
    assert_eq!(json["highlights"], serde_json::json!(["status do chamado"]));
}

#[tokio::test]
async fn model_failure_still_answers() {
    let (status, json) = post_analyze(
        app_with(Arc::new(QuotaExceededLlm)),
        &[Part::Text("texto_email", "Obrigado pelo excelente atendimento!")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Improdutivo");
    assert!(
        json["reason"]
            .as_str()
            .unwrap()
            .contains("fallback: modelo indisponível")
    );
}
