//! Email analyzer: model-backed triage with a deterministic fallback.
//!
//! **Core invariant: `analyze` always returns a complete response.**
//! Every failure on the model path degrades to the rules pipeline and is
//! explained in `reason`.
//!
//! Flow:
//! 1. Model client unavailable → rules + highlights + template reply
//! 2. Model call (single attempt, bounded by a timeout) → strict JSON verdict
//! 3. Field-level validation; invalid fields are replaced, not the whole verdict

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::llm::ClientOutcome;
use crate::pipeline::highlights::{DEFAULT_MAX_HIGHLIGHTS, extract_highlights};
use crate::pipeline::preprocess::token_count;
use crate::pipeline::reply::{shorten, synthesize_reply};
use crate::pipeline::rules::RuleClassifier;
use crate::pipeline::types::{AnalysisResponse, Category, EmailInput, Tone};

/// Max tokens for the analysis call (non-reasoning models).
const ANALYZE_MAX_TOKENS: u32 = 512;

/// Temperature for analysis (non-reasoning models).
const ANALYZE_TEMPERATURE: f32 = 0.2;

/// Email body sent to the model is cut at this many characters.
const PROMPT_CONTENT_CHARS: usize = 4000;

/// Used when the model's confidence is missing or not a number.
const DEFAULT_MODEL_CONFIDENCE: f32 = 0.75;

/// Appended to the rules reason when the model call fails.
const MODEL_UNAVAILABLE_NOTE: &str = "fallback: modelo indisponível";

/// Used when the model answers without a reason.
const DEFAULT_MODEL_REASON: &str = "Classificação gerada pelo modelo.";

// ── Model verdict ───────────────────────────────────────────────────

/// Validated model output. Every field has been checked before use.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    /// `None` when the model's category was missing or not a known label.
    pub category: Option<Category>,
    /// Clamped to [0, 1].
    pub confidence: f32,
    pub reply: Option<String>,
    pub reason: Option<String>,
    /// At most two non-empty lines, in the model's order.
    pub highlights: Option<Vec<String>>,
}

/// Result of the single model attempt for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAttempt {
    Answered(ModelVerdict),
    Failed(String),
}

/// Wire shape of the model's JSON. Fields stay untyped until validation.
#[derive(Debug, Default, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    reply: Option<Value>,
    #[serde(default)]
    reason: Option<Value>,
    #[serde(default)]
    highlights: Option<Value>,
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl ModelVerdict {
    fn validate(raw: RawVerdict) -> Self {
        let category = raw
            .category
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Category::from_label);

        let confidence = match raw.confidence.as_ref() {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|c| c.is_finite())
        .map(|c| c as f32)
        .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
        .clamp(0.0, 1.0);

        let highlights = raw
            .highlights
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| non_empty_str(Some(item)))
                    .take(DEFAULT_MAX_HIGHLIGHTS)
                    .collect::<Vec<_>>()
            })
            .filter(|items| !items.is_empty());

        Self {
            category,
            confidence,
            reply: non_empty_str(raw.reply.as_ref()),
            reason: non_empty_str(raw.reason.as_ref()),
            highlights,
        }
    }
}

// ── Analyzer ────────────────────────────────────────────────────────

/// Classifies emails and drafts replies.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct EmailAnalyzer {
    client: ClientOutcome,
    rules: RuleClassifier,
    timeout: Duration,
}

impl EmailAnalyzer {
    /// Create an analyzer around an already-resolved client outcome.
    pub fn new(client: ClientOutcome, rules: RuleClassifier, timeout: Duration) -> Self {
        Self {
            client,
            rules,
            timeout,
        }
    }

    /// Analyzer that never calls a model.
    pub fn rules_only(detail: impl Into<String>) -> Self {
        Self::new(
            ClientOutcome::Unavailable(detail.into()),
            RuleClassifier::default_rules(),
            Duration::from_secs(1),
        )
    }

    /// Analyze one email. Never fails.
    pub async fn analyze(&self, input: &EmailInput, tone: Tone) -> AnalysisResponse {
        let span = info_span!(
            "analyze",
            request_id = %Uuid::new_v4(),
            tone = ?tone,
            chars = input.raw.chars().count(),
            tokens = token_count(&input.normalized),
        );

        async move {
            let response = match &self.client {
                ClientOutcome::Unavailable(detail) => {
                    debug!(detail = %detail, "Model client unavailable, using rules");
                    self.fallback_with_note(&input.raw, tone, detail)
                }
                ClientOutcome::Ready(llm) => {
                    match self.attempt_model(llm.as_ref(), &input.raw, tone).await {
                        ModelAttempt::Answered(verdict) => {
                            self.merge_verdict(verdict, &input.raw, tone)
                        }
                        ModelAttempt::Failed(reason) => {
                            warn!(error = %reason, "Model path failed, falling back to rules");
                            self.fallback_with_note(&input.raw, tone, MODEL_UNAVAILABLE_NOTE)
                        }
                    }
                }
            };

            info!(
                category = %response.category,
                confidence = response.confidence,
                highlights = response.highlights.len(),
                "Email analyzed"
            );
            response
        }
        .instrument(span)
        .await
    }

    /// The deterministic pipeline: rules → highlights → template reply.
    pub fn fallback(&self, text: &str, tone: Tone) -> AnalysisResponse {
        let classification = self.rules.classify(text);
        AnalysisResponse {
            category: classification.category,
            confidence: classification.confidence,
            reply: synthesize_reply(classification.category, text, tone),
            reason: classification.reason,
            highlights: extract_highlights(
                text,
                Some(classification.category),
                DEFAULT_MAX_HIGHLIGHTS,
            ),
        }
    }

    fn fallback_with_note(&self, text: &str, tone: Tone, note: &str) -> AnalysisResponse {
        let mut response = self.fallback(text, tone);
        response.reason = format!("{} ({})", response.reason, note);
        response
    }

    /// One model call, converted into an explicit outcome.
    async fn attempt_model(&self, llm: &dyn LlmProvider, text: &str, tone: Tone) -> ModelAttempt {
        let request = build_analysis_request(llm.model_name(), text, tone);

        let response = match tokio::time::timeout(self.timeout, llm.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return ModelAttempt::Failed(e.to_string()),
            Err(_) => {
                let e = LlmError::Timeout {
                    provider: llm.model_name().to_string(),
                    timeout: self.timeout,
                };
                return ModelAttempt::Failed(e.to_string());
            }
        };

        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Model answered"
        );

        match parse_model_response(&response.content) {
            Ok(verdict) => ModelAttempt::Answered(verdict),
            Err(e) => {
                warn!(raw_response = %response.content, error = %e, "Unparseable model response");
                ModelAttempt::Failed(e)
            }
        }
    }

    /// Fill the gaps of a validated verdict from the rules pipeline.
    fn merge_verdict(&self, verdict: ModelVerdict, text: &str, tone: Tone) -> AnalysisResponse {
        let category = verdict.category.unwrap_or_else(|| {
            let fallback = self.rules.classify(text).category;
            warn!(category = %fallback, "Model category invalid, using rules category");
            fallback
        });

        let reply = match verdict.reply {
            Some(reply) if tone == Tone::Short => shorten(&reply),
            Some(reply) => reply,
            None => synthesize_reply(category, text, tone),
        };

        let highlights = verdict
            .highlights
            .unwrap_or_else(|| extract_highlights(text, Some(category), DEFAULT_MAX_HIGHLIGHTS));

        AnalysisResponse {
            category,
            confidence: verdict.confidence,
            reply,
            reason: verdict
                .reason
                .unwrap_or_else(|| DEFAULT_MODEL_REASON.to_string()),
            highlights,
        }
    }
}

impl std::fmt::Debug for EmailAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailAnalyzer")
            .field("client", &self.client)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the analysis system prompt.
fn build_analysis_system_prompt(tone: Tone) -> String {
    format!(
        "Você é um assistente de triagem de emails de uma empresa do setor financeiro.\n\n\
         Tarefa:\n\
         1) Classificar o email em \"Produtivo\" ou \"Improdutivo\".\n\
         2) Sugerir uma resposta automática em pt-BR no estilo {style}.\n\n\
         Regras:\n\
         - \"Produtivo\": existe pedido/ação necessária (status, dúvida, erro, solicitação, cobrança, anexo).\n\
         - \"Improdutivo\": apenas cortesia (felicitações, agradecimentos) sem solicitação.\n\
         - Não invente dados; se faltarem informações, peça o mínimo necessário.\n\n\
         Responda SOMENTE em JSON estrito:\n\
         {{\n\
           \"category\": \"Produtivo|Improdutivo\",\n\
           \"confidence\": 0.0,\n\
           \"reply\": \"texto\",\n\
           \"reason\": \"frase curta\",\n\
           \"highlights\": [\"trecho 1\", \"trecho 2\"]\n\
         }}",
        style = tone.style_hint()
    )
}

/// Build the analysis user prompt from the raw email.
fn build_analysis_user_prompt(text: &str) -> String {
    let content: String = text.chars().take(PROMPT_CONTENT_CHARS).collect();
    format!("EMAIL:\n{content}")
}

/// Reasoning models (gpt-5 family, o-series) accept only their default
/// temperature, and hidden reasoning tokens count against the output cap.
fn is_reasoning_model(model: &str) -> bool {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();
    name.starts_with("gpt-5") || ["o1", "o3", "o4"].iter().any(|p| name.starts_with(p))
}

/// Build the analysis request, with sampling options the model accepts.
fn build_analysis_request(model: &str, text: &str, tone: Tone) -> CompletionRequest {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(build_analysis_system_prompt(tone)),
        ChatMessage::user(build_analysis_user_prompt(text)),
    ]);

    if is_reasoning_model(model) {
        request
    } else {
        request
            .with_temperature(ANALYZE_TEMPERATURE)
            .with_max_tokens(ANALYZE_MAX_TOKENS)
    }
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse and validate the model response.
fn parse_model_response(raw: &str) -> Result<ModelVerdict, String> {
    let value = extract_json_object(raw).ok_or_else(|| "no JSON object in response".to_string())?;
    let verdict: RawVerdict =
        serde_json::from_value(value).map_err(|e| format!("JSON schema error: {e}"))?;
    Ok(ModelVerdict::validate(verdict))
}

/// Find the JSON object in model output (handles prose and markdown wrapping).
fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    // Widest brace span: covers a lone object, fenced blocks and surrounding prose
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
        && let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end])
    {
        return Some(value);
    }

    // Otherwise the first position where a complete object parses
    trimmed.match_indices('{').find_map(|(i, _)| {
        let mut stream = serde_json::Deserializer::from_str(&trimmed[i..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => Some(value),
            _ => None,
        }
    })
}
