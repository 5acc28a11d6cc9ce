//! Shared types for the triage pipeline.

use serde::{Deserialize, Serialize};

// ── Category ────────────────────────────────────────────────────────

/// Triage category for an inbound email.
///
/// Serialized with the Portuguese labels the client displays; the English
/// names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Requires an action or a response beyond acknowledgment.
    #[serde(rename = "Produtivo", alias = "Productive")]
    Productive,
    /// Courtesy, thanks, greetings. No action required.
    #[serde(rename = "Improdutivo", alias = "Unproductive")]
    Unproductive,
}

impl Category {
    /// Wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Productive => "Produtivo",
            Self::Unproductive => "Improdutivo",
        }
    }

    /// Parse a label produced by a model: exact Portuguese or English names only.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Produtivo" | "Productive" => Some(Self::Productive),
            "Improdutivo" | "Unproductive" => Some(Self::Unproductive),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Tone ────────────────────────────────────────────────────────────

/// Desired tone of the drafted reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    /// At most four non-empty lines.
    #[serde(alias = "curto")]
    Short,
}

impl Tone {
    /// Lenient parse for form fields: anything unrecognized is formal.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "short" | "curto" => Self::Short,
            _ => Self::Formal,
        }
    }

    /// Style hint used in the model prompt.
    pub fn style_hint(&self) -> &'static str {
        match self {
            Self::Formal => "formal e profissional",
            Self::Short => "objetiva e curta",
        }
    }
}

// ── Sub-types ───────────────────────────────────────────────────────

/// Finer classification of unproductive emails, used to pick a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtesyKind {
    Natal,
    AnoNovo,
    BoasFestas,
    Parabens,
    Agradecimento,
    Cortesia,
}

impl CourtesyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Natal => "natal",
            Self::AnoNovo => "anonovo",
            Self::BoasFestas => "boasfestas",
            Self::Parabens => "parabens",
            Self::Agradecimento => "agradecimento",
            Self::Cortesia => "cortesia",
        }
    }
}

/// Finer classification of productive emails, used to pick a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Login, password, credentials.
    Access,
    /// Ticket status, deadlines.
    Status,
    /// Invoices, charges, refunds.
    Billing,
    Generic,
}

// ── Results ─────────────────────────────────────────────────────────

/// Category decision with its confidence and justification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub confidence: f32,
    pub reason: String,
}

/// Raw email text as handed to the analyzer.
#[derive(Debug, Clone, Default)]
pub struct EmailInput {
    /// Text as received; all pattern matching runs on this.
    pub raw: String,
    /// Normalized form (see `preprocess::normalize`).
    pub normalized: String,
}

impl EmailInput {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = super::preprocess::normalize(&raw);
        Self { raw, normalized }
    }
}

/// Everything the caller sees for one analyzed email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub category: Category,
    pub confidence: f32,
    pub reply: String,
    pub reason: String,
    pub highlights: Vec<String>,
}
