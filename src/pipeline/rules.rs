//! Rules-based classifier: the deterministic path behind every fallback.
//!
//! Pure pattern matching on the lowercased raw text:
//! - courtesy phrases (greetings, thanks, congratulations) → Unproductive
//! - request terms or a question mark → Productive
//! - anything else → Productive with a conservative confidence
//!
//! The same input always yields the same `Classification`.

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{Category, Classification};

/// Courtesy/thanks/greeting phrases, with accent-stripped variants.
pub const COURTESY_PHRASES: &[&str] = &[
    "feliz natal",
    "boas festas",
    "feliz ano novo",
    "parabéns",
    "parabens",
    "obrigado",
    "obrigada",
    "agradeço",
    "agradeco",
    "gratidão",
    "gratidao",
];

/// Request/action terms, matched on word boundaries.
const REQUEST_PATTERNS: &[&str] = &[
    r"por favor",
    r"poderia(m)?",
    r"consegue(m)?",
    r"preciso",
    r"gostaria",
    r"solicito",
    r"verificar",
    r"atualizar",
    r"status",
    r"chamado",
    r"ticket",
    r"erro",
    r"falha",
    r"acesso",
    r"senha",
    r"login",
    r"reembolso",
    r"cobrança|cobranca",
    r"fatura",
    r"anexo",
];

pub const REASON_COURTESY: &str = "Mensagem de cortesia/agradecimento sem solicitação. (fallback)";
pub const REASON_REQUEST: &str = "Há indícios de solicitação ou necessidade de ação. (fallback)";
pub const REASON_DEFAULT: &str = "Classificação conservadora (pode exigir ação). (fallback)";

/// Does the lowercased text contain any courtesy phrase?
pub fn contains_courtesy(lowered: &str) -> bool {
    COURTESY_PHRASES.iter().any(|p| lowered.contains(p))
}

/// A single request rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct RequestRule {
    /// Human-readable term, for logging.
    pub term: &'static str,
    /// Compiled word-boundary regex.
    pub regex: Regex,
}

/// What the classifier saw in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub courtesy: bool,
    pub request: bool,
    pub question: bool,
}

/// Keyword/pattern classifier.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    request_rules: Vec<RequestRule>,
}

impl RuleClassifier {
    /// Create a classifier with the built-in Portuguese lexicon.
    pub fn default_rules() -> Self {
        let request_rules = REQUEST_PATTERNS
            .iter()
            .map(|&term| RequestRule {
                term,
                regex: Regex::new(&format!(r"\b(?:{term})\b")).unwrap(),
            })
            .collect();

        Self { request_rules }
    }

    /// Detect courtesy, request and question signals.
    pub fn signals(&self, text: &str) -> Signals {
        let lowered = text.to_lowercase();

        let matched = self
            .request_rules
            .iter()
            .find(|rule| rule.regex.is_match(&lowered))
            .map(|rule| rule.term);
        if let Some(term) = matched {
            debug!(term, "Request term matched");
        }

        Signals {
            courtesy: contains_courtesy(&lowered),
            request: matched.is_some(),
            question: lowered.contains('?'),
        }
    }

    /// Classify a raw email text.
    pub fn classify(&self, text: &str) -> Classification {
        let signals = self.signals(text);

        let (category, confidence, reason): (Category, f32, &str) =
            if signals.courtesy && !signals.request && !signals.question {
                (Category::Unproductive, 0.85, REASON_COURTESY)
            } else if signals.request || signals.question {
                (Category::Productive, 0.78, REASON_REQUEST)
            } else {
                (Category::Productive, 0.65, REASON_DEFAULT)
            };

        debug!(
            courtesy = signals.courtesy,
            request = signals.request,
            question = signals.question,
            category = %category,
            confidence,
            "Rules classification"
        );

        Classification {
            category,
            confidence,
            reason: reason.to_string(),
        }
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::default_rules()
    }
}
