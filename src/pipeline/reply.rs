//! Template replies used whenever the model does not supply one.
//!
//! Unproductive emails get a courtesy reply matched to the greeting.
//! Productive emails get a reply asking for the minimal missing information
//! for the detected intent. `Tone::Short` keeps the first four non-empty lines.

use tracing::debug;

use crate::pipeline::preprocess::content_lines;
use crate::pipeline::types::{Category, CourtesyKind, Intent, Tone};

/// Non-empty lines kept by the short tone.
pub const SHORT_REPLY_LINES: usize = 4;

const ACCESS_TERMS: &[&str] = &["acesso", "login", "senha", "credenciais", "inválidas", "invalidas"];
const STATUS_TERMS: &[&str] = &["status", "chamado", "ticket", "prazo"];
const BILLING_TERMS: &[&str] = &["cobran", "fatura", "pagamento", "reembolso"];
const THANKS_TERMS: &[&str] = &["obrigado", "obrigada", "agradeço", "agradeco", "gratidão", "gratidao"];

/// Sub-classify a courtesy email. Earlier kinds win.
pub fn courtesy_kind(text: &str) -> CourtesyKind {
    let t = text.to_lowercase();
    if t.contains("feliz natal") {
        CourtesyKind::Natal
    } else if t.contains("feliz ano novo") {
        CourtesyKind::AnoNovo
    } else if t.contains("boas festas") {
        CourtesyKind::BoasFestas
    } else if t.contains("parabéns") || t.contains("parabens") {
        CourtesyKind::Parabens
    } else if THANKS_TERMS.iter().any(|k| t.contains(k)) {
        CourtesyKind::Agradecimento
    } else {
        CourtesyKind::Cortesia
    }
}

/// Detect what a productive email is asking about. Earlier groups win.
pub fn intent(text: &str) -> Intent {
    let t = text.to_lowercase();
    if ACCESS_TERMS.iter().any(|k| t.contains(k)) {
        Intent::Access
    } else if STATUS_TERMS.iter().any(|k| t.contains(k)) {
        Intent::Status
    } else if BILLING_TERMS.iter().any(|k| t.contains(k)) {
        Intent::Billing
    } else {
        Intent::Generic
    }
}

fn courtesy_template(kind: CourtesyKind) -> &'static str {
    match kind {
        CourtesyKind::Natal => {
            "Olá! Obrigado pela mensagem.\n\n\
             Desejamos a você e sua equipe um Feliz Natal e boas festas.\n\
             Permanecemos à disposição."
        }
        CourtesyKind::AnoNovo => {
            "Olá! Obrigado pela mensagem.\n\n\
             Desejamos um excelente Ano Novo, com muito sucesso.\n\
             Conte conosco sempre que precisar."
        }
        CourtesyKind::BoasFestas => {
            "Olá! Obrigado pela mensagem.\n\n\
             Desejamos boas festas e um ótimo encerramento de ano.\n\
             Seguimos à disposição."
        }
        CourtesyKind::Parabens => {
            "Olá! Agradecemos a mensagem.\n\n\
             Parabéns! Ficamos felizes pelo contato.\n\
             Se precisar de algo, conte conosco."
        }
        CourtesyKind::Agradecimento | CourtesyKind::Cortesia => {
            "Olá! Obrigado pela mensagem.\n\n\
             Ficamos à disposição caso precise de qualquer suporte."
        }
    }
}

fn intent_template(intent: Intent) -> &'static str {
    match intent {
        Intent::Access => {
            "Olá! Obrigado pelo contato.\n\n\
             Entendi que você está com dificuldade de acesso. Para agilizar a verificação, por favor informe:\n\
             • Horário aproximado em que o erro começou\n\
             • Mensagem exata exibida (se possível, um print)\n\
             • Se acontece em outro navegador ou aba anônima\n\n\
             Com isso, seguimos com a análise e retorno."
        }
        Intent::Status => {
            "Olá! Obrigado pelo contato.\n\n\
             Para consultar o status, por favor confirme:\n\
             • Número do chamado/ticket (se houver)\n\
             • Nome ou identificação do solicitante\n\n\
             Assim que eu tiver esses dados, retorno com a atualização."
        }
        Intent::Billing => {
            "Olá! Obrigado pelo contato.\n\n\
             Para analisar a solicitação financeira, por favor informe:\n\
             • CPF/CNPJ (ou identificador do cliente)\n\
             • Número da fatura/transação (se houver)\n\
             • Valor e data aproximada\n\n\
             Com esses dados, conseguimos dar andamento."
        }
        Intent::Generic => {
            "Olá! Recebemos sua mensagem e vamos analisar.\n\n\
             Para agilizar o atendimento, por favor envie mais detalhes sobre a solicitação \
             e, se possível, evidências (prints/anexos) e horário aproximado do ocorrido.\n\n\
             Assim seguimos com a verificação."
        }
    }
}

/// Keep the first four non-empty lines, trimmed.
pub fn shorten(text: &str) -> String {
    content_lines(text)
        .take(SHORT_REPLY_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draft a reply for `text` given its category and the desired tone.
pub fn synthesize_reply(category: Category, text: &str, tone: Tone) -> String {
    let template = match category {
        Category::Unproductive => {
            let kind = courtesy_kind(text);
            debug!(kind = kind.label(), "Courtesy reply template");
            courtesy_template(kind)
        }
        Category::Productive => {
            let detected = intent(text);
            debug!(intent = ?detected, "Request reply template");
            intent_template(detected)
        }
    };

    match tone {
        Tone::Formal => template.to_string(),
        Tone::Short => shorten(template),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_empty_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    #[test]
    fn courtesy_kind_priority() {
        assert_eq!(courtesy_kind("Feliz Natal e feliz ano novo!"), CourtesyKind::Natal);
        assert_eq!(courtesy_kind("Feliz Ano Novo e boas festas"), CourtesyKind::AnoNovo);
        assert_eq!(courtesy_kind("Boas festas, obrigado"), CourtesyKind::BoasFestas);
        assert_eq!(courtesy_kind("Parabéns e obrigado"), CourtesyKind::Parabens);
        assert_eq!(courtesy_kind("Parabens!"), CourtesyKind::Parabens);
        assert_eq!(courtesy_kind("Agradeco o apoio"), CourtesyKind::Agradecimento);
        assert_eq!(courtesy_kind("Tenha um bom dia"), CourtesyKind::Cortesia);
    }

    #[test]
    fn intent_priority() {
        assert_eq!(intent("Erro de login no chamado 55"), Intent::Access);
        assert_eq!(intent("Qual o prazo do ticket?"), Intent::Status);
        assert_eq!(intent("Segunda via da fatura"), Intent::Billing);
        assert_eq!(intent("Cobrança duplicada"), Intent::Billing);
        assert_eq!(intent("Podem me ligar?"), Intent::Generic);
    }

    #[test]
    fn thanks_reply_offers_availability() {
        let reply = synthesize_reply(
            Category::Unproductive,
            "Obrigado pelo excelente atendimento!",
            Tone::Formal,
        );
        assert!(reply.contains("disposição"));
    }

    #[test]
    fn christmas_reply_returns_greeting() {
        let reply = synthesize_reply(Category::Unproductive, "Feliz Natal a toda equipe!", Tone::Formal);
        assert!(reply.contains("Feliz Natal"));
    }

    #[test]
    fn new_year_and_congratulations_have_own_templates() {
        let new_year = synthesize_reply(Category::Unproductive, "Feliz ano novo!", Tone::Formal);
        assert!(new_year.contains("Ano Novo"));
        let congrats = synthesize_reply(Category::Unproductive, "Parabéns pela entrega", Tone::Formal);
        assert!(congrats.contains("Parabéns!"));
    }

    #[test]
    fn productive_templates_ask_for_missing_data() {
        let access = synthesize_reply(Category::Productive, "Não consigo fazer login", Tone::Formal);
        assert!(access.contains("dificuldade de acesso"));

        let status = synthesize_reply(
            Category::Productive,
            "Por favor, verifiquem o status do chamado #1234.",
            Tone::Formal,
        );
        assert!(status.contains("Número do chamado/ticket"));

        let billing = synthesize_reply(Category::Productive, "Quero reembolso", Tone::Formal);
        assert!(billing.contains("solicitação financeira"));

        let generic = synthesize_reply(Category::Productive, "", Tone::Formal);
        assert!(generic.contains("mais detalhes"));
    }

    #[test]
    fn short_tone_keeps_four_lines() {
        let formal = synthesize_reply(Category::Productive, "erro de senha", Tone::Formal);
        let short = synthesize_reply(Category::Productive, "erro de senha", Tone::Short);
        assert!(non_empty_lines(&formal).len() > SHORT_REPLY_LINES);
        assert_eq!(non_empty_lines(&short).len(), SHORT_REPLY_LINES);
    }

    #[test]
    fn short_tone_is_prefix_of_formal_for_every_template() {
        let samples = [
            (Category::Unproductive, "Feliz Natal"),
            (Category::Unproductive, "Feliz ano novo"),
            (Category::Unproductive, "Boas festas"),
            (Category::Unproductive, "Parabéns"),
            (Category::Unproductive, "Obrigado"),
            (Category::Unproductive, "Bom dia"),
            (Category::Productive, "senha"),
            (Category::Productive, "status"),
            (Category::Productive, "fatura"),
            (Category::Productive, "ajuda"),
        ];
        for (category, text) in samples {
            let formal = non_empty_lines(&synthesize_reply(category, text, Tone::Formal));
            let short = non_empty_lines(&synthesize_reply(category, text, Tone::Short));
            assert!(short.len() <= SHORT_REPLY_LINES, "{text}");
            assert_eq!(short[..], formal[..short.len()], "{text}");
        }
    }

    #[test]
    fn shorten_trims_and_drops_blank_lines() {
        assert_eq!(shorten("  a \n\n b\n\n\nc\nd\ne"), "a\nb\nc\nd");
        assert_eq!(shorten(""), "");
        assert_eq!(shorten("a\rb\r\nc\rd\re"), "a\nb\nc\nd");
    }
}
