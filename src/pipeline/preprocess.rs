//! Text normalization for Portuguese email bodies.
//!
//! The normalized form is only used for bookkeeping (token counts in logs);
//! classification always runs on the raw text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static STOPWORDS_PT_BR: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "a", "o", "os", "as", "de", "do", "da", "dos", "das", "e", "ou", "para", "por", "com",
        "em", "um", "uma", "uns", "umas", "que", "se", "na", "no", "nos", "nas", "ao", "aos",
        "à", "às", "mais", "menos", "muito", "pouco", "já", "ja", "também", "tambem",
    ])
});

// Keeps word characters, whitespace and the separators found in addresses.
static NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s@.\-]").unwrap());

/// Lowercase, strip punctuation noise and Portuguese stop words.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = NOISE.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|token| !STOPWORDS_PT_BR.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed, non-empty lines. Bare `\r` counts as a line break too.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Number of tokens left after normalization.
pub fn token_count(normalized: &str) -> usize {
    normalized.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Bom   DIA\n\nequipe  "), "bom dia equipe");
    }

    #[test]
    fn drops_stopwords() {
        assert_eq!(
            normalize("Preciso de acesso ao sistema para a equipe"),
            "preciso acesso sistema equipe"
        );
    }

    #[test]
    fn keeps_email_addresses_and_hyphens() {
        assert_eq!(
            normalize("Contato: joao.silva@empresa.com.br (pré-venda)!"),
            "contato joao.silva@empresa.com.br pré-venda"
        );
    }

    #[test]
    fn strips_punctuation_and_symbols() {
        assert_eq!(normalize("Chamado #1234?!"), "chamado 1234");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(token_count(""), 0);
    }

    #[test]
    fn content_lines_split_on_any_line_break() {
        let lines: Vec<&str> = content_lines("Bom dia\rStatus do chamado\r\n\n  Abraço  \n").collect();
        assert_eq!(lines, vec!["Bom dia", "Status do chamado", "Abraço"]);
        assert_eq!(content_lines(" \r\n ").count(), 0);
    }

    #[test]
    fn counts_tokens() {
        assert_eq!(token_count(&normalize("Obrigado pelo excelente atendimento!")), 4);
    }
}
