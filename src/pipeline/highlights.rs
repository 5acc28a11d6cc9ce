//! Highlight extraction: picks the input lines that best justify a classification.
//!
//! Passes run in order and stop as soon as the cap is reached:
//! 1. strong signals (status, deadlines, errors, "não consigo", ...)
//! 2. identifiers (`Assunto:` lines, ticket references, `#` ids)
//! 3. the first courtesy line, only for unproductive emails
//! 4. the first remaining lines, in order

use crate::pipeline::preprocess::content_lines;
use crate::pipeline::rules::contains_courtesy;
use crate::pipeline::types::Category;

/// Default number of highlights returned.
pub const DEFAULT_MAX_HIGHLIGHTS: usize = 2;

const STRONG_SIGNALS: &[&str] = &[
    "status",
    "prazo",
    "cobrando",
    "retorno",
    "erro",
    "falha",
    "não consigo",
    "nao consigo",
    "verificar",
    "atualizar",
    "resolver",
];

/// Ordered, de-duplicated picks bounded by `max`.
struct Picks<'a> {
    lines: Vec<&'a str>,
    max: usize,
}

impl<'a> Picks<'a> {
    fn full(&self) -> bool {
        self.lines.len() >= self.max
    }

    /// Add a line unless already picked. Returns true once the cap is reached.
    fn add(&mut self, line: &'a str) -> bool {
        if !self.full() && !self.lines.contains(&line) {
            self.lines.push(line);
        }
        self.full()
    }

    fn into_strings(self) -> Vec<String> {
        self.lines.into_iter().map(String::from).collect()
    }
}

fn is_identifier_line(line: &str) -> bool {
    let lowered = line.to_lowercase();
    lowered.starts_with("assunto:") || lowered.contains("chamado") || line.contains('#')
}

/// Extract up to `max_items` distinct trimmed lines from `text`.
pub fn extract_highlights(
    text: &str,
    category_hint: Option<Category>,
    max_items: usize,
) -> Vec<String> {
    let lines: Vec<&str> = content_lines(text).collect();

    if max_items == 0 || lines.is_empty() {
        return Vec::new();
    }

    let mut picks = Picks {
        lines: Vec::with_capacity(max_items),
        max: max_items,
    };

    // Strong signals
    for &line in &lines {
        let lowered = line.to_lowercase();
        if STRONG_SIGNALS.iter().any(|s| lowered.contains(s)) && picks.add(line) {
            return picks.into_strings();
        }
    }

    // Identifiers
    for &line in &lines {
        if is_identifier_line(line) && picks.add(line) {
            return picks.into_strings();
        }
    }

    // Courtesy
    if category_hint == Some(Category::Unproductive)
        && let Some(line) = lines.iter().copied().find(|l| contains_courtesy(&l.to_lowercase()))
        && picks.add(line)
    {
        return picks.into_strings();
    }

    // Fill with the first remaining lines
    for &line in &lines {
        if picks.add(line) {
            break;
        }
    }

    picks.into_strings()
}
