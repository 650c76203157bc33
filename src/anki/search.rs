use regex::Regex;

use crate::core::GrabError;

pub const DEFAULT_DECK: &str = "Sentence Mining";

/// Search string selecting every card in `deck`, in Anki's search syntax.
///
/// The whole term is quoted so deck names with spaces stay one term; wildcard
/// characters in the name are escaped so they match literally.
pub fn deck_query(deck: &str) -> String {
    let mut escaped = String::with_capacity(deck.len());
    for c in deck.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("\"deck:{}\"", escaped)
}

/// A single `deck:` search term, evaluated locally against deck names.
///
/// Follows Anki's rules for the term: case-insensitive, `*` and `_` are
/// wildcards unless escaped, and a deck also matches all of its subdecks.
#[derive(Debug, Clone)]
pub struct DeckFilter {
    regex: Regex,
}

impl DeckFilter {
    pub fn parse(query: &str) -> Result<Self, GrabError> {
        let unsupported = || GrabError::UnsupportedQuery(query.to_string());

        let trimmed = query.trim();
        let (term, quoted) = match strip_quotes(trimmed) {
            Some(inner) => (inner, true),
            None => (trimmed, false),
        };

        let name = term
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("deck:"))
            .map(|_| &term[5..])
            .ok_or_else(unsupported)?;

        let (name, quoted) = match strip_quotes(name) {
            Some(inner) if !quoted => (inner, true),
            _ => (name, quoted),
        };

        if name.is_empty() || (!quoted && name.chars().any(char::is_whitespace)) {
            return Err(unsupported());
        }

        let mut pattern = String::from("(?i)^(?:");
        let mut chars = name.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => pattern.push_str(&regex::escape(&escaped.to_string())),
                    None => return Err(unsupported()),
                },
                '*' => pattern.push_str(".*"),
                '_' => pattern.push('.'),
                _ => pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        pattern.push_str(")(?:::.*)?$");

        Ok(Self { regex: Regex::new(&pattern)? })
    }

    /// `deck_name` uses `::` between parent and child decks.
    pub fn matches(&self, deck_name: &str) -> bool {
        self.regex.is_match(deck_name)
    }
}

fn strip_quotes(text: &str) -> Option<&str> {
    text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"'))
}
