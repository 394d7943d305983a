//! Symbol extraction from free text.
//!
//! A symbol is the `$` sigil followed by one or more ASCII alphanumerics,
//! e.g. `$DOGE` or `$pepe2`. Extraction keeps the raw form; normalization is
//! applied later, where the symbol meets the index.

use regex::Regex;
use std::sync::OnceLock;

pub const SIGIL: char = '$';

fn symbol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[A-Za-z0-9]+").expect("static symbol pattern"))
}

/// Return every symbol occurrence in `text`, in order, duplicates included.
pub fn extract_symbols(text: &str) -> Vec<String> {
    symbol_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip leading sigils and lowercase.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim_start_matches(SIGIL).to_lowercase()
}
