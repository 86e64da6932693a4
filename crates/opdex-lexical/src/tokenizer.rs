//! Record and query tokenization.
//!
//! Build-time and query-time tokenization must agree exactly for the
//! posting-list lookups to line up, so everything here is a pure
//! function of its input.

use rust_stemmers::{Algorithm, Stemmer};

/// Insert spaces at identifier case boundaries so natural-language
/// words hidden in `camelCase`/`PascalCase` identifiers become
/// separate pieces: `camelCase` -> `camel Case`, `XMLParser` ->
/// `XML Parser`.
fn split_case_boundaries(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let lower_to_upper = prev.is_lowercase() || prev.is_numeric();
            let acronym_end =
                prev.is_uppercase() && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if lower_to_upper || acronym_end {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Normalize and split `text` into an ordered sequence of stems.
/// Splits case boundaries, then any run of non-alphanumeric characters
/// (covers `_`, `-` and whitespace), then lowercases and Porter-stems
/// each piece. Empty input yields an empty sequence.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let stemmer = Stemmer::create(Algorithm::English);
    split_case_boundaries(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(|piece| stemmer.stem(&piece.to_lowercase()).into_owned())
        .collect()
}
