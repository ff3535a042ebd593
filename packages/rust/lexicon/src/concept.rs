//! Concept phrase extraction from natural-language definitions.

use std::sync::LazyLock;

use regex::Regex;

/// Returned when no definition yields a usable token.
pub const UNKNOWN_CONCEPT: &str = "unknown";

/// Only the first few definitions are considered.
const MAX_CONCEPT_DEFINITIONS: usize = 3;

/// Fillers that never name a concept.
const NON_CONCEPTS: &[&str] = &[
    "a", "an", "the", "to", "of", "in", "on", "by", "at", "any", "one", "something", "thing",
    "type", "kind", "form", "way", "means", "process", "action", "aspect", "element", "area",
    "category", "manner",
];

/// Tokens strong enough to be the concept on their own.
const PRIORITY_KEYWORDS: &[&str] = &[
    "animal", "organism", "structure", "object", "movement", "tool", "device", "substance",
    "feature", "signal", "material", "system",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));

/// Lowercased word tokens of `definition` minus the non-concept fillers.
fn concept_tokens(definition: &str) -> Vec<String> {
    let lowered = definition.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| !NON_CONCEPTS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Derive a short concept phrase from up to three definitions.
///
/// The first definition with any remaining token decides: a priority
/// keyword wins outright, otherwise the first two tokens (compound mode) or
/// the first token. [`UNKNOWN_CONCEPT`] when no definition has a token.
pub fn extract_concept<S: AsRef<str>>(definitions: &[S], compound: bool) -> String {
    for definition in definitions.iter().take(MAX_CONCEPT_DEFINITIONS) {
        let tokens = concept_tokens(definition.as_ref());

        if let Some(keyword) = tokens
            .iter()
            .find(|token| PRIORITY_KEYWORDS.contains(&token.as_str()))
        {
            return keyword.clone();
        }

        match tokens.as_slice() {
            [first, second, ..] if compound => return format!("{first} {second}"),
            [first, ..] => return first.clone(),
            [] => {}
        }
    }
    UNKNOWN_CONCEPT.to_string()
}
