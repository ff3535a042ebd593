//! Token normalization shared by the miner and the lexicon.
//!
//! Every raw token is passed through [`normalize`] before it becomes a
//! vocabulary term or a lexicon query.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a lowercase Latin letter or whitespace.
static NON_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("valid regex"));

/// Runs of whitespace.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a raw token.
///
/// Lowercases, turns `_` and `-` into spaces, drops every character that is
/// not `a-z` or whitespace, collapses whitespace runs and trims. Returns
/// `None` when nothing is left.
pub fn normalize(raw: &str) -> Option<String> {
    let lowered = raw.replace(['_', '-'], " ").to_lowercase();
    let letters = NON_LETTER_RE.replace_all(&lowered, "");
    let collapsed = WHITESPACE_RE.replace_all(&letters, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize an arbitrary JSON scalar. Non-strings produce `None`.
pub fn normalize_value(value: &serde_json::Value) -> Option<String> {
    value.as_str().and_then(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cleans_separators_and_symbols() {
        assert_eq!(normalize("data-driven").as_deref(), Some("data driven"));
        assert_eq!(normalize("this_is_clean").as_deref(), Some("this is clean"));
        assert_eq!(normalize("Python_Dev!").as_deref(), Some("python dev"));
        assert_eq!(normalize("  multiple   spaces ").as_deref(), Some("multiple spaces"));
        assert_eq!(normalize("Cat").as_deref(), Some("cat"));
    }

    #[test]
    fn drops_non_latin_letters() {
        assert_eq!(normalize("Café").as_deref(), Some("caf"));
        assert_eq!(normalize("NAÏVE").as_deref(), Some("nave"));
    }

    #[test]
    fn empty_results_are_none() {
        assert_eq!(normalize("!!!"), None);
        assert_eq!(normalize("12345"), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("__--__"), None);
    }

    #[test]
    fn non_strings_are_none() {
        assert_eq!(normalize_value(&json!(null)), None);
        assert_eq!(normalize_value(&json!(42)), None);
        assert_eq!(normalize_value(&json!(["open"])), None);
        assert_eq!(normalize_value(&json!("open_file")).as_deref(), Some("open file"));
    }

    #[test]
    fn idempotent() {
        let samples = [
            "data-driven",
            "  OpenFile__reader-42 ",
            "x\t\ny",
            "__init__",
            "self.assertEqual",
            "Ünïcödé_names",
            "a  b   c",
        ];
        for sample in samples {
            let once = normalize(sample);
            let twice = once.as_deref().and_then(normalize);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn output_has_no_digits_separators_or_double_spaces() {
        let samples = ["get_2nd-item", "A--B__C", "tab\tsep  arated", "x1y2z3", "end_"];
        for sample in samples {
            if let Some(out) = normalize(sample) {
                assert!(!out.chars().any(|c| c.is_ascii_digit()), "{out:?}");
                assert!(!out.contains('_') && !out.contains('-'), "{out:?}");
                assert!(!out.contains("  "), "{out:?}");
                assert_eq!(out.trim(), out);
            }
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Identifier-like tokens mixed with arbitrary unicode.
    fn raw_token_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z0-9_\\-. \t]{0,24}",
            any::<String>(),
        ]
    }

    proptest! {
        /// Property: normalizing twice equals normalizing once.
        #[test]
        fn normalize_is_idempotent(raw in raw_token_strategy()) {
            let once = normalize(&raw);
            let twice = once.as_deref().and_then(normalize);
            prop_assert_eq!(once, twice);
        }

        /// Property: output is trimmed, single-spaced `[a-z ]` text.
        #[test]
        fn output_alphabet_is_lowercase_letters_and_spaces(raw in raw_token_strategy()) {
            if let Some(out) = normalize(&raw) {
                prop_assert!(!out.is_empty());
                prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c == ' '));
                prop_assert!(!out.contains("  "));
                prop_assert_eq!(out.trim(), out.as_str());
            }
        }
    }
}
