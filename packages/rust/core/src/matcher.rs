//! Bounded term → example matching.

use lexcore_miner::{ExampleBank, MinedExample};

use crate::similarity::similarity_ratio;

/// At most this many examples are linked to a term.
pub const MAX_MATCHES: usize = 3;

/// Similarity a value must exceed to match without containment.
pub const SIMILARITY_THRESHOLD: f64 = 0.70;

/// Ids of up to [`MAX_MATCHES`] examples matching `term`, in bank order.
///
/// An example matches when the lowercased term occurs in its value, its
/// call names or its variable names, or failing that, when its value is
/// more than 70% similar to the term. Scanning stops at the first
/// [`MAX_MATCHES`] hits.
pub fn match_examples(term: &str, bank: &ExampleBank) -> Vec<String> {
    let needle = term.to_lowercase();
    bank.iter()
        .filter(|(_, example)| matches(&needle, example))
        .map(|(id, _)| id.clone())
        .take(MAX_MATCHES)
        .collect()
}

fn matches(needle: &str, example: &MinedExample) -> bool {
    let value = example.value.to_lowercase();
    if value.contains(needle) || joined(&example.calls).contains(needle) {
        return true;
    }
    if joined(&example.vars).contains(needle) {
        return true;
    }
    similarity_ratio(needle, &value) > SIMILARITY_THRESHOLD
}

/// Space-joined, lowercased names.
fn joined<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn example(value: &str, calls: &[&str], vars: &[&str]) -> MinedExample {
        MinedExample {
            kind: "Call".into(),
            value: value.into(),
            doc: String::new(),
            calls: calls.iter().map(|s| s.to_string()).collect(),
            vars: vars.iter().map(|s| s.to_string()).collect(),
            keywords: BTreeSet::new(),
            param_count: 0,
            return_kind: String::new(),
            depth: 1,
            node_count: 1,
            raw_tree: None,
        }
    }

    fn bank(examples: Vec<MinedExample>) -> ExampleBank {
        examples
            .into_iter()
            .enumerate()
            .map(|(i, e)| (format!("E{:05}", i + 1), e))
            .collect()
    }

    #[test]
    fn substring_matches_values() {
        let bank = bank(vec![
            example("open_file", &[], &[]),
            example("open_files", &[], &[]),
        ]);
        assert_eq!(match_examples("open", &bank), ["E00001", "E00002"]);
    }

    #[test]
    fn matches_call_and_variable_names() {
        let bank = bank(vec![
            example("", &["json.loads"], &[]),
            example("", &[], &["Loader"]),
            example("", &["dump"], &["out"]),
        ]);
        assert_eq!(match_examples("LOAD", &bank), ["E00001", "E00002"]);
    }

    #[test]
    fn falls_back_to_similarity() {
        let bank = bank(vec![
            example("open_file", &[], &[]),
            example("read", &[], &[]),
        ]);
        // No containment, but 16/18 similar to "open_file".
        assert_eq!(match_examples("open file", &bank), ["E00001"]);
    }

    #[test]
    fn stops_after_three_matches() {
        let bank = bank(vec![
            example("load", &[], &[]),
            example("xyz", &[], &[]),
            example("loader", &[], &[]),
            example("load_all", &[], &[]),
            example("reload", &[], &[]),
        ]);
        let ids = match_examples("load", &bank);
        assert_eq!(ids, ["E00001", "E00003", "E00004"]);
    }

    #[test]
    fn every_match_satisfies_a_condition() {
        let bank = bank(vec![
            example("alpha", &["beta"], &["gamma"]),
            example("zzz", &[], &[]),
        ]);
        assert!(match_examples("delta", &bank).is_empty());
    }
}
