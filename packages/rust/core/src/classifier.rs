//! Heuristic classification of mined vocabulary terms.

use std::collections::HashMap;

use lexcore_shared::{TermCategory, TermClassification};

/// Generic fillers that never name a concept.
const STOP_TERMS: &[&str] = &["the", "and", "this", "that", "from", "your", "none", "self"];

/// Characters that join the parts of a function-like name.
const SEPARATORS: &[char] = &['_', '-', '.', ' '];

/// Share of the term held by its three most frequent characters.
const GARBAGE_RATIO: f64 = 0.6;

/// Terms shorter than this are never garbage.
const GARBAGE_MIN_LEN: usize = 5;

/// Suggested concept code for the n-th coded term (`C0001`, ...).
pub fn concept_code(index: usize) -> String {
    format!("C{index:04}")
}

/// Classify `term`, minting a suggested code from `index` when the term is
/// worth keeping. Decision order: first match wins.
pub fn classify(term: &str, index: usize) -> TermClassification {
    let len = term.chars().count();
    let (category, score, notes) = if len <= 2 {
        (TermCategory::Irrelevant, 0, "too short")
    } else if STOP_TERMS.contains(&term) {
        (TermCategory::Irrelevant, 0, "generic word")
    } else if is_garbage_like(term) {
        (TermCategory::Nonsense, -2, "repeated characters")
    } else if is_title_case(term) {
        (TermCategory::Class, 3, "type-like name")
    } else if has_internal_separator(term) {
        (TermCategory::Function, 4, "function or handler")
    } else {
        (TermCategory::Concept, 5, "concept candidate")
    };

    let suggested_code = match category {
        TermCategory::Class | TermCategory::Function | TermCategory::Concept => {
            Some(concept_code(index))
        }
        _ => None,
    };

    TermClassification {
        term: term.to_string(),
        category,
        score,
        notes: notes.to_string(),
        suggested_code,
    }
}

/// The three most frequent characters cover at least 60% of a term of five
/// or more characters.
fn is_garbage_like(term: &str) -> bool {
    let len = term.chars().count();
    if len < GARBAGE_MIN_LEN {
        return false;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in term.chars() {
        *freq.entry(c).or_default() += 1;
    }
    let mut counts: Vec<usize> = freq.into_values().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let top: usize = counts.iter().take(3).sum();

    top as f64 / len as f64 >= GARBAGE_RATIO
}

fn is_title_case(term: &str) -> bool {
    term.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && term.chars().any(|c| c.is_lowercase())
}

/// A separator somewhere other than the first or last position.
fn has_internal_separator(term: &str) -> bool {
    let chars: Vec<char> = term.chars().collect();
    chars.len() > 2 && chars[1..chars.len() - 1].iter().any(|c| SEPARATORS.contains(c))
}

// ---------------------------------------------------------------------------
// Run-scoped classifier
// ---------------------------------------------------------------------------

/// Classifies each distinct term once per run and hands out sequential
/// codes. The counter advances only when a code is assigned.
#[derive(Debug, Clone)]
pub struct TermClassifier {
    cache: HashMap<String, TermClassification>,
    next_index: usize,
}

impl Default for TermClassifier {
    fn default() -> Self {
        Self {
            cache: HashMap::new(),
            next_index: 1,
        }
    }
}

impl TermClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached classification of `term`.
    pub fn classify(&mut self, term: &str) -> &TermClassification {
        if !self.cache.contains_key(term) {
            let analysis = classify(term, self.next_index);
            if analysis.suggested_code.is_some() {
                self.next_index += 1;
            }
            self.cache.insert(term.to_string(), analysis);
        }
        &self.cache[term]
    }

    /// Number of codes handed out so far.
    pub fn codes_assigned(&self) -> usize {
        self.next_index - 1
    }

    /// Number of distinct terms classified.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_stop_terms_are_irrelevant() {
        for term in ["ab", "x", "the", "self", "none"] {
            let c = classify(term, 1);
            assert_eq!(c.category, TermCategory::Irrelevant, "{term}");
            assert_eq!(c.suggested_code, None);
        }
    }

    #[test]
    fn repeated_characters_are_nonsense() {
        let c = classify("aaaaab", 1);
        assert_eq!(c.category, TermCategory::Nonsense);
        assert_eq!(c.score, -2);
        assert_eq!(c.suggested_code, None);

        // Four characters are never garbage, however repetitive.
        assert_eq!(classify("aaaa", 1).category, TermCategory::Concept);
    }

    #[test]
    fn garbage_check_runs_before_casing() {
        // Top three characters cover exactly 60% of "Parse".
        assert_eq!(classify("Parse", 1).category, TermCategory::Nonsense);
    }

    #[test]
    fn title_case_is_class() {
        let c = classify("Configure", 7);
        assert_eq!(c.category, TermCategory::Class);
        assert_eq!(c.score, 3);
        assert_eq!(c.suggested_code.as_deref(), Some("C0007"));
        assert_eq!(classify("CONFIGURE", 7).category, TermCategory::Concept);
    }

    #[test]
    fn internal_separators_mark_functions() {
        for term in ["open file", "open_file", "os.path", "read-config"] {
            let c = classify(term, 2);
            assert_eq!(c.category, TermCategory::Function, "{term}");
            assert_eq!(c.score, 4);
        }
        assert_eq!(classify("_config", 2).category, TermCategory::Concept);
        assert_eq!(classify("config_", 2).category, TermCategory::Concept);
    }

    #[test]
    fn plain_words_are_concepts() {
        let c = classify("config", 12);
        assert_eq!(c.category, TermCategory::Concept);
        assert_eq!(c.score, 5);
        assert_eq!(c.suggested_code.as_deref(), Some("C0012"));
    }

    #[test]
    fn classification_is_pure() {
        assert_eq!(classify("open file", 3), classify("open file", 3));
    }

    #[test]
    fn codes_advance_only_when_assigned() {
        let mut classifier = TermClassifier::new();
        assert_eq!(classifier.classify("config").suggested_code.as_deref(), Some("C0001"));
        assert_eq!(classifier.classify("ab").suggested_code, None);
        assert_eq!(classifier.classify("open file").suggested_code.as_deref(), Some("C0002"));
        // Cached: same code, counter untouched.
        assert_eq!(classifier.classify("config").suggested_code.as_deref(), Some("C0001"));
        assert_eq!(classifier.codes_assigned(), 2);
        assert_eq!(classifier.len(), 3);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn term_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,20}",
            "[A-Za-z_.\\- ]{0,20}",
            any::<String>(),
        ]
    }

    fn is_code(code: &str) -> bool {
        code.len() == 5
            && code.starts_with('C')
            && code[1..].chars().all(|c| c.is_ascii_digit())
    }

    proptest! {
        /// Property: classification depends only on its inputs.
        #[test]
        fn classify_is_pure(term in term_strategy(), index in 1usize..10_000) {
            prop_assert_eq!(classify(&term, index), classify(&term, index));
        }

        /// Property: kept categories carry a `C` + four digit code, others none.
        #[test]
        fn codes_follow_category(term in term_strategy(), index in 1usize..10_000) {
            let analysis = classify(&term, index);
            match analysis.category {
                TermCategory::Class | TermCategory::Function | TermCategory::Concept => {
                    let code = analysis.suggested_code.as_deref().unwrap_or_default();
                    prop_assert!(is_code(code), "bad code {:?}", code);
                    prop_assert_eq!(code, concept_code(index));
                }
                _ => prop_assert_eq!(analysis.suggested_code, None),
            }
        }

        /// Property: the run classifier answers repeated terms from its cache.
        #[test]
        fn run_classifier_is_stable(terms in prop::collection::vec(term_strategy(), 1..20)) {
            let mut classifier = TermClassifier::new();
            let first: Vec<TermClassification> =
                terms.iter().map(|t| classifier.classify(t).clone()).collect();
            let assigned = classifier.codes_assigned();
            for (term, expected) in terms.iter().zip(&first) {
                prop_assert_eq!(classifier.classify(term), expected);
            }
            prop_assert_eq!(classifier.codes_assigned(), assigned);
        }
    }
}
