//! Morphological root-form reduction (WordNet "morphy").

use lexcore_shared::PartOfSpeech;

use crate::base::LexicalBase;

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJECTIVE_RULES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

/// Suffix detachment rules of a category.
fn rules(pos: PartOfSpeech) -> &'static [(&'static str, &'static str)] {
    match pos.lookup_group() {
        PartOfSpeech::Noun => NOUN_RULES,
        PartOfSpeech::Verb => VERB_RULES,
        PartOfSpeech::Adjective | PartOfSpeech::AdjectiveSatellite => ADJECTIVE_RULES,
        PartOfSpeech::Adverb => &[],
    }
}

/// Apply every matching rule to every form, in rule order.
fn apply_rules(forms: &[String], pos: PartOfSpeech) -> Vec<String> {
    let mut out = Vec::new();
    for form in forms {
        for (suffix, replacement) in rules(pos) {
            if let Some(stem) = form.strip_suffix(suffix) {
                let candidate = format!("{stem}{replacement}");
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

/// Keep the forms the lexical base knows in `pos`, deduplicated, in order.
fn known_forms<L: LexicalBase + ?Sized>(
    lexicon: &L,
    forms: impl IntoIterator<Item = String>,
    pos: PartOfSpeech,
) -> Vec<String> {
    let mut known: Vec<String> = Vec::new();
    for form in forms {
        if lexicon.has_lemma(&form, pos) && !known.contains(&form) {
            known.push(form);
        }
    }
    known
}

/// All base forms of `form` in `pos` that exist in the lexical base.
///
/// Irregular exceptions take precedence. Otherwise the form itself and its
/// one-step reductions are tried, then reductions are applied repeatedly
/// until some round yields a known form or nothing is left to reduce.
pub fn morphy<L: LexicalBase + ?Sized>(lexicon: &L, form: &str, pos: PartOfSpeech) -> Vec<String> {
    let exceptions = lexicon.exceptions(form, pos);
    if !exceptions.is_empty() {
        let candidates = std::iter::once(form.to_string()).chain(exceptions.iter().cloned());
        return known_forms(lexicon, candidates, pos);
    }

    let mut forms = apply_rules(&[form.to_string()], pos);
    let first = known_forms(
        lexicon,
        std::iter::once(form.to_string()).chain(forms.iter().cloned()),
        pos,
    );
    if !first.is_empty() {
        return first;
    }

    while !forms.is_empty() {
        forms = apply_rules(&forms, pos);
        let found = known_forms(lexicon, forms.iter().cloned(), pos);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Root form of `word` in `pos`: the shortest known base form (the first
/// one on ties), or `word` itself when none is known.
pub fn lemmatize<L: LexicalBase + ?Sized>(lexicon: &L, word: &str, pos: PartOfSpeech) -> String {
    morphy(lexicon, word, pos)
        .into_iter()
        .reduce(|best, form| {
            if form.chars().count() < best.chars().count() {
                form
            } else {
                best
            }
        })
        .unwrap_or_else(|| word.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SenseEntry;
    use std::collections::{HashMap, HashSet};

    /// Minimal in-memory base: a lemma set per category plus exceptions.
    struct Lemmas {
        known: HashSet<(String, PartOfSpeech)>,
        exceptions: HashMap<(String, PartOfSpeech), Vec<String>>,
    }

    impl Lemmas {
        fn new(entries: &[(&str, PartOfSpeech)]) -> Self {
            Self {
                known: entries
                    .iter()
                    .map(|(w, p)| (w.to_string(), p.lookup_group()))
                    .collect(),
                exceptions: HashMap::new(),
            }
        }

        fn with_exception(mut self, form: &str, pos: PartOfSpeech, bases: &[&str]) -> Self {
            self.exceptions.insert(
                (form.to_string(), pos),
                bases.iter().map(|b| b.to_string()).collect(),
            );
            self
        }
    }

    impl LexicalBase for Lemmas {
        fn senses(&self, _word: &str) -> Vec<SenseEntry> {
            Vec::new()
        }
        fn has_lemma(&self, lemma: &str, pos: PartOfSpeech) -> bool {
            self.known.contains(&(lemma.to_string(), pos.lookup_group()))
        }
        fn exceptions(&self, word: &str, pos: PartOfSpeech) -> &[String] {
            self.exceptions
                .get(&(word.to_string(), pos))
                .map(Vec::as_slice)
                .unwrap_or_default()
        }
        fn source_tag(&self) -> &str {
            "test"
        }
    }

    use PartOfSpeech::{Adjective, Adverb, Noun, Verb};

    #[test]
    fn regular_noun_plurals() {
        let lex = Lemmas::new(&[("box", Noun), ("fly", Noun), ("wolf", Noun), ("church", Noun)]);
        assert_eq!(lemmatize(&lex, "boxes", Noun), "box");
        assert_eq!(lemmatize(&lex, "flies", Noun), "fly");
        assert_eq!(lemmatize(&lex, "wolves", Noun), "wolf");
        assert_eq!(lemmatize(&lex, "churches", Noun), "church");
    }

    #[test]
    fn verb_inflections() {
        let lex = Lemmas::new(&[("run", Verb), ("make", Verb), ("stop", Verb), ("walk", Verb)]);
        assert_eq!(lemmatize(&lex, "making", Verb), "make");
        assert_eq!(lemmatize(&lex, "walked", Verb), "walk");
        assert_eq!(lemmatize(&lex, "runs", Verb), "run");
        // No doubled-consonant rule: unknown reduction leaves the word as is.
        assert_eq!(lemmatize(&lex, "stopped", Verb), "stopped");
    }

    #[test]
    fn known_word_is_its_own_root() {
        let lex = Lemmas::new(&[("glasses", Noun), ("glass", Noun)]);
        assert_eq!(morphy(&lex, "glasses", Noun), ["glasses", "glass"]);
        assert_eq!(lemmatize(&lex, "glasses", Noun), "glass");
    }

    #[test]
    fn shortest_wins_first_on_ties() {
        let lex = Lemmas::new(&[("hop", Verb), ("hope", Verb)]);
        assert_eq!(morphy(&lex, "hoped", Verb), ["hope", "hop"]);
        assert_eq!(lemmatize(&lex, "hoped", Verb), "hop");

        let tie = Lemmas::new(&[("die", Noun), ("dye", Noun)])
            .with_exception("dice", Noun, &["die", "dye"]);
        assert_eq!(lemmatize(&tie, "dice", Noun), "die");
    }

    #[test]
    fn exceptions_take_precedence() {
        let lex = Lemmas::new(&[("mouse", Noun), ("mice", Noun)])
            .with_exception("mice", Noun, &["mouse"]);
        assert_eq!(morphy(&lex, "mice", Noun), ["mice", "mouse"]);
        assert_eq!(lemmatize(&lex, "mice", Noun), "mice");
    }

    #[test]
    fn comparatives_and_superlatives() {
        let lex = Lemmas::new(&[("fast", Adjective)]);
        assert_eq!(lemmatize(&lex, "faster", Adjective), "fast");
        assert_eq!(lemmatize(&lex, "fastest", PartOfSpeech::AdjectiveSatellite), "fast");
    }

    #[test]
    fn adverbs_are_never_reduced() {
        let lex = Lemmas::new(&[("quick", Adverb)]);
        assert!(morphy(&lex, "quickly", Adverb).is_empty());
        assert_eq!(lemmatize(&lex, "quickly", Adverb), "quickly");
    }

    #[test]
    fn unknown_word_is_returned_unchanged() {
        let lex = Lemmas::new(&[]);
        assert_eq!(lemmatize(&lex, "data driven", Noun), "data driven");
    }
}
