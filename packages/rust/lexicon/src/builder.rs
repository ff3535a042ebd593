//! CoreUnit synthesis from a lexical base.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use lexcore_shared::{
    CoreUnit, DefinitionEntry, MAX_DEFINITIONS, MAX_RELATED, PartOfSpeech, normalize,
};

use crate::base::LexicalBase;
use crate::concept::extract_concept;
use crate::morphy::lemmatize;
use crate::pos::{dominant_pos, pos_label};

/// Id of a core unit: `<ROOT>_<CODE>_CORE`, uppercased.
pub fn core_unit_id(stem: &str, pos: PartOfSpeech) -> String {
    format!("{}_{}_CORE", stem.to_uppercase(), pos.code().to_uppercase())
}

/// Builds one [`CoreUnit`] per term from a [`LexicalBase`].
pub struct CoreUnitBuilder<'a, L: LexicalBase + ?Sized> {
    lexicon: &'a L,
    compound: bool,
}

impl<'a, L: LexicalBase + ?Sized> CoreUnitBuilder<'a, L> {
    pub fn new(lexicon: &'a L) -> Self {
        Self {
            lexicon,
            compound: true,
        }
    }

    /// Enable or disable two-token concept phrases.
    pub fn compound(mut self, compound: bool) -> Self {
        self.compound = compound;
        self
    }

    /// Build the unit for `normalized` (the normalized form of `raw`).
    ///
    /// `None` when the lexical base has no senses for the term or every
    /// definition is blank. `timestamp` defaults to now.
    pub fn build(
        &self,
        raw: &str,
        normalized: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<CoreUnit> {
        let senses = self.lexicon.senses(normalized);
        if senses.is_empty() {
            debug!(raw, normalized, "no senses");
            return None;
        }

        let source = self.lexicon.source_tag();
        let mut definitions = Vec::with_capacity(senses.len());
        let mut pos = BTreeSet::new();
        let mut related = BTreeSet::new();

        for sense in &senses {
            definitions.push(DefinitionEntry {
                definition: sense.definition.clone(),
                example: sense.examples.first().cloned().unwrap_or_default(),
                source: source.to_string(),
            });
            pos.insert(pos_label(&sense.pos));

            for lemma in &sense.lemmas {
                if let Some(clean) = normalize(lemma) {
                    let root = lemmatize(self.lexicon, &clean, PartOfSpeech::Noun);
                    if !root.is_empty() {
                        related.insert(root);
                    }
                }
            }
        }

        let concept_candidates: Vec<&str> = definitions
            .iter()
            .map(|d| d.definition.trim())
            .filter(|d| !d.is_empty())
            .take(MAX_DEFINITIONS)
            .collect();
        if concept_candidates.is_empty() {
            debug!(raw, normalized, "only blank definitions");
            return None;
        }

        let concept = extract_concept(&concept_candidates, self.compound);
        let main = dominant_pos(&senses);
        let stem = lemmatize(self.lexicon, normalized, main);
        definitions.truncate(MAX_DEFINITIONS);

        Some(CoreUnit {
            id: core_unit_id(&stem, main),
            stem,
            concept,
            pos,
            main_pos: main.label().to_string(),
            definition_set: definitions,
            related: related.into_iter().take(MAX_RELATED).collect(),
            source: source.to_string(),
            last_updated: timestamp.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{JsonLexicon, SenseEntry};

    const FIXTURE: &str = include_str!("../../../../fixtures/lexicon.json");

    fn lexicon() -> JsonLexicon {
        FIXTURE.parse().expect("fixture lexicon")
    }

    fn at() -> Option<DateTime<Utc>> {
        Some(
            DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn builds_unit_with_dominant_noun() {
        let lex = lexicon();
        let unit = CoreUnitBuilder::new(&lex)
            .build("Dogs", "dogs", at())
            .expect("unit");

        assert_eq!(unit.id, "DOG_N_CORE");
        assert_eq!(unit.stem, "dog");
        assert_eq!(unit.main_pos, "noun");
        assert_eq!(
            unit.pos,
            BTreeSet::from(["noun".to_string(), "verb".to_string()])
        );
        assert_eq!(unit.concept, "animal");
        assert_eq!(unit.source, "wordnet");
        assert_eq!(unit.definition_set[0].example, "the dog barked all night");
        assert_eq!(unit.last_updated, at().expect("timestamp"));
    }

    #[test]
    fn caps_definitions_and_related() {
        let lex = lexicon();
        let unit = CoreUnitBuilder::new(&lex)
            .build("dog", "dog", at())
            .expect("unit");
        assert!(unit.definition_set.len() <= MAX_DEFINITIONS);
        assert_eq!(unit.definition_set.len(), 3);
        assert_eq!(unit.related.len(), MAX_RELATED);

        let mut sorted = unit.related.clone();
        sorted.sort();
        assert_eq!(unit.related, sorted);
    }

    #[test]
    fn related_terms_are_noun_roots() {
        let lex = lexicon();
        let unit = CoreUnitBuilder::new(&lex)
            .build("geese", "geese", at())
            .expect("unit");
        assert_eq!(unit.id, "GOOSE_N_CORE");
        assert!(unit.related.contains(&"goose".to_string()));
    }

    #[test]
    fn missing_term_is_skipped() {
        let lex = lexicon();
        let raw = "data-driven";
        let normalized = normalize(raw).expect("normalizes");
        assert_eq!(normalized, "data driven");
        assert!(CoreUnitBuilder::new(&lex).build(raw, &normalized, at()).is_none());
    }

    #[test]
    fn blank_definitions_are_skipped() {
        let lex = lexicon();
        assert!(CoreUnitBuilder::new(&lex).build("blank", "blank", at()).is_none());
    }

    #[test]
    fn concept_respects_compound_mode() {
        let lex = lexicon();
        let compound = CoreUnitBuilder::new(&lex)
            .build("run", "run", at())
            .expect("unit");
        let single = CoreUnitBuilder::new(&lex)
            .compound(false)
            .build("run", "run", at())
            .expect("unit");
        assert_eq!(compound.concept, "move fast");
        assert_eq!(single.concept, "move");
        assert_eq!(compound.id, "RUN_V_CORE");
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let lex = lexicon();
        let builder = CoreUnitBuilder::new(&lex);
        let first = builder.build("dog", "dog", at());
        let second = builder.build("dog", "dog", at());
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    struct Fixed(Vec<SenseEntry>);

    impl LexicalBase for Fixed {
        fn senses(&self, _word: &str) -> Vec<SenseEntry> {
            self.0.clone()
        }
        fn has_lemma(&self, _lemma: &str, _pos: PartOfSpeech) -> bool {
            false
        }
        fn exceptions(&self, _word: &str, _pos: PartOfSpeech) -> &[String] {
            &[]
        }
        fn source_tag(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn unknown_category_codes_are_kept_as_labels() {
        let base = Fixed(vec![SenseEntry {
            id: "thing.x.01".into(),
            pos: "x".into(),
            definition: "a small device".into(),
            examples: Vec::new(),
            lemmas: vec!["Thing_2".into()],
        }]);
        let unit = CoreUnitBuilder::new(&base)
            .build("Thing", "thing", at())
            .expect("unit");
        assert_eq!(unit.pos, BTreeSet::from(["x".to_string()]));
        assert_eq!(unit.id, "THING_N_CORE");
        assert_eq!(unit.related, ["thing"]);
        assert_eq!(unit.source, "fixed");
        assert_eq!(unit.definition_set[0].source, "fixed");
    }
}
