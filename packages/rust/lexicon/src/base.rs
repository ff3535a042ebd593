//! The lexical knowledge base capability and its JSON-backed implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lexcore_shared::{LexCoreError, PartOfSpeech, Result};

use crate::morphy::morphy;

/// Source tag used when a lexicon file does not name one.
pub const DEFAULT_SOURCE: &str = "wordnet";

/// Lookup order for word senses. Satellites are found through adjectives.
const SENSE_LOOKUP_ORDER: [PartOfSpeech; 4] = [
    PartOfSpeech::Noun,
    PartOfSpeech::Verb,
    PartOfSpeech::Adjective,
    PartOfSpeech::Adverb,
];

// ---------------------------------------------------------------------------
// SenseEntry
// ---------------------------------------------------------------------------

/// One sense of a word in the lexical base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseEntry {
    /// Stable sense identifier, e.g. `dog.n.01`.
    pub id: String,
    /// Category code (`n`, `v`, `a`, `s`, `r`, or anything a source reports).
    pub pos: String,
    #[serde(default)]
    pub definition: String,
    /// Usage examples; only the first one is kept on a core unit.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Alternate names of the sense, underscore-joined.
    #[serde(default)]
    pub lemmas: Vec<String>,
}

impl SenseEntry {
    pub fn part_of_speech(&self) -> Option<PartOfSpeech> {
        PartOfSpeech::from_code(&self.pos)
    }
}

// ---------------------------------------------------------------------------
// LexicalBase
// ---------------------------------------------------------------------------

/// A source of word senses and the morphology data needed to reduce words
/// to their root forms.
pub trait LexicalBase {
    /// Every sense of `word`, deduplicated, in lookup order.
    fn senses(&self, word: &str) -> Vec<SenseEntry>;

    /// Whether `lemma` is a known base form in the given category.
    fn has_lemma(&self, lemma: &str, pos: PartOfSpeech) -> bool;

    /// Irregular base forms of `word` in the given category.
    fn exceptions(&self, word: &str, pos: PartOfSpeech) -> &[String];

    /// Tag recorded as the `source` of everything built from this base.
    fn source_tag(&self) -> &str;
}

// ---------------------------------------------------------------------------
// JsonLexicon
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    synsets: Vec<SenseEntry>,
    /// category code → inflected form → base forms
    #[serde(default)]
    exceptions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// A WordNet-style lexical base loaded from a JSON export.
#[derive(Debug, Clone, Default)]
pub struct JsonLexicon {
    source: String,
    senses: Vec<SenseEntry>,
    /// (lowercased underscore lemma, lookup group) → sense indices
    index: HashMap<(String, PartOfSpeech), Vec<usize>>,
    exceptions: HashMap<(String, PartOfSpeech), Vec<String>>,
}

impl JsonLexicon {
    /// Load a lexicon file. A missing or unreadable file is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LexCoreError::io(path, e))?;
        let lexicon: Self = content.parse()?;
        info!(
            path = %path.display(),
            senses = lexicon.senses.len(),
            lemmas = lexicon.index.len(),
            source = %lexicon.source,
            "lexicon loaded"
        );
        Ok(lexicon)
    }

    fn from_file(file: LexiconFile) -> Result<Self> {
        let mut index: HashMap<(String, PartOfSpeech), Vec<usize>> = HashMap::new();
        for (i, sense) in file.synsets.iter().enumerate() {
            let pos = sense.part_of_speech().ok_or_else(|| {
                LexCoreError::lexicon(format!(
                    "sense {} has unknown category code {:?}",
                    sense.id, sense.pos
                ))
            })?;
            for lemma in &sense.lemmas {
                let slot = index.entry((lemma_key(lemma), pos.lookup_group())).or_default();
                if !slot.contains(&i) {
                    slot.push(i);
                }
            }
        }

        let mut exceptions = HashMap::new();
        for (code, forms) in file.exceptions {
            let pos = PartOfSpeech::from_code(&code).ok_or_else(|| {
                LexCoreError::lexicon(format!("exception list for unknown category {code:?}"))
            })?;
            for (form, bases) in forms {
                exceptions.insert((lemma_key(&form), pos.lookup_group()), bases);
            }
        }

        Ok(Self {
            source: file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            senses: file.synsets,
            index,
            exceptions,
        })
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }
}

impl FromStr for JsonLexicon {
    type Err = LexCoreError;

    fn from_str(s: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(s)
            .map_err(|e| LexCoreError::lexicon(format!("invalid lexicon JSON: {e}")))?;
        Self::from_file(file)
    }
}

impl LexicalBase for JsonLexicon {
    fn senses(&self, word: &str) -> Vec<SenseEntry> {
        let lemma = lemma_key(word);
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for pos in SENSE_LOOKUP_ORDER {
            for form in morphy(self, &lemma, pos) {
                let Some(ids) = self.index.get(&(form, pos)) else {
                    continue;
                };
                for &i in ids {
                    let sense = &self.senses[i];
                    if seen.insert(sense.id.as_str()) {
                        found.push(sense.clone());
                    }
                }
            }
        }

        debug!(word, senses = found.len(), "lexicon lookup");
        found
    }

    fn has_lemma(&self, lemma: &str, pos: PartOfSpeech) -> bool {
        self.index
            .contains_key(&(lemma_key(lemma), pos.lookup_group()))
    }

    fn exceptions(&self, word: &str, pos: PartOfSpeech) -> &[String] {
        self.exceptions
            .get(&(lemma_key(word), pos.lookup_group()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn source_tag(&self) -> &str {
        &self.source
    }
}

/// Index key of a lemma: lowercase, spaces joined with underscores.
fn lemma_key(word: &str) -> String {
    word.trim().to_lowercase().replace(' ', "_")
}
