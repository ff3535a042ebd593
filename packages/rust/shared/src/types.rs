//! Core domain records produced by a lexcore run.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version string recorded in the store's meta table.
pub const SYSTEM_VERSION: &str = "1.0.0";

/// Maximum definitions kept on a [`CoreUnit`].
pub const MAX_DEFINITIONS: usize = 3;

/// Maximum related terms kept on a [`CoreUnit`].
pub const MAX_RELATED: usize = 5;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PartOfSpeech
// ---------------------------------------------------------------------------

/// Grammatical category of a lexical sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[serde(rename = "n")]
    Noun,
    #[serde(rename = "v")]
    Verb,
    #[serde(rename = "a")]
    Adjective,
    #[serde(rename = "s")]
    AdjectiveSatellite,
    #[serde(rename = "r")]
    Adverb,
}

impl PartOfSpeech {
    /// Tie-break order used when picking a dominant category.
    pub const PRIORITY: [PartOfSpeech; 5] = [
        Self::Noun,
        Self::Verb,
        Self::Adjective,
        Self::Adverb,
        Self::AdjectiveSatellite,
    ];

    /// Single-letter category code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Noun => "n",
            Self::Verb => "v",
            Self::Adjective => "a",
            Self::AdjectiveSatellite => "s",
            Self::Adverb => "r",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::AdjectiveSatellite => "adjective satellite",
            Self::Adverb => "adverb",
        }
    }

    /// Parse a single-letter category code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "n" => Some(Self::Noun),
            "v" => Some(Self::Verb),
            "a" => Some(Self::Adjective),
            "s" => Some(Self::AdjectiveSatellite),
            "r" => Some(Self::Adverb),
            _ => None,
        }
    }

    /// Satellites share the adjective lemma index and morphology.
    pub fn lookup_group(&self) -> Self {
        match self {
            Self::AdjectiveSatellite => Self::Adjective,
            other => *other,
        }
    }
}

// ---------------------------------------------------------------------------
// TermClassification
// ---------------------------------------------------------------------------

/// Heuristic category of a mined vocabulary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Class,
    Function,
    Concept,
    Irrelevant,
    Nonsense,
    Unknown,
}

/// Classification result for one distinct term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermClassification {
    pub term: String,
    pub category: TermCategory,
    pub score: i32,
    pub notes: String,
    /// `C` + zero-padded index, only for class/function/concept terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_code: Option<String>,
}

// ---------------------------------------------------------------------------
// CoreUnit
// ---------------------------------------------------------------------------

/// One definition attached to a core unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    pub definition: String,
    /// First usage example of the sense, or empty.
    pub example: String,
    pub source: String,
}

/// The unified, deduplicated record for one natural-language term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreUnit {
    /// `<ROOT>_<CATEGORY-CODE>_CORE`, uppercased; the cross-run dedup key.
    pub id: String,
    pub stem: String,
    pub concept: String,
    /// Category labels across all senses.
    pub pos: BTreeSet<String>,
    pub main_pos: String,
    /// At most [`MAX_DEFINITIONS`] entries, in sense order.
    pub definition_set: Vec<DefinitionEntry>,
    /// At most [`MAX_RELATED`] root forms, sorted.
    pub related: Vec<String>,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// CodeUnit
// ---------------------------------------------------------------------------

/// A vocabulary term mined from code, linked to its best usage examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    /// The term's suggested code (`C0001`, ...).
    pub id: String,
    pub term: String,
    pub concept: String,
    /// Docstring or provider text; empty when neither is available.
    pub definition: String,
    /// Up to three mined example ids.
    pub example_ids: Vec<String>,
    pub language: String,
    pub source: String,
}
