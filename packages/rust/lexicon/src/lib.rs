//! Lexical knowledge base access and CoreUnit synthesis.
//!
//! - [`LexicalBase`]: the capability the builder queries, with a
//!   WordNet-style [`JsonLexicon`] implementation
//! - [`morphy`] / [`lemmatize`]: root-form reduction
//! - [`extract_concept`]: concept phrase from definitions
//! - [`CoreUnitBuilder`]: one deduplicable [`CoreUnit`](lexcore_shared::CoreUnit) per term

pub mod base;
pub mod builder;
pub mod concept;
pub mod morphy;
pub mod pos;

pub use base::{DEFAULT_SOURCE, JsonLexicon, LexicalBase, SenseEntry};
pub use builder::{CoreUnitBuilder, core_unit_id};
pub use concept::{UNKNOWN_CONCEPT, extract_concept};
pub use morphy::{lemmatize, morphy};
pub use pos::{dominant_pos, pos_label};
